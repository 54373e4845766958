pub mod coingecko;
pub mod dexscreener;
pub mod gemini;
pub mod moralis;
pub mod solana_rpc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, Result};

/// Decode a successful JSON response, or turn the status and body into an upstream error.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::upstream(service, status.as_u16(), &body));
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Like [`read_json`], but a 404 means "no such resource" rather than a failure.
pub(crate) async fn read_json_opt<T: DeserializeOwned>(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<Option<T>> {
    if resp.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    read_json(service, resp).await.map(Some)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
