use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::read_json;
use crate::error::{ApiError, Result};

const SERVICE: &str = "solana-rpc";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MintAccount {
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    pub supply: String,
    pub decimals: u8,
    pub is_initialized: bool,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<RpcResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcResult {
    value: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Clone)]
pub struct SolanaRpcClient {
    http: ClientWithMiddleware,
    url: String,
}

impl SolanaRpcClient {
    pub fn new(http: ClientWithMiddleware, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Returns the parsed mint plus the raw account value, or `None` when the
    /// account does not exist.
    pub async fn get_mint(&self, mint: &str) -> Result<Option<(MintAccount, JsonValue)>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getAccountInfo",
            "params": [mint, { "encoding": "jsonParsed", "commitment": "confirmed" }],
        });
        let resp = self.http.post(&self.url).json(&body).send().await?;
        let rpc: RpcResponse = read_json(SERVICE, resp).await?;

        if let Some(err) = rpc.error {
            return Err(ApiError::Upstream {
                service: SERVICE,
                status: 200,
                message: format!("rpc error {}: {}", err.code, err.message),
            });
        }
        let Some(value) = rpc.result.and_then(|r| r.value).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let parsed = parse_mint(&value)?;
        Ok(Some((parsed, value)))
    }
}

fn parse_mint(value: &JsonValue) -> Result<MintAccount> {
    let parsed = value
        .pointer("/data/parsed")
        .ok_or_else(|| ApiError::not_found("account is not a token mint"))?;
    if parsed.get("type").and_then(|t| t.as_str()) != Some("mint") {
        return Err(ApiError::not_found("account is not a token mint"));
    }
    let info = parsed
        .get("info")
        .cloned()
        .ok_or_else(|| ApiError::parse("mint account without info"))?;
    Ok(serde_json::from_value(info)?)
}
