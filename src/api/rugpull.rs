use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{parse_body, required_address};
use crate::{
    error::{ApiError, Result},
    providers::solana_rpc::MintAccount,
    risk_engine::{score_token, RiskFlag, RiskLevel, RiskSignals},
    server::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RugpullRequest {
    #[serde(default)]
    pub token_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RugpullResponse {
    pub token_address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub score: u8,
    pub risk: RiskLevel,
    pub flags: Vec<RiskFlag>,
    pub mint_info: MintAccount,
    pub total_holders: Option<u64>,
    pub top10_supply_percent: Option<f64>,
    /// Raw provider payloads, passed through for the UI.
    pub mint: JsonValue,
    pub metadata: JsonValue,
    pub holders: JsonValue,
}

pub async fn rugpull(
    State(st): State<AppState>,
    payload: std::result::Result<Json<RugpullRequest>, JsonRejection>,
) -> Result<Json<RugpullResponse>> {
    let req = parse_body(payload)?;
    let mint = required_address("tokenAddress", req.token_address.as_deref())?;

    let (mint_account, metadata, holders) = tokio::try_join!(
        st.rpc.get_mint(mint),
        st.moralis.token_metadata(mint),
        st.moralis.token_holders(mint),
    )?;

    let Some((mint_info, mint_raw)) = mint_account else {
        return Err(ApiError::not_found(format!("token {mint} not found")));
    };
    let (meta, meta_raw) = match metadata {
        Some((m, raw)) => (Some(m), raw),
        None => (None, JsonValue::Null),
    };
    let (stats, holders_raw) = match holders {
        Some((s, raw)) => (s, raw),
        None => Default::default(),
    };

    let assessment = score_token(&RiskSignals {
        mint_authority: mint_info.mint_authority.clone(),
        freeze_authority: mint_info.freeze_authority.clone(),
        top10_supply_percent: stats.top10_supply_percent,
        total_holders: stats.total_holders,
        metadata_mutable: meta.as_ref().and_then(|m| m.is_mutable()),
    });

    log::info!(
        "rugpull.done mint={} score={} risk={} flags={}",
        mint,
        assessment.score,
        assessment.risk.as_str(),
        assessment.flags.len()
    );

    Ok(Json(RugpullResponse {
        token_address: mint.to_string(),
        name: meta.as_ref().and_then(|m| m.name.clone()),
        symbol: meta.as_ref().and_then(|m| m.symbol.clone()),
        score: assessment.score,
        risk: assessment.risk,
        flags: assessment.flags,
        mint_info,
        total_holders: stats.total_holders,
        top10_supply_percent: stats.top10_supply_percent,
        mint: mint_raw,
        metadata: meta_raw,
        holders: holders_raw,
    }))
}
