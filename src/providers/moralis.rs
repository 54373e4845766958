use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{join_url, read_json, read_json_opt};
use crate::{
    error::{ApiError, Result},
    pager::CursorPage,
    utils::{lenient_f64, value_as_f64},
};

const SERVICE: &str = "moralis";
const NETWORK: &str = "mainnet";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metaplex {
    #[serde(default)]
    pub is_mutable: Option<bool>,
    #[serde(default)]
    pub update_authority: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(default)]
    pub mint: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_supply_formatted: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fully_diluted_value: Option<f64>,
    #[serde(default)]
    pub metaplex: Option<Metaplex>,
}

impl TokenMetadata {
    pub fn is_mutable(&self) -> Option<bool> {
        self.metaplex.as_ref().and_then(|m| m.is_mutable)
    }
}

/// Holder distribution summary for a mint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HolderStats {
    pub total_holders: Option<u64>,
    pub top10_supply_percent: Option<f64>,
}

impl HolderStats {
    pub fn from_raw(raw: &JsonValue) -> Self {
        Self {
            total_holders: raw
                .get("totalHolders")
                .and_then(value_as_f64)
                .filter(|x| *x >= 0.0)
                .map(|x| x as u64),
            top10_supply_percent: raw
                .pointer("/holderSupply/top10/supplyPercent")
                .and_then(value_as_f64),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeBalance {
    #[serde(default)]
    pub lamports: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub solana: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub mint: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub decimals: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPortfolio {
    #[serde(default)]
    pub native_balance: NativeBalance,
    #[serde(default)]
    pub tokens: Vec<TokenBalance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapLeg {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub block_timestamp: Option<String>,
    #[serde(default)]
    pub exchange_name: Option<String>,
    #[serde(default)]
    pub pair_label: Option<String>,
    #[serde(default)]
    pub bought: SwapLeg,
    #[serde(default)]
    pub sold: SwapLeg,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_value_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SwapsResponse {
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    result: Vec<Swap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    usd_price: Option<f64>,
}

#[derive(Clone)]
pub struct MoralisClient {
    http: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
}

impl MoralisClient {
    pub fn new(
        http: ClientWithMiddleware,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn get(&self, path: &str) -> Result<RequestBuilder> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::config("MORALIS_API_KEY is not set"))?;
        Ok(self
            .http
            .get(join_url(&self.base_url, path))
            .header("X-API-Key", key)
            .header("Accept", "application/json"))
    }

    /// Token metadata as typed fields plus the raw payload. `None` when Moralis has no record.
    pub async fn token_metadata(&self, mint: &str) -> Result<Option<(TokenMetadata, JsonValue)>> {
        let path = format!("/token/{NETWORK}/{mint}/metadata");
        let resp = self.get(&path)?.send().await?;
        let Some(raw) = read_json_opt::<JsonValue>(SERVICE, resp).await? else {
            return Ok(None);
        };
        let meta: TokenMetadata = serde_json::from_value(raw.clone())?;
        Ok(Some((meta, raw)))
    }

    pub async fn token_holders(&self, mint: &str) -> Result<Option<(HolderStats, JsonValue)>> {
        let path = format!("/token/{NETWORK}/holders/{mint}");
        let resp = self.get(&path)?.send().await?;
        let Some(raw) = read_json_opt::<JsonValue>(SERVICE, resp).await? else {
            return Ok(None);
        };
        Ok(Some((HolderStats::from_raw(&raw), raw)))
    }

    pub async fn token_price_usd(&self, mint: &str) -> Result<Option<f64>> {
        let path = format!("/token/{NETWORK}/{mint}/price");
        let resp = self.get(&path)?.send().await?;
        let price = read_json_opt::<PriceResponse>(SERVICE, resp).await?;
        Ok(price.and_then(|p| p.usd_price))
    }

    pub async fn wallet_portfolio(&self, address: &str) -> Result<WalletPortfolio> {
        let path = format!("/account/{NETWORK}/{address}/portfolio");
        let resp = self.get(&path)?.send().await?;
        read_json(SERVICE, resp).await
    }

    /// One page of swaps, newest first.
    pub async fn wallet_swaps(
        &self,
        address: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<CursorPage<Swap>> {
        let path = format!("/account/{NETWORK}/{address}/swaps");
        let mut req = self
            .get(&path)?
            .query(&[("limit", limit.to_string()), ("order", "DESC".to_string())]);
        if let Some(c) = cursor {
            req = req.query(&[("cursor", c)]);
        }
        let resp = req.send().await?;
        let page: SwapsResponse = read_json(SERVICE, resp).await?;
        Ok(CursorPage {
            items: page.result,
            cursor: page.cursor,
        })
    }
}
