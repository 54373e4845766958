use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use super::{join_url, read_json};
use crate::{error::Result, utils::lenient_f64};

const SERVICE: &str = "dexscreener";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PairToken {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Window {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h24: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h6: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h1: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Liquidity {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pair_address: String,
    #[serde(default)]
    pub base_token: PairToken,
    #[serde(default)]
    pub quote_token: PairToken,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub volume: Window,
    #[serde(default)]
    pub price_change: Window,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fdv: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub pair_created_at: Option<i64>,
}

impl Pair {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct PairsResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

/// The most liquid pair, which is the one whose price is most trustworthy.
pub fn deepest_pair(pairs: Vec<Pair>) -> Option<Pair> {
    pairs.into_iter().max_by(|a, b| {
        a.liquidity_usd()
            .partial_cmp(&b.liquidity_usd())
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[derive(Clone)]
pub struct DexScreenerClient {
    http: ClientWithMiddleware,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(http: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn pairs(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<Pair>> {
        let resp = self
            .http
            .get(join_url(&self.base_url, path))
            .query(query)
            .send()
            .await?;
        let body: PairsResponse = read_json(SERVICE, resp).await?;
        Ok(body.pairs.unwrap_or_default())
    }

    pub async fn token_pairs(&self, address: &str) -> Result<Vec<Pair>> {
        self.pairs(&format!("/latest/dex/tokens/{address}"), &[]).await
    }

    pub async fn pair(&self, chain: &str, pair_address: &str) -> Result<Vec<Pair>> {
        self.pairs(&format!("/latest/dex/pairs/{chain}/{pair_address}"), &[])
            .await
    }

    pub async fn search(&self, q: &str) -> Result<Vec<Pair>> {
        self.pairs("/latest/dex/search", &[("q", q)]).await
    }
}
