use std::collections::HashMap;

use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Deserializer, Serialize};

use super::{join_url, read_json, read_json_opt};
use crate::error::Result;

const SERVICE: &str = "coingecko";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchCoin {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

/// CoinGecko sends `null` for whole maps and for individual currencies.
fn price_map<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let m = Option::<HashMap<String, Option<f64>>>::deserialize(deserializer)?;
    Ok(m.unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default, deserialize_with = "price_map")]
    pub current_price: HashMap<String, f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, deserialize_with = "price_map")]
    pub total_volume: HashMap<String, f64>,
    #[serde(default, deserialize_with = "price_map")]
    pub market_cap: HashMap<String, f64>,
    #[serde(default, deserialize_with = "price_map")]
    pub fully_diluted_valuation: HashMap<String, f64>,
    #[serde(default, deserialize_with = "price_map")]
    pub high_24h: HashMap<String, f64>,
    #[serde(default, deserialize_with = "price_map")]
    pub low_24h: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub asset_platform_id: Option<String>,
    #[serde(default)]
    pub platforms: HashMap<String, Option<String>>,
    #[serde(default)]
    pub market_data: Option<MarketData>,
}

impl CoinDetail {
    pub fn usd(map: &HashMap<String, f64>) -> Option<f64> {
        map.get("usd").copied().filter(|x| x.is_finite())
    }

    /// First non-empty contract address, preferring the coin's own platform.
    pub fn contract(&self) -> Option<(String, String)> {
        let own = self
            .asset_platform_id
            .as_ref()
            .and_then(|p| self.platforms.get(p).map(|a| (p, a)));
        own.into_iter()
            .chain(self.platforms.iter())
            .find_map(|(chain, addr)| {
                addr.as_deref()
                    .filter(|a| !a.trim().is_empty())
                    .map(|a| (chain.clone(), a.to_string()))
            })
    }
}

/// Exact symbol match with the best market-cap rank, else CoinGecko's own top hit.
pub fn best_match(coins: &[SearchCoin], ticker: &str) -> Option<SearchCoin> {
    let exact = coins
        .iter()
        .filter(|c| c.symbol.eq_ignore_ascii_case(ticker))
        .min_by_key(|c| c.market_cap_rank.unwrap_or(u32::MAX));
    exact.or_else(|| coins.first()).cloned()
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    http: ClientWithMiddleware,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(http: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchCoin>> {
        let resp = self
            .http
            .get(join_url(&self.base_url, "/api/v3/search"))
            .query(&[("query", query)])
            .send()
            .await?;
        let body: SearchResponse = read_json(SERVICE, resp).await?;
        Ok(body.coins)
    }

    pub async fn coin(&self, id: &str) -> Result<Option<CoinDetail>> {
        let resp = self
            .http
            .get(join_url(&self.base_url, &format!("/api/v3/coins/{id}")))
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
                ("sparkline", "false"),
            ])
            .send()
            .await?;
        read_json_opt(SERVICE, resp).await
    }
}
