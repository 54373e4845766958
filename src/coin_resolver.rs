use serde::Serialize;
use url::Url;

use crate::{
    error::Result,
    providers::{
        coingecko::{best_match, CoinDetail, CoinGeckoClient},
        dexscreener::{deepest_pair, DexScreenerClient, Pair},
    },
    utils::{is_evm_address, is_solana_address},
};

/// Upper-case words that look like tickers but almost never are.
const TICKER_STOPWORDS: &[&str] = &[
    "A", "I", "AI", "AM", "AN", "AND", "API", "ARE", "AS", "AT", "ATH", "ATL", "BE", "BUY",
    "CEO", "DCA", "DD", "DEX", "DO", "EOD", "ETF", "FOMO", "FUD", "GM", "HODL", "IF", "IMO",
    "IN", "IS", "IT", "LONG", "ME", "MY", "NFA", "NO", "NOT", "NOW", "OF", "OK", "ON", "OR",
    "PNL", "ROI", "SELL", "SHORT", "SL", "SO", "TA", "THE", "TO", "TP", "UP", "US", "USA",
    "USD", "WHAT", "WHEN", "WHY",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoinRef {
    CoinGeckoId { id: String },
    DexPair { chain: String, pair: String },
    Address { address: String },
    Ticker { symbol: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinSnapshot {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub chain: Option<String>,
    pub address: Option<String>,
    pub price_usd: Option<f64>,
    pub change_24h_pct: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub fdv_usd: Option<f64>,
    pub url: Option<String>,
    pub source: &'static str,
}

impl CoinSnapshot {
    pub fn from_pair(p: &Pair) -> Self {
        Self {
            name: p.base_token.name.clone(),
            symbol: p.base_token.symbol.clone(),
            chain: Some(p.chain_id.clone()).filter(|c| !c.is_empty()),
            address: Some(p.base_token.address.clone()).filter(|a| !a.is_empty()),
            price_usd: p.price_usd,
            change_24h_pct: p.price_change.h24,
            volume_24h_usd: p.volume.h24,
            liquidity_usd: p.liquidity.as_ref().and_then(|l| l.usd),
            market_cap_usd: p.market_cap,
            fdv_usd: p.fdv,
            url: p.url.clone(),
            source: "dexscreener",
        }
    }

    pub fn from_coingecko(d: &CoinDetail) -> Self {
        let md = d.market_data.clone().unwrap_or_default();
        let contract = d.contract();
        Self {
            name: Some(d.name.clone()),
            symbol: Some(d.symbol.to_uppercase()),
            chain: contract.as_ref().map(|(c, _)| c.clone()),
            address: contract.map(|(_, a)| a),
            price_usd: CoinDetail::usd(&md.current_price),
            change_24h_pct: md.price_change_percentage_24h,
            volume_24h_usd: CoinDetail::usd(&md.total_volume),
            liquidity_usd: None,
            market_cap_usd: CoinDetail::usd(&md.market_cap),
            fdv_usd: CoinDetail::usd(&md.fully_diluted_valuation),
            url: Some(format!("https://www.coingecko.com/en/coins/{}", d.id)),
            source: "coingecko",
        }
    }
}

fn trim_token(word: &str) -> &str {
    word.trim_matches(|c: char| {
        matches!(
            c,
            ',' | '.' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '"' | '\'' | '<' | '>' | '`'
        )
    })
}

fn from_url(raw: &str) -> Option<CoinRef> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").to_lowercase();
    let segs: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|x| !x.is_empty()).collect())
        .unwrap_or_default();

    match host.as_str() {
        "coingecko.com" => {
            let i = segs.iter().position(|s| *s == "coins")?;
            let id = segs.get(i + 1)?;
            Some(CoinRef::CoinGeckoId { id: id.to_lowercase() })
        }
        "dexscreener.com" => match segs.as_slice() {
            [chain, pair, ..] => Some(CoinRef::DexPair {
                chain: chain.to_lowercase(),
                pair: pair.to_string(),
            }),
            _ => None,
        },
        "birdeye.so" => {
            let i = segs.iter().position(|s| *s == "token")?;
            let addr = segs.get(i + 1)?;
            Some(CoinRef::Address { address: addr.to_string() })
        }
        "pump.fun" => segs
            .iter()
            .rev()
            .find(|s| is_solana_address(s))
            .map(|a| CoinRef::Address { address: a.to_string() }),
        _ => None,
    }
}

fn as_ticker(word: &str) -> Option<String> {
    let w = trim_token(word);
    if let Some(tag) = w.strip_prefix('$') {
        let sym = trim_token(tag);
        let ok = (1..=10).contains(&sym.len())
            && sym.chars().all(|c| c.is_ascii_alphanumeric())
            && sym.chars().any(|c| c.is_ascii_alphabetic());
        return ok.then(|| sym.to_uppercase());
    }
    None
}

fn as_shouted_ticker(word: &str) -> Option<String> {
    let w = trim_token(word);
    let ok = (2..=10).contains(&w.len())
        && w.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && w.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && !TICKER_STOPWORDS.contains(&w);
    ok.then(|| w.to_string())
}

/// Precedence: supported URL, then contract address, then `$TICKER`, then a bare upper-case ticker.
pub fn extract_coin_ref(text: &str) -> Option<CoinRef> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if let Some(r) = words
        .iter()
        .map(|w| trim_token(w))
        .filter(|w| w.starts_with("http://") || w.starts_with("https://"))
        .find_map(from_url)
    {
        return Some(r);
    }

    if let Some(addr) = words
        .iter()
        .map(|w| trim_token(w))
        .find(|w| is_evm_address(w) || is_solana_address(w))
    {
        return Some(CoinRef::Address {
            address: addr.to_string(),
        });
    }

    words
        .iter()
        .find_map(|w| as_ticker(w))
        .or_else(|| words.iter().find_map(|w| as_shouted_ticker(w)))
        .map(|symbol| CoinRef::Ticker { symbol })
}

/// Turns a [`CoinRef`] into a market snapshot using DexScreener and CoinGecko.
#[derive(Clone)]
pub struct CoinResolver {
    coingecko: CoinGeckoClient,
    dexscreener: DexScreenerClient,
}

impl CoinResolver {
    pub fn new(coingecko: CoinGeckoClient, dexscreener: DexScreenerClient) -> Self {
        Self {
            coingecko,
            dexscreener,
        }
    }

    pub async fn resolve(&self, coin: &CoinRef) -> Result<Option<CoinSnapshot>> {
        match coin {
            CoinRef::Address { address } => {
                let pairs = self.dexscreener.token_pairs(address).await?;
                Ok(deepest_pair(pairs).map(|p| CoinSnapshot::from_pair(&p)))
            }
            CoinRef::DexPair { chain, pair } => {
                let pairs = self.dexscreener.pair(chain, pair).await?;
                Ok(deepest_pair(pairs).map(|p| CoinSnapshot::from_pair(&p)))
            }
            CoinRef::CoinGeckoId { id } => Ok(self
                .coingecko
                .coin(id)
                .await?
                .map(|d| CoinSnapshot::from_coingecko(&d))),
            CoinRef::Ticker { symbol } => self.resolve_ticker(symbol).await,
        }
    }

    async fn resolve_ticker(&self, symbol: &str) -> Result<Option<CoinSnapshot>> {
        let coins = self.coingecko.search(symbol).await?;
        if let Some(hit) = best_match(&coins, symbol) {
            if let Some(detail) = self.coingecko.coin(&hit.id).await? {
                return Ok(Some(CoinSnapshot::from_coingecko(&detail)));
            }
        }
        log::debug!("resolver.ticker.fallback symbol={} source=dexscreener", symbol);
        let pairs: Vec<Pair> = self
            .dexscreener
            .search(symbol)
            .await?
            .into_iter()
            .filter(|p| {
                p.base_token
                    .symbol
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(symbol))
            })
            .collect();
        Ok(deepest_pair(pairs).map(|p| CoinSnapshot::from_pair(&p)))
    }
}
