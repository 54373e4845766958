use std::time::Duration;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use super::{parse_body, required_address};
use crate::{
    error::Result,
    pager::{collect_pages, PagerConfig, StopReason},
    portfolio::{
        allocate, paginate, pnl_delta, sort_swaps, swap_time, token_flows, Holding, Page,
        SortOrder, SwapSortKey, TokenFlow,
    },
    providers::moralis::Swap,
    server::AppState,
};

pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub sort: SwapSortKey,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapHistoryInfo {
    pub pages_fetched: usize,
    pub stop: StopReason,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    pub address: String,
    pub native_balance: f64,
    pub holdings: Vec<Holding>,
    pub total_value_usd: f64,
    pub pnl_24h: f64,
    pub pnl_window_hours: u64,
    pub token_flows: Vec<TokenFlow>,
    pub swaps: Page<Swap>,
    pub swap_history: SwapHistoryInfo,
}

pub async fn vault(
    State(st): State<AppState>,
    payload: std::result::Result<Json<VaultRequest>, JsonRejection>,
) -> Result<Json<VaultResponse>> {
    let req = parse_body(payload)?;
    let address = required_address("address", req.address.as_deref())?;

    let portfolio = st.moralis.wallet_portfolio(address).await?;
    let native_balance = portfolio.native_balance.solana.unwrap_or(0.0);

    let mut holdings: Vec<Holding> = Vec::with_capacity(portfolio.tokens.len() + 1);
    holdings.push(Holding {
        mint: WRAPPED_SOL_MINT.to_string(),
        symbol: Some("SOL".to_string()),
        name: Some("Solana".to_string()),
        amount: native_balance,
        price_usd: None,
        value_usd: 0.0,
        allocation_pct: 0.0,
    });
    holdings.extend(
        portfolio
            .tokens
            .iter()
            .filter(|t| t.mint != WRAPPED_SOL_MINT)
            .map(|t| Holding {
                mint: t.mint.clone(),
                symbol: t.symbol.clone(),
                name: t.name.clone(),
                amount: t.amount.unwrap_or(0.0),
                price_usd: None,
                value_usd: 0.0,
                allocation_pct: 0.0,
            }),
    );

    // A missing price only zeroes that holding's value.
    let prices = join_all(holdings.iter().map(|h| st.moralis.token_price_usd(&h.mint))).await;
    for (h, price) in holdings.iter_mut().zip(prices) {
        h.price_usd = match price {
            Ok(p) => p,
            Err(e) => {
                log::warn!("vault.price.error mint={} {}", h.mint, e);
                None
            }
        };
    }
    let (holdings, total_value_usd) = allocate(holdings);

    let since = Utc::now() - chrono::Duration::hours(st.settings.pnl_window_hours as i64);
    let cfg = PagerConfig {
        max_pages: st.settings.swap_max_pages,
        delay: Duration::from_millis(st.settings.swap_page_delay_ms),
    };
    let limit = st.settings.swap_page_limit;
    let moralis = st.moralis.clone();
    let owner = address.to_string();
    let collected = collect_pages(
        cfg,
        |cursor: Option<String>| {
            let moralis = moralis.clone();
            let owner = owner.clone();
            async move { moralis.wallet_swaps(&owner, limit, cursor.as_deref()).await }
        },
        |page: &[Swap]| {
            page.iter()
                .filter_map(swap_time)
                .min()
                .is_some_and(|oldest| oldest < since)
        },
    )
    .await?;

    log::info!(
        "vault.pages address={} fetched={} swaps={} stop={:?}",
        address,
        collected.pages,
        collected.items.len(),
        collected.stop
    );

    let mut swaps = collected.items;
    let pnl_24h = pnl_delta(&swaps, since);
    let flows = token_flows(&swaps);
    sort_swaps(&mut swaps, req.sort, req.order);
    let page = paginate(
        &swaps,
        req.page.unwrap_or(1),
        req.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    );

    Ok(Json(VaultResponse {
        address: address.to_string(),
        native_balance,
        holdings,
        total_value_usd,
        pnl_24h,
        pnl_window_hours: st.settings.pnl_window_hours,
        token_flows: flows,
        swaps: page,
        swap_history: SwapHistoryInfo {
            pages_fetched: collected.pages,
            stop: collected.stop,
        },
    }))
}
