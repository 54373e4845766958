use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::moralis::{Swap, SwapLeg};

pub const MAX_PAGE_SIZE: usize = 100;

pub fn swap_time(swap: &Swap) -> Option<DateTime<Utc>> {
    swap.block_timestamp
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn leg_usd(leg: &SwapLeg) -> f64 {
    leg.usd_amount.filter(|x| x.is_finite()).unwrap_or(0.0)
}

/// USD value received minus USD value given up.
pub fn swap_pnl(swap: &Swap) -> f64 {
    leg_usd(&swap.bought) - leg_usd(&swap.sold)
}

/// Sum of per-swap PnL for swaps at or after `since`. Swaps without a
/// parseable timestamp are ignored.
pub fn pnl_delta(swaps: &[Swap], since: DateTime<Utc>) -> f64 {
    swaps
        .iter()
        .filter(|s| swap_time(s).map(|t| t >= since).unwrap_or(false))
        .map(swap_pnl)
        .sum()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenFlow {
    pub address: String,
    pub symbol: Option<String>,
    pub buys: u32,
    pub sells: u32,
    pub usd_bought: f64,
    pub usd_sold: f64,
    /// `usd_sold - usd_bought`: cash that came back out of this token.
    pub net_usd: f64,
}

/// Per-token aggregate of swap legs, keyed by token address and sorted by it.
pub fn token_flows(swaps: &[Swap]) -> Vec<TokenFlow> {
    let mut by_token: BTreeMap<String, TokenFlow> = BTreeMap::new();

    for swap in swaps {
        if !swap.bought.address.is_empty() {
            let f = by_token
                .entry(swap.bought.address.clone())
                .or_insert_with(|| TokenFlow {
                    address: swap.bought.address.clone(),
                    ..Default::default()
                });
            f.buys += 1;
            f.usd_bought += leg_usd(&swap.bought);
            if f.symbol.is_none() {
                f.symbol = swap.bought.symbol.clone();
            }
        }
        if !swap.sold.address.is_empty() {
            let f = by_token
                .entry(swap.sold.address.clone())
                .or_insert_with(|| TokenFlow {
                    address: swap.sold.address.clone(),
                    ..Default::default()
                });
            f.sells += 1;
            f.usd_sold += leg_usd(&swap.sold);
            if f.symbol.is_none() {
                f.symbol = swap.sold.symbol.clone();
            }
        }
    }

    by_token
        .into_values()
        .map(|mut f| {
            f.net_usd = f.usd_sold - f.usd_bought;
            f
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub mint: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub amount: f64,
    pub price_usd: Option<f64>,
    pub value_usd: f64,
    pub allocation_pct: f64,
}

/// Fill in `value_usd` and `allocation_pct`, then sort by value descending
/// (ties broken by symbol, then mint).
pub fn allocate(mut holdings: Vec<Holding>) -> (Vec<Holding>, f64) {
    for h in holdings.iter_mut() {
        h.value_usd = match h.price_usd {
            Some(p) if p.is_finite() && h.amount.is_finite() => p * h.amount,
            _ => 0.0,
        };
    }
    let total: f64 = holdings.iter().map(|h| h.value_usd).sum();
    for h in holdings.iter_mut() {
        h.allocation_pct = if total > 0.0 {
            h.value_usd / total * 100.0
        } else {
            0.0
        };
    }
    holdings.sort_by(|a, b| {
        b.value_usd
            .partial_cmp(&a.value_usd)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
            .then_with(|| a.mint.cmp(&b.mint))
    });
    (holdings, total)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapSortKey {
    #[default]
    Time,
    Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

fn swap_value(swap: &Swap) -> f64 {
    swap.total_value_usd
        .filter(|x| x.is_finite())
        .unwrap_or_else(|| leg_usd(&swap.bought).max(leg_usd(&swap.sold)))
}

/// Stable sort; swaps with missing timestamps sort as the oldest.
pub fn sort_swaps(swaps: &mut [Swap], key: SwapSortKey, order: SortOrder) {
    swaps.sort_by(|a, b| {
        let ord = match key {
            SwapSortKey::Time => swap_time(a).cmp(&swap_time(b)),
            SwapSortKey::Value => swap_value(a)
                .partial_cmp(&swap_value(b))
                .unwrap_or(Ordering::Equal),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// 1-based page of `items`; `page_size` is clamped to `1..=MAX_PAGE_SIZE`
/// and a page past the end comes back empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total,
        total_pages,
    }
}
