use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    CursorExhausted,
    EmptyPage,
    MaxPages,
    Predicate,
}

#[derive(Debug, Clone)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub pages: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Copy)]
pub struct PagerConfig {
    pub max_pages: usize,
    /// Pause between consecutive page requests, to stay under provider rate limits.
    pub delay: Duration,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            delay: Duration::from_millis(300),
        }
    }
}

/// Fetch pages until the cursor runs out, a page comes back empty, `max_pages`
/// is reached, or `stop` returns true for the latest page.
pub async fn collect_pages<T, F, Fut, S>(
    cfg: PagerConfig,
    mut fetch: F,
    mut stop: S,
) -> Result<Collected<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<CursorPage<T>>>,
    S: FnMut(&[T]) -> bool,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        if pages > 0 && !cfg.delay.is_zero() {
            tokio::time::sleep(cfg.delay).await;
        }
        let page = fetch(cursor.take()).await?;
        pages += 1;

        if page.items.is_empty() {
            return Ok(Collected {
                items,
                pages,
                stop: StopReason::EmptyPage,
            });
        }
        let halt = stop(&page.items);
        items.extend(page.items);

        if halt {
            return Ok(Collected {
                items,
                pages,
                stop: StopReason::Predicate,
            });
        }
        match page.cursor.filter(|c| !c.trim().is_empty()) {
            None => {
                return Ok(Collected {
                    items,
                    pages,
                    stop: StopReason::CursorExhausted,
                })
            }
            Some(_) if pages >= cfg.max_pages => {
                return Ok(Collected {
                    items,
                    pages,
                    stop: StopReason::MaxPages,
                })
            }
            Some(next) => cursor = Some(next),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::ApiError;

    fn cfg(max_pages: usize) -> PagerConfig {
        PagerConfig {
            max_pages,
            delay: Duration::ZERO,
        }
    }

    /// Serves `pages` in order; the last one has no cursor.
    fn paged(pages: Vec<Vec<u32>>) -> impl FnMut(Option<String>) -> std::future::Ready<Result<CursorPage<u32>>> {
        let total = pages.len();
        move |cursor: Option<String>| {
            let idx: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            let next = if idx + 1 < total {
                Some((idx + 1).to_string())
            } else {
                None
            };
            std::future::ready(Ok(CursorPage {
                items: pages[idx].clone(),
                cursor: next,
            }))
        }
    }

    #[tokio::test]
    async fn stops_when_cursor_absent() {
        let out = collect_pages(cfg(10), paged(vec![vec![1, 2], vec![3], vec![4, 5]]), |_| false)
            .await
            .unwrap();
        assert_eq!(out.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(out.pages, 3);
        assert_eq!(out.stop, StopReason::CursorExhausted);
    }

    #[tokio::test]
    async fn blank_cursor_counts_as_absent() {
        let out = collect_pages(
            cfg(10),
            |_c: Option<String>| {
                std::future::ready(Ok(CursorPage {
                    items: vec![7u32],
                    cursor: Some("  ".to_string()),
                }))
            },
            |_| false,
        )
        .await
        .unwrap();
        assert_eq!(out.pages, 1);
        assert_eq!(out.stop, StopReason::CursorExhausted);
    }

    #[tokio::test]
    async fn endless_cursor_is_capped() {
        let calls = RefCell::new(0u32);
        let out = collect_pages(
            cfg(4),
            |_c: Option<String>| {
                *calls.borrow_mut() += 1;
                std::future::ready(Ok(CursorPage {
                    items: vec![1u32],
                    cursor: Some("again".to_string()),
                }))
            },
            |_| false,
        )
        .await
        .unwrap();
        assert_eq!(*calls.borrow(), 4);
        assert_eq!(out.items.len(), 4);
        assert_eq!(out.stop, StopReason::MaxPages);
    }

    #[tokio::test]
    async fn empty_page_ends_the_loop() {
        let out = collect_pages(cfg(10), paged(vec![vec![1], vec![], vec![2]]), |_| false)
            .await
            .unwrap();
        assert_eq!(out.items, vec![1]);
        assert_eq!(out.stop, StopReason::EmptyPage);
    }

    #[tokio::test]
    async fn predicate_keeps_the_triggering_page() {
        let out = collect_pages(cfg(10), paged(vec![vec![5, 4], vec![3, 2], vec![1]]), |page| {
            page.iter().any(|x| *x <= 3)
        })
        .await
        .unwrap();
        assert_eq!(out.items, vec![5, 4, 3, 2]);
        assert_eq!(out.stop, StopReason::Predicate);
    }

    #[tokio::test]
    async fn page_error_is_surfaced() {
        let res = collect_pages(
            cfg(10),
            |_c: Option<String>| {
                std::future::ready(Err::<CursorPage<u32>, _>(ApiError::upstream(
                    "moralis", 429, "slow down",
                )))
            },
            |_| false,
        )
        .await;
        assert!(matches!(res, Err(ApiError::Upstream { status: 429, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_pages_only() {
        let started = tokio::time::Instant::now();
        let out = collect_pages(
            PagerConfig {
                max_pages: 10,
                delay: Duration::from_millis(300),
            },
            paged(vec![vec![1], vec![2], vec![3]]),
            |_| false,
        )
        .await
        .unwrap();
        assert_eq!(out.pages, 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(600));
        assert!(elapsed < Duration::from_millis(900));
    }
}
