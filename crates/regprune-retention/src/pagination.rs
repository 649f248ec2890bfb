//! Drains a cursor-paginated listing endpoint

use regprune_core::types::{Page, PageRequest};
use std::future::Future;
use tracing::{debug, warn};

/// Items collected from a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// The item limit stopped the listing while the server had more
    pub truncated: bool,
}

/// Collect every item from a paginated listing
///
/// Each call requests `page_size_cap` items, or fewer when `max_items` leaves
/// a smaller budget. Items are returned in the order the server produced them.
/// Listing stops when a page carries no continuation token or when
/// `max_items` items have been collected. Errors from `list_fn` are returned
/// as-is; retries are the caller's transport's business.
pub async fn fetch_all<T, E, F, Fut>(
    list_fn: F,
    page_size_cap: u32,
    max_items: Option<usize>,
) -> Result<Vec<T>, E>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    fetch_listing(list_fn, page_size_cap, max_items)
        .await
        .map(|listing| listing.items)
}

/// Like [`fetch_all`], but also reports whether `max_items` cut the listing short
pub async fn fetch_listing<T, E, F, Fut>(
    mut list_fn: F,
    page_size_cap: u32,
    max_items: Option<usize>,
) -> Result<Listing<T>, E>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let page_size_cap = page_size_cap.max(1);
    let mut items: Vec<T> = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0u32;
    let mut truncated = false;

    loop {
        let page_size = match max_items {
            Some(max) => {
                let remaining = max.saturating_sub(items.len());
                if remaining == 0 {
                    break;
                }
                page_size_cap.min(u32::try_from(remaining).unwrap_or(u32::MAX))
            }
            None => page_size_cap,
        };

        let sent_token = page_token.clone();
        let page = list_fn(PageRequest {
            page_size,
            page_token: page_token.take(),
        })
        .await?;
        pages += 1;

        let received = page.items.len();
        items.extend(page.items);
        debug!(page = pages, received, total = items.len(), "Fetched page");

        if let Some(max) = max_items {
            if items.len() >= max {
                truncated = items.len() > max || page.next_page_token.is_some();
                items.truncate(max);
                debug!(max, truncated, "Reached item limit, stopping");
                break;
            }
        }

        match page.next_page_token {
            Some(next) if sent_token.as_deref() == Some(next.as_str()) => {
                warn!(token = %next, "Server repeated the page token, stopping");
                break;
            }
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    Ok(Listing { items, truncated })
}
