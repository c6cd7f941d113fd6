//! Page-based listing traversal
//!
//! The listing endpoints this engine reads are sorted descending on the
//! date field being bounded, so a page containing any out-of-range item is
//! the last interesting page. Out-of-range items are discarded, in-range
//! items are kept, and traversal also ends on the first short page.

use std::future::Future;

use super::error::ApiResult;

/// Items requested per page, the maximum the host allows.
pub const PER_PAGE: u8 = 100;

/// Collect pages from `fetch_page` (1-based page numbers), keeping items for
/// which `in_range` holds. Stops after a page that contained any out-of-range
/// item, or after a page shorter than [`PER_PAGE`]. With an `in_range` that is
/// always true this degrades to plain short-page-terminated depagination.
pub async fn fetch_pages<T, F, Fut>(
    mut fetch_page: F,
    in_range: impl Fn(&T) -> bool,
) -> ApiResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Vec<T>>>,
{
    let mut page: u32 = 1;
    let mut collected = Vec::new();

    loop {
        let batch = fetch_page(page).await?;
        let total = batch.len();

        let mut kept = 0usize;
        for item in batch {
            if in_range(&item) {
                collected.push(item);
                kept += 1;
            }
        }

        // At least one item fell outside the bound
        if kept != total {
            break;
        }

        // The host had no more than this
        if total < PER_PAGE as usize {
            break;
        }

        page += 1;
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_page(start: i64) -> Vec<i64> {
        (0..PER_PAGE as i64).map(|i| start - i).collect()
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let pages = vec![full_page(1000), full_page(900), vec![7, 6, 5]];
        let mut calls = 0u32;

        let result = fetch_pages(
            |page| {
                calls += 1;
                let batch = pages.get((page - 1) as usize).cloned().unwrap_or_default();
                async move { Ok(batch) }
            },
            |_| true,
        )
        .await
        .unwrap();

        assert_eq!(calls, 3, "should fetch exactly three pages");
        assert_eq!(result.len(), PER_PAGE as usize * 2 + 3);
    }

    #[tokio::test]
    async fn test_stops_after_page_with_out_of_range_item() {
        // Page two ends below the bound; page three must never be requested.
        let pages = vec![full_page(1000), full_page(200), full_page(50)];
        let mut calls = 0u32;

        let result = fetch_pages(
            |page| {
                calls += 1;
                let batch = pages.get((page - 1) as usize).cloned().unwrap_or_default();
                async move { Ok(batch) }
            },
            |item| *item >= 150,
        )
        .await
        .unwrap();

        assert_eq!(calls, 2, "bound hit on page two stops pagination");
        assert!(result.iter().all(|item| *item >= 150));
        // All of page one plus the in-range prefix of page two
        assert_eq!(result.len(), PER_PAGE as usize + 51);
    }

    #[tokio::test]
    async fn test_single_short_page() {
        let mut calls = 0u32;
        let result = fetch_pages(
            |_page| {
                calls += 1;
                async move { Ok(vec![3, 2, 1]) }
            },
            |_| true,
        )
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(result, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let result: ApiResult<Vec<i64>> = fetch_pages(
            |_page| async move {
                Err(crate::github::error::ApiError::UnexpectedStatus {
                    operation: "listing".to_string(),
                    status: 500,
                })
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
    }
}
