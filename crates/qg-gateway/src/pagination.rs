//! Offset/limit pagination on top of single gateway calls.

use std::future::Future;

use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Fetch pages of `limit` rows until a page comes back short.
///
/// `fetch(offset, limit)` performs one call. A page with fewer than `limit`
/// rows ends the sequence.
pub async fn collect_pages<T, F, Fut>(limit: usize, mut fetch: F) -> GatewayResult<Vec<T>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = GatewayResult<Vec<T>>>,
{
    if limit == 0 {
        return Err(GatewayError::Config("page limit must be positive".to_string()));
    }

    let mut rows = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch(offset, limit).await?;
        let count = page.len();
        rows.extend(page);
        debug!(offset, limit, count, "Fetched page");

        if count < limit {
            return Ok(rows);
        }
        offset += limit;
    }
}

/// Fetch exactly `depth` rows, `limit` per page.
///
/// Stops once `depth` rows have been requested or a page comes back short,
/// then truncates to `depth`. Fewer than `depth` rows available is an
/// [`GatewayError::OutOfRange`].
pub async fn collect_depth<T, F, Fut>(
    depth: usize,
    limit: usize,
    mut fetch: F,
) -> GatewayResult<Vec<T>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = GatewayResult<Vec<T>>>,
{
    if limit == 0 {
        return Err(GatewayError::Config("page limit must be positive".to_string()));
    }

    let mut rows = Vec::with_capacity(depth);
    let mut offset = 0;
    while offset < depth {
        let page = fetch(offset, limit).await?;
        let count = page.len();
        rows.extend(page);

        if count < limit {
            break;
        }
        offset += limit;
    }

    if rows.len() < depth {
        return Err(GatewayError::OutOfRange {
            requested: depth,
            available: rows.len(),
        });
    }
    rows.truncate(depth);
    Ok(rows)
}
