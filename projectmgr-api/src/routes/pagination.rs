/// Page-number pagination for list endpoints
///
/// - `?page=N` selects a 1-based page. Anything that isn't a positive integer,
///   or a page past the end, is a 404 `Invalid page.`. Page 1 always exists,
///   even for an empty list.
/// - `?page_size=N` overrides the configured size. Non-numeric or
///   non-positive values fall back to the default; large values are clamped.
///
/// Responses use the envelope `{count, next, previous, results}` where the
/// links are the request path and query with `page` replaced.

use axum::http::Uri;
use projectmgr_shared::models::listing::{Listing, PageRequest};
use serde::Serialize;

use crate::config::PaginationConfig;
use crate::error::{ApiError, ApiResult};

/// Paginated list envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Size of the whole filtered list
    pub count: i64,

    /// Link to the next page, if any
    pub next: Option<String>,

    /// Link to the previous page, if any
    pub previous: Option<String>,

    pub results: Vec<T>,
}

/// Resolved page number and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub number: i64,
    pub size: i64,
}

fn invalid_page() -> ApiError {
    ApiError::NotFound("Invalid page.".to_string())
}

impl PageParams {
    /// Parses raw `page` and `page_size` query values
    pub fn parse(
        page: Option<&str>,
        page_size: Option<&str>,
        config: &PaginationConfig,
    ) -> ApiResult<Self> {
        let number = match page.map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(invalid_page()),
            },
        };

        let size = page_size
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .map(|n| n.min(config.max_page_size))
            .unwrap_or(config.page_size);

        Ok(Self { number, size })
    }

    /// Window to request from the store
    pub fn request(&self) -> PageRequest {
        PageRequest {
            limit: self.size,
            offset: (self.number - 1).saturating_mul(self.size),
        }
    }

    /// Number of pages for `total` rows (at least 1)
    pub fn page_count(&self, total: i64) -> i64 {
        if total <= 0 {
            1
        } else {
            (total + self.size - 1) / self.size
        }
    }
}

/// Wraps a store listing in the page envelope, mapping each row with `render`
///
/// # Errors
///
/// Returns 404 `Invalid page.` when the requested page is past the end
pub fn paginate<T, U>(
    listing: Listing<T>,
    params: PageParams,
    uri: &Uri,
    render: impl Fn(T) -> U,
) -> ApiResult<Page<U>> {
    let pages = params.page_count(listing.total);
    if params.number > pages {
        return Err(invalid_page());
    }

    let next = (params.number < pages).then(|| page_link(uri, Some(params.number + 1)));
    let previous = (params.number > 1).then(|| {
        let prev = params.number - 1;
        page_link(uri, if prev == 1 { None } else { Some(prev) })
    });

    Ok(Page {
        count: listing.total,
        next,
        previous,
        results: listing.items.into_iter().map(render).collect(),
    })
}

/// Request path and query with `page` replaced (or removed when `None`)
///
/// Remaining parameters are kept verbatim, sorted by name.
pub fn page_link(uri: &Uri, page: Option<i64>) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some("page"))
        .map(str::to_string)
        .collect();

    if let Some(n) = page {
        pairs.push(format!("page={}", n));
    }
    pairs.sort_by(|a, b| query_key(a).cmp(query_key(b)));

    if pairs.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), pairs.join("&"))
    }
}

fn query_key(pair: &str) -> &str {
    pair.split('=').next().unwrap_or(pair)
}
