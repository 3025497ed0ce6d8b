//! Draining paginated listings.
//!
//! Bitbucket listing endpoints are not consistent about pagination: some
//! return a usable `next` link, others only `size`/`pagelen` accounting.
//! The protocol is therefore chosen per call.

use crate::error::{Error, Result};
use crate::transport::{Response, Transport};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Pagination protocol of a listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Follow the fully qualified `next` URL until it is absent.
    Next,
    /// Request `page=2, 3, …` until the summed `pagelen` reaches `size`.
    PageCount,
}

/// Fetch every page of a listing and return the `values` in page order.
///
/// # Errors
///
/// Fails with [`Error::Upstream`] as soon as any page answers with a
/// status other than 200.
pub fn list_all(transport: &Transport, url: &str, pagination: Pagination) -> Result<Vec<Value>> {
    match pagination {
        Pagination::Next => follow_next(transport, url),
        Pagination::PageCount => count_pages(transport, url),
    }
}

fn fetch_page(transport: &Transport, url: &str) -> Result<Response> {
    let response = transport.get(url)?;
    if response.status != 200 {
        return Err(Error::upstream(response.status, &response.body));
    }
    Ok(response)
}

fn take_values(response: &mut Response) -> Vec<Value> {
    match response.body.remove("values") {
        Some(Value::Array(values)) => values,
        _ => Vec::new(),
    }
}

fn follow_next(transport: &Transport, url: &str) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(url.to_string());

    while let Some(page_url) = next.take() {
        let mut response = fetch_page(transport, &page_url)?;
        items.extend(take_values(&mut response));
        visited.insert(page_url);

        next = response
            .get("next")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(link) = next.as_deref().filter(|link| visited.contains(*link)) {
            log::warn!("next page {link} was already listed, stopping");
            break;
        }
    }

    Ok(items)
}

fn count_pages(transport: &Transport, url: &str) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut page: u64 = 1;
    let mut counted: u64 = 0;

    loop {
        let page_url = if page == 1 {
            url.to_string()
        } else {
            with_page(url, page)?
        };

        let mut response = fetch_page(transport, &page_url)?;
        items.extend(take_values(&mut response));

        let pagelen = response.get("pagelen").and_then(Value::as_u64).unwrap_or(0);
        let size = response.get("size").and_then(Value::as_u64).unwrap_or(0);
        counted += pagelen;

        log::trace!("{page_url}: page {page}, {counted}/{size}");
        if pagelen == 0 || counted >= size {
            break;
        }
        page += 1;
    }

    Ok(items)
}

/// Set the `page` query parameter, replacing any previous one.
pub fn with_page(url: &str, page: u64) -> Result<String> {
    let mut parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());

    Ok(parsed.into())
}
