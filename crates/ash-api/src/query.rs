// Collection queries and transparent pagination.
//
// Collection endpoints answer `{ count, next, previous, results }`. A query
// fixes the page size from the requested result ceiling, follows `next`
// links until the ceiling is reached, and fails the whole fetch if any
// page comes back with a status other than 200.

use indexmap::IndexMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;

/// Largest page size the controller accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// One page of a collection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Describes a collection fetch: which endpoint, how many results, in what
/// order, and with which filters.
///
/// Filter keys are passed through untouched; callers decide lookups such
/// as `name__icontains` before the query sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    endpoint: String,
    result_limit: usize,
    order_by: Option<String>,
    filters: IndexMap<String, Vec<String>>,
}

impl CollectionQuery {
    /// Query a top-level collection such as `jobs` or `job_templates`.
    /// The result ceiling defaults to unbounded.
    pub fn new(resource: &str) -> Self {
        Self::at(format!("{}/", resource.trim_matches('/')))
    }

    /// Query a collection at an explicit endpoint, e.g. a sub-collection
    /// like `job_templates/7/jobs/`.
    pub fn at(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            result_limit: 0,
            order_by: None,
            filters: IndexMap::new(),
        }
    }

    /// Maximum number of results; `0` means everything the server reports.
    pub fn limit(mut self, result_limit: usize) -> Self {
        self.result_limit = result_limit;
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Add one value for a filter key. Repeated values become repeated
    /// query parameters.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Merge a whole filter mapping.
    pub fn filters<K, I, V>(mut self, filters: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for (key, values) in filters {
            let slot = self.filters.entry(key.into()).or_default();
            slot.extend(values.into_iter().map(Into::into));
        }
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn result_limit(&self) -> usize {
        self.result_limit
    }

    /// Page size sent to the server: the ceiling itself when it fits in one
    /// page, otherwise the maximum page size.
    pub fn page_size(&self) -> usize {
        if self.result_limit == 0 || self.result_limit > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            self.result_limit
        }
    }

    /// Build the URL of the first page.
    pub fn first_page_url(&self, client: &ApiClient) -> Result<Url, Error> {
        let mut url = client.endpoint_url(&self.endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page_size", &self.page_size().to_string());
            if let Some(ref order_by) = self.order_by {
                pairs.append_pair("order_by", order_by);
            }
            for (key, values) in &self.filters {
                for value in values {
                    pairs.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }
}

impl ApiClient {
    /// Fetch a collection, following `next` links until the result ceiling
    /// is reached or the server runs out of pages.
    ///
    /// Any non-200 page aborts the fetch: partial results are discarded.
    pub async fn retrieve(&self, query: &CollectionQuery) -> Result<Vec<Value>, Error> {
        let first = query.first_page_url(self)?;
        let mut page = self.fetch_page(first).await?;

        let limit = match query.result_limit() {
            0 => usize::try_from(page.count).unwrap_or(usize::MAX),
            n => n,
        };

        let mut results = Vec::with_capacity(limit.min(page.results.len()));
        let mut pages = 1usize;

        loop {
            let remaining = limit.saturating_sub(results.len());
            results.extend(page.results.into_iter().take(remaining));

            let Some(next) = page.next.filter(|_| results.len() < limit) else {
                break;
            };

            let url = self.endpoint_url(&self.relative_endpoint(&next))?;
            page = self.fetch_page(url).await?;
            pages += 1;
        }

        debug!(
            endpoint = query.endpoint(),
            pages,
            results = results.len(),
            "collection fetched"
        );
        Ok(results)
    }

    async fn fetch_page(&self, url: Url) -> Result<Page, Error> {
        let resp = self.get_url(url).await?;
        if !resp.is(StatusCode::OK) {
            warn!(status = resp.status().as_u16(), "collection page failed");
            return Err(resp.into_error());
        }
        resp.json()
    }
}
