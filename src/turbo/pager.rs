use reqwest::Method;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;

use super::client::TurboClient;
use crate::errors::ApiError;

/// Page size requested from cursor-paginated endpoints.
pub const PAGE_LIMIT: usize = 500;
/// Response header carrying the cursor of the following page.
pub const NEXT_CURSOR_HEADER: &str = "x-next-cursor";

/// A request that is replayed once per page with an advancing cursor.
#[derive(Debug, Clone)]
pub struct PagedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// Cursor over a paginated API result. Pages are fetched lazily, in order,
/// one per `next_page` call, until the server stops returning a cursor.
pub struct Pager<'a, T> {
    client: &'a TurboClient,
    request: PagedRequest,
    cursor: Option<String>,
    complete: bool,
    pages_fetched: usize,
    _item: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Pager<'a, T> {
    pub(crate) fn new(client: &'a TurboClient, request: PagedRequest) -> Self {
        Self {
            client,
            request,
            cursor: Some("0".to_string()),
            complete: false,
            pages_fetched: 0,
            _item: PhantomData,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page. Returns an empty page once complete. A failed
    /// request leaves the cursor in place, so the same page can be retried.
    pub async fn next_page(&mut self) -> Result<Vec<T>, ApiError> {
        let cursor = match self.cursor.as_deref() {
            Some(c) => c.to_string(),
            None => {
                self.complete = true;
                return Ok(Vec::new());
            }
        };

        let mut query = self.request.query.clone();
        query.push(("cursor".to_string(), cursor.clone()));
        query.push(("limit".to_string(), PAGE_LIMIT.to_string()));

        let response = self
            .client
            .send(&self.request.method, &self.request.path, &query, self.request.body.as_ref())
            .await?;
        let items: Vec<T> = response.decode(&self.request.path)?;

        // A repeated cursor would loop forever
        self.cursor = response
            .next_cursor
            .filter(|next| !next.is_empty() && *next != cursor);
        self.complete = self.cursor.is_none();
        self.pages_fetched += 1;

        debug!(
            path = %self.request.path,
            page = self.pages_fetched,
            items = items.len(),
            complete = self.complete,
            "fetched page"
        );
        Ok(items)
    }

    /// Drains every remaining page into one vector.
    pub async fn collect_all(mut self) -> Result<Vec<T>, ApiError> {
        let mut all = Vec::new();
        while !self.is_complete() {
            all.extend(self.next_page().await?);
        }
        Ok(all)
    }
}
