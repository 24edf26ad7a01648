use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use shared::{
    domain::{CollectionKind, Item, ItemId},
    error::{ApiError, ApiException},
    protocol::{CreateItemRequest, ItemPage, PageQuery, SelectionIdsRequest},
};
use tracing::debug;
use url::Url;

use crate::ItemsTransport;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// JSON-over-HTTP implementation of [`ItemsTransport`].
#[derive(Clone)]
pub struct HttpItemsTransport {
    http: Client,
    base_url: String,
}

impl HttpItemsTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid API base url '{base_url}'"))?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn list_path(collection: CollectionKind) -> &'static str {
        match collection {
            CollectionKind::Universe => "/items",
            CollectionKind::Selection => "/selected",
        }
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let reason = status.canonical_reason().unwrap_or("unknown status");
        // Prefer the server's own message when the body is an ApiError.
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|err| err.message)
            .unwrap_or_else(|_| reason.to_string());
        Err(ApiException::new(status.as_u16(), message).into())
    }
}

#[async_trait]
impl ItemsTransport for HttpItemsTransport {
    async fn fetch_page(&self, collection: CollectionKind, query: PageQuery) -> Result<ItemPage> {
        debug!(
            collection = %collection,
            offset = query.offset,
            limit = query.limit,
            filter = query.filter.as_deref().unwrap_or(""),
            "transport: fetching page"
        );
        let page = Self::send(
            self.http
                .get(self.endpoint(Self::list_path(collection)))
                .query(&query),
        )
        .await?
        .json()
        .await
        .with_context(|| format!("malformed {collection} page"))?;
        Ok(page)
    }

    async fn add_to_selection(&self, id: ItemId) -> Result<()> {
        Self::send(
            self.http
                .post(self.endpoint("/selected"))
                .json(&SelectionIdsRequest { ids: vec![id] }),
        )
        .await?;
        Ok(())
    }

    async fn remove_from_selection(&self, id: ItemId) -> Result<()> {
        Self::send(
            self.http
                .delete(self.endpoint("/selected"))
                .json(&SelectionIdsRequest { ids: vec![id] }),
        )
        .await?;
        Ok(())
    }

    async fn set_order(&self, ids: &[ItemId]) -> Result<()> {
        Self::send(
            self.http
                .put(self.endpoint("/selected/order"))
                .json(&SelectionIdsRequest { ids: ids.to_vec() }),
        )
        .await?;
        Ok(())
    }

    async fn create_item(&self, id: ItemId) -> Result<Item> {
        let item = Self::send(
            self.http
                .post(self.endpoint("/items"))
                .json(&CreateItemRequest { id }),
        )
        .await?
        .json()
        .await
        .context("malformed created item")?;
        Ok(item)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
