//! Shopify Admin REST API client.

use std::time::Duration;

use async_trait::async_trait;
use draft_relay_core::DraftOrderId;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::types::DraftOrderEnvelope;
use super::{DraftOrder, DraftOrderRequest, DraftOrderUpdate, OrderBackend, ShopifyError};
use crate::config::ShopifyConfig;

/// Header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Shopify Admin REST API client for draft orders.
///
/// Every request carries the access token and is bounded by the configured
/// timeout.
#[derive(Clone)]
pub struct ShopifyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ShopifyClient {
    /// Create a client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShopifyConfig, timeout: Duration) -> Result<Self, ShopifyError> {
        Self::with_base_url(config.admin_api_url(), &config.access_token, timeout)
    }

    /// Create a client against an explicit API root
    /// (e.g. `https://shop.myshopify.com/admin/api/2024-07`).
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: &SecretString,
        timeout: Duration,
    ) -> Result<Self, ShopifyError> {
        let base_url: String = base_url.into();
        let mut headers = HeaderMap::new();

        let mut token = HeaderValue::from_str(access_token.expose_secret())
            .map_err(|e| ShopifyError::Config(format!("Invalid access token format: {e}")))?;
        token.set_sensitive(true);
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn draft_order_url(&self, id: DraftOrderId) -> String {
        format!("{}/draft_orders/{id}.json", self.base_url)
    }
}

/// Turn a non-2xx response into [`ShopifyError::Api`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ShopifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, status = status.as_u16(), "Failed to read Shopify error body");
            String::new()
        }
    };
    Err(ShopifyError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl OrderBackend for ShopifyClient {
    #[instrument(skip(self, order), fields(line_items = order.line_items.len()))]
    async fn create_draft_order(
        &self,
        order: &DraftOrderRequest,
    ) -> Result<DraftOrder, ShopifyError> {
        let url = format!("{}/draft_orders.json", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&DraftOrderEnvelope { draft_order: order })
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let envelope: DraftOrderEnvelope<DraftOrder> = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;

        tracing::info!(draft_order_id = %envelope.draft_order.id, "Draft order created");
        Ok(envelope.draft_order)
    }

    #[instrument(skip(self, update), fields(draft_order_id = %update.id))]
    async fn update_draft_order(&self, update: &DraftOrderUpdate) -> Result<(), ShopifyError> {
        let response = self
            .client
            .put(self.draft_order_url(update.id))
            .json(&DraftOrderEnvelope {
                draft_order: update,
            })
            .send()
            .await?;
        ensure_success(response).await?;

        tracing::info!("Draft order updated");
        Ok(())
    }

    #[instrument(skip(self), fields(draft_order_id = %id))]
    async fn complete_draft_order(&self, id: DraftOrderId) -> Result<(), ShopifyError> {
        let url = format!("{}/draft_orders/{id}/complete.json", self.base_url);

        let response = self.client.put(&url).send().await?;
        ensure_success(response).await?;

        tracing::info!("Draft order completed");
        Ok(())
    }
}
