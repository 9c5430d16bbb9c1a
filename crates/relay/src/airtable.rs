//! Airtable API client for the submissions table.
//!
//! Each accepted form submission becomes one row. Rows are only ever
//! created here; later changes to the order go through Shopify.

use std::time::Duration;

use async_trait::async_trait;
use draft_relay_core::Record;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::AirtableConfig;

/// Errors that can occur when interacting with the Airtable API.
#[derive(Debug, Error)]
pub enum AirtableError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("Airtable API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client construction failed.
    #[error("Airtable client configuration error: {0}")]
    Config(String),
}

/// Persistence of submission rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create one row and return the store's response body verbatim.
    async fn create_record(&self, record: &Record) -> Result<serde_json::Value, AirtableError>;
}

/// `{"records": [{"fields": {...}}]}` request body.
#[derive(Debug, Serialize)]
struct CreateRecordsRequest<'a> {
    records: [RecordFields<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RecordFields<'a> {
    fields: &'a Record,
}

/// Airtable API client bound to a single table.
#[derive(Clone)]
pub struct AirtableClient {
    client: reqwest::Client,
    table_url: String,
}

impl AirtableClient {
    /// Create a client for the configured table.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &AirtableConfig, timeout: Duration) -> Result<Self, AirtableError> {
        Self::with_table_url(config.table_url(), &config.api_key, timeout)
    }

    /// Create a client posting to an explicit table endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn with_table_url(
        table_url: impl Into<String>,
        api_key: &SecretString,
        timeout: Duration,
    ) -> Result<Self, AirtableError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| AirtableError::Config(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            table_url: table_url.into(),
        })
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    #[instrument(skip(self, record), fields(columns = record.columns().count()))]
    async fn create_record(&self, record: &Record) -> Result<serde_json::Value, AirtableError> {
        let body = CreateRecordsRequest {
            records: [RecordFields { fields: record }],
        };

        let response = self.client.post(&self.table_url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(error = %e, status = status.as_u16(), "Failed to read Airtable error body");
                    String::new()
                }
            };
            return Err(AirtableError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let created: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AirtableError::Parse(e.to_string()))?;

        tracing::info!("Airtable record created");
        Ok(created)
    }
}
