//! Shopify Admin API errors.

use thiserror::Error;

/// Errors that can occur when calling the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("Shopify API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client construction failed.
    #[error("Shopify client configuration error: {0}")]
    Config(String),
}

impl ShopifyError {
    /// Returns `true` if the request exceeded the configured deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}
