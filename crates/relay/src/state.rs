//! Application state shared across handlers.

use std::sync::Arc;

use crate::airtable::{AirtableClient, AirtableError, RecordStore};
use crate::config::RelayConfig;
use crate::shopify::{OrderBackend, ShopifyClient, ShopifyError};

/// Error creating the upstream API clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build Shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("failed to build Airtable client: {0}")]
    Airtable(#[from] AirtableError),
}

/// Application state shared across all handlers.
///
/// Holds only read-only configuration and the two upstream clients; no
/// request ever writes to it. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RelayConfig,
    order_backend: Arc<dyn OrderBackend>,
    record_store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Create application state with the real Shopify and Airtable clients.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn new(config: RelayConfig) -> Result<Self, StateError> {
        let shopify = ShopifyClient::new(&config.shopify, config.upstream_timeout)?;
        let airtable = AirtableClient::new(&config.airtable, config.upstream_timeout)?;

        Ok(Self::with_backends(
            config,
            Arc::new(shopify),
            Arc::new(airtable),
        ))
    }

    /// Create application state with explicit collaborators.
    #[must_use]
    pub fn with_backends(
        config: RelayConfig,
        order_backend: Arc<dyn OrderBackend>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                order_backend,
                record_store,
            }),
        }
    }

    /// Get a reference to the relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Get the order backend (Shopify).
    #[must_use]
    pub fn order_backend(&self) -> &dyn OrderBackend {
        self.inner.order_backend.as_ref()
    }

    /// Get the record store (Airtable).
    #[must_use]
    pub fn record_store(&self) -> &dyn RecordStore {
        self.inner.record_store.as_ref()
    }
}
