//! Shopify Admin REST API integration for draft orders.
//!
//! This module provides:
//! - [`OrderBackend`], the seam the route handlers depend on
//! - [`ShopifyClient`], the reqwest implementation against `/admin/api/{version}`
//! - Request and response types wrapped in the `{"draft_order": {...}}` envelope
//!
//! # Flow
//!
//! 1. The intake handler creates a draft order from a form submission
//! 2. Staff edit the row in Airtable; its automation calls our webhook
//! 3. The callback handler updates line items and/or completes the draft order

mod client;
mod error;
mod types;

use async_trait::async_trait;
use draft_relay_core::DraftOrderId;

pub use client::ShopifyClient;
pub use error::ShopifyError;
pub use types::{
    Address, Customer, DraftOrder, DraftOrderRequest, DraftOrderUpdate, SuppliedLineItem, UPDATE_NOTE,
};

/// Operations the relay performs against the order backend.
///
/// Each call is a single HTTP request; nothing is retried.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Create a draft order and return what Shopify assigned to it.
    async fn create_draft_order(&self, order: &DraftOrderRequest)
    -> Result<DraftOrder, ShopifyError>;

    /// Replace line items and set the note on an existing draft order.
    async fn update_draft_order(&self, update: &DraftOrderUpdate) -> Result<(), ShopifyError>;

    /// Finalize a draft order into a real order.
    async fn complete_draft_order(&self, id: DraftOrderId) -> Result<(), ShopifyError>;
}
