//! Draft Relay library.
//!
//! Receives order form submissions, turns them into Shopify draft orders,
//! and records each submission in Airtable. A second endpoint accepts
//! Airtable status webhooks and updates or completes the draft order.
//!
//! The crate is a library so the router can be driven directly in tests
//! with in-memory [`OrderBackend`](shopify::OrderBackend) and
//! [`RecordStore`](airtable::RecordStore) implementations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod airtable;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod sanitize;
pub mod shopify;
pub mod state;

pub use routes::app;
