//! Draft Relay Core - Shared types library.
//!
//! This crate provides the types shared by the relay service and its tests:
//! - `relay` - Form intake and record-store callback service
//! - `integration-tests` - Router-level tests with in-memory collaborators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Sanitization is injected by the caller so this crate stays free
//! of any HTML engine.
//!
//! # Modules
//!
//! - [`types`] - Form fields and their allow-lists, line items, draft order IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
