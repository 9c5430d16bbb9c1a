//! Core types for Draft Relay.
//!
//! This module provides type-safe wrappers for the form submission and the
//! order identifiers that flow between the two external systems.

pub mod id;
pub mod line_item;
pub mod submission;

pub use id::{DraftOrderId, DraftOrderIdError};
pub use line_item::{LineItem, LineItemError, parse_variant_ids};
pub use submission::{
    DRAFT_ORDER_ID_FIELD, FieldValue, INTAKE_FIELDS, RECORD_FIELDS, Record, Submission,
    SubmissionField,
};
