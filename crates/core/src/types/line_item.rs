//! Draft order line items.

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a variant list.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LineItemError {
    /// A token in the list is not a positive integer.
    #[error("invalid variant id: '{0}'")]
    InvalidVariantId(String),
}

/// A single product variant on a draft order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    /// Shopify product variant ID.
    pub variant_id: u64,
    /// Number of units, defaults to 1 when omitted.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl LineItem {
    /// Create a line item for a single unit of `variant_id`.
    #[must_use]
    pub const fn new(variant_id: u64) -> Self {
        Self {
            variant_id,
            quantity: 1,
        }
    }
}

const fn default_quantity() -> u32 {
    1
}

/// Parse a comma-separated list of variant IDs into single-unit line items.
///
/// Tokens are trimmed and empty tokens are skipped, so `"101, 202,"` yields
/// two items. An empty input yields no items.
///
/// # Errors
///
/// Returns [`LineItemError::InvalidVariantId`] for the first token that is
/// not a positive integer. Nothing is coerced.
pub fn parse_variant_ids(input: &str) -> Result<Vec<LineItem>, LineItemError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            if !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(LineItemError::InvalidVariantId(token.to_owned()));
            }
            match token.parse::<u64>() {
                Ok(id) if id > 0 => Ok(LineItem::new(id)),
                _ => Err(LineItemError::InvalidVariantId(token.to_owned())),
            }
        })
        .collect()
}
