//! Draft order identifiers.
//!
//! Shopify assigns draft order IDs as integers, but callers hand them back to
//! us in several shapes: JSON numbers, numeric strings copied out of a
//! spreadsheet cell, or Admin GraphQL global IDs. [`DraftOrderId`] accepts
//! all three and normalizes to the numeric form, which is what the REST
//! endpoints expect in their path.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Prefix of a Shopify Admin GraphQL global ID for draft orders.
const GID_PREFIX: &str = "gid://shopify/DraftOrder/";

/// Errors that can occur when parsing a [`DraftOrderId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftOrderIdError {
    /// The input is missing, null, or blank.
    #[error("draftOrderId is required")]
    Empty,
    /// The input is not a positive integer.
    #[error("draftOrderId must be a positive integer, got '{0}'")]
    Invalid(String),
}

/// A Shopify draft order ID.
///
/// Always a positive integer, so it is safe to interpolate into a URL path.
///
/// ## Examples
///
/// ```
/// use draft_relay_core::DraftOrderId;
///
/// assert_eq!(DraftOrderId::parse("555").unwrap().as_u64(), 555);
/// assert_eq!(
///     DraftOrderId::parse("gid://shopify/DraftOrder/555").unwrap().as_u64(),
///     555
/// );
///
/// assert!(DraftOrderId::parse("").is_err());
/// assert!(DraftOrderId::parse("../orders").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftOrderId(u64);

impl DraftOrderId {
    /// Create a new ID from a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is zero.
    pub fn new(id: u64) -> Result<Self, DraftOrderIdError> {
        if id == 0 {
            return Err(DraftOrderIdError::Invalid(id.to_string()));
        }
        Ok(Self(id))
    }

    /// Parse an ID from text (numeric string or GraphQL global ID).
    ///
    /// # Errors
    ///
    /// Returns [`DraftOrderIdError::Empty`] for blank input and
    /// [`DraftOrderIdError::Invalid`] for anything that is not a positive
    /// integer.
    pub fn parse(s: &str) -> Result<Self, DraftOrderIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DraftOrderIdError::Empty);
        }

        let digits = trimmed.strip_prefix(GID_PREFIX).unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DraftOrderIdError::Invalid(trimmed.to_owned()));
        }

        let id = digits
            .parse::<u64>()
            .map_err(|_| DraftOrderIdError::Invalid(trimmed.to_owned()))?;
        Self::new(id)
    }

    /// Extract an ID from an arbitrary JSON value.
    ///
    /// `null` and blank strings are treated as missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing or not a positive integer.
    pub fn from_json(value: &Value) -> Result<Self, DraftOrderIdError> {
        match value {
            Value::Null => Err(DraftOrderIdError::Empty),
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| DraftOrderIdError::Invalid(n.to_string()))
                .and_then(Self::new),
            Value::String(s) => Self::parse(s),
            other => Err(DraftOrderIdError::Invalid(other.to_string())),
        }
    }

    /// Get the underlying integer value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DraftOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DraftOrderId {
    type Err = DraftOrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DraftOrderId> for u64 {
    fn from(id: DraftOrderId) -> Self {
        id.0
    }
}

impl From<DraftOrderId> for Value {
    fn from(id: DraftOrderId) -> Self {
        Self::from(id.0)
    }
}

impl Serialize for DraftOrderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for DraftOrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(DraftOrderId::parse("1234567890").unwrap().as_u64(), 1_234_567_890);
        assert_eq!(DraftOrderId::parse("  42 ").unwrap().as_u64(), 42);
    }

    #[test]
    fn test_parse_gid() {
        let id = DraftOrderId::parse("gid://shopify/DraftOrder/987").unwrap();
        assert_eq!(id.as_u64(), 987);
    }

    #[test]
    fn test_parse_rejects_path_segments() {
        assert!(matches!(
            DraftOrderId::parse("12/complete"),
            Err(DraftOrderIdError::Invalid(_))
        ));
        assert!(matches!(
            DraftOrderId::parse("+12"),
            Err(DraftOrderIdError::Invalid(_))
        ));
        assert!(matches!(
            DraftOrderId::parse("gid://shopify/DraftOrder/"),
            Err(DraftOrderIdError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_rejects_zero() {
        assert!(DraftOrderId::parse("0").is_err());
        assert!(DraftOrderId::new(0).is_err());
    }

    #[test]
    fn test_from_json_missing() {
        assert_eq!(
            DraftOrderId::from_json(&Value::Null),
            Err(DraftOrderIdError::Empty)
        );
        assert_eq!(
            DraftOrderId::from_json(&json!("   ")),
            Err(DraftOrderIdError::Empty)
        );
    }

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(DraftOrderId::from_json(&json!(555)).unwrap().as_u64(), 555);
        assert_eq!(DraftOrderId::from_json(&json!("555")).unwrap().as_u64(), 555);
        assert!(DraftOrderId::from_json(&json!(-1)).is_err());
        assert!(DraftOrderId::from_json(&json!(1.5)).is_err());
        assert!(DraftOrderId::from_json(&json!(true)).is_err());
        assert!(DraftOrderId::from_json(&json!([555])).is_err());
    }

    #[test]
    fn test_serde_roundtrip_is_numeric() {
        let id: DraftOrderId = serde_json::from_value(json!("555")).unwrap();
        assert_eq!(serde_json::to_value(id).unwrap(), json!(555));
        assert_eq!(id.to_string(), "555");
    }
}
