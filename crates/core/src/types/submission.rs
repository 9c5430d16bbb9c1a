//! Form submissions and the field allow-lists that govern them.
//!
//! Two named sets control what leaves the service:
//!
//! - [`INTAKE_FIELDS`] - every field the form may submit. Anything else in
//!   the request body is dropped on arrival.
//! - [`RECORD_FIELDS`] - the subset written to the record store. Every entry
//!   is also in [`INTAKE_FIELDS`]; the variant list and product title are
//!   only used to build the draft order.
//!
//! Because [`Submission`] is keyed by [`SubmissionField`], a field name that
//! is not in the allow-list cannot be represented at all.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use super::id::DraftOrderId;
use super::line_item::{LineItem, LineItemError, parse_variant_ids};

/// Record store column that receives the created draft order ID.
pub const DRAFT_ORDER_ID_FIELD: &str = "Shopify Draft Order ID";

/// A field the order form is allowed to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubmissionField {
    First,
    Last,
    Email,
    Phone,
    DeliveryAddress,
    DeliveryZipCode,
    PromoCode,
    VariantId,
    ProductTitle,
}

/// Fields accepted from the request body.
pub const INTAKE_FIELDS: [SubmissionField; 9] = [
    SubmissionField::First,
    SubmissionField::Email,
    SubmissionField::Last,
    SubmissionField::Phone,
    SubmissionField::DeliveryAddress,
    SubmissionField::DeliveryZipCode,
    SubmissionField::PromoCode,
    SubmissionField::VariantId,
    SubmissionField::ProductTitle,
];

/// Fields copied into the record store. Strict subset of [`INTAKE_FIELDS`].
pub const RECORD_FIELDS: [SubmissionField; 7] = [
    SubmissionField::First,
    SubmissionField::Email,
    SubmissionField::Last,
    SubmissionField::Phone,
    SubmissionField::DeliveryAddress,
    SubmissionField::DeliveryZipCode,
    SubmissionField::PromoCode,
];

impl SubmissionField {
    /// The wire name used by the form and the record store columns.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::First => "First",
            Self::Last => "Last",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::DeliveryAddress => "Delivery Address",
            Self::DeliveryZipCode => "Delivery Zip Code",
            Self::PromoCode => "Promo Code",
            Self::VariantId => "variant_id",
            Self::ProductTitle => "product_title",
        }
    }

    /// Look up an allow-listed field by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        INTAKE_FIELDS.into_iter().find(|field| field.name() == name)
    }

    /// Whether this field is written to the record store.
    #[must_use]
    pub fn is_recorded(self) -> bool {
        RECORD_FIELDS.contains(&self)
    }
}

impl Serialize for SubmissionField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A sanitized field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Number),
}

impl FieldValue {
    /// Render the value as text (numbers use their JSON representation).
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
        }
    }
}

impl From<&FieldValue> for Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => Self::String(text.clone()),
            FieldValue::Number(number) => Self::Number(number.clone()),
        }
    }
}

/// The allow-listed, sanitized fields of one form submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Submission {
    fields: BTreeMap<SubmissionField, FieldValue>,
}

impl Submission {
    /// Build a submission from a parsed request body.
    ///
    /// Only [`INTAKE_FIELDS`] are read. Strings are passed through `sanitize`
    /// and dropped if nothing survives; numbers are kept as-is. `null`,
    /// booleans, arrays, and objects are dropped so that no nested keys can
    /// ride along. A body that is not a JSON object yields an empty
    /// submission.
    pub fn from_body(body: &Value, sanitize: impl Fn(&str) -> String) -> Self {
        let Some(object) = body.as_object() else {
            return Self::default();
        };

        let fields = INTAKE_FIELDS
            .into_iter()
            .filter_map(|field| {
                let value = match object.get(field.name())? {
                    Value::String(raw) => {
                        let clean = sanitize(raw);
                        if clean.trim().is_empty() {
                            return None;
                        }
                        FieldValue::Text(clean)
                    }
                    Value::Number(number) => FieldValue::Number(number.clone()),
                    _ => return None,
                };
                Some((field, value))
            })
            .collect();

        Self { fields }
    }

    /// Returns `true` if no allow-listed field survived filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, field: SubmissionField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Get a field value rendered as text.
    #[must_use]
    pub fn text(&self, field: SubmissionField) -> Option<String> {
        self.get(field).map(FieldValue::to_text)
    }

    /// Names of the fields present, in allow-list order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().map(|field| field.name())
    }

    /// Derive draft order line items from the variant field.
    ///
    /// A text value is treated as a comma-separated list; a bare integer is
    /// a single variant. A missing field yields no items.
    ///
    /// # Errors
    ///
    /// Returns an error if any variant token is not a positive integer.
    pub fn line_items(&self) -> Result<Vec<LineItem>, LineItemError> {
        match self.get(SubmissionField::VariantId) {
            None => Ok(Vec::new()),
            Some(FieldValue::Text(list)) => parse_variant_ids(list),
            Some(FieldValue::Number(number)) => match number.as_u64() {
                Some(id) if id > 0 => Ok(vec![LineItem::new(id)]),
                _ => Err(LineItemError::InvalidVariantId(number.to_string())),
            },
        }
    }

    /// Project the submission onto [`RECORD_FIELDS`], adding the draft order
    /// ID under [`DRAFT_ORDER_ID_FIELD`] when one was created.
    #[must_use]
    pub fn to_record(&self, draft_order_id: Option<DraftOrderId>) -> Record {
        let mut fields: BTreeMap<&'static str, Value> = self
            .fields
            .iter()
            .filter(|(field, _)| field.is_recorded())
            .map(|(field, value)| (field.name(), Value::from(value)))
            .collect();

        if let Some(id) = draft_order_id {
            fields.insert(DRAFT_ORDER_ID_FIELD, Value::from(id));
        }

        Record { fields }
    }
}

/// One row destined for the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<&'static str, Value>,
}

impl Record {
    /// Get a column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Column names present in this record.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }
}
