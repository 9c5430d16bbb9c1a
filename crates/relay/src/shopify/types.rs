//! Draft order request and response types.

use draft_relay_core::{DraftOrderId, LineItem, Submission, SubmissionField};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Note written on every draft order changed through the record-store webhook.
pub const UPDATE_NOTE: &str = "Updated automatically from Airtable";

/// `{"draft_order": ...}` wrapper used by every draft order endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct DraftOrderEnvelope<T> {
    pub draft_order: T,
}

/// Body of `POST /draft_orders.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub line_items: Vec<LineItem>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl DraftOrderRequest {
    /// Build a draft order from a sanitized submission.
    ///
    /// The billing address is a copy of the shipping address; the form only
    /// collects one.
    #[must_use]
    pub fn from_submission(submission: &Submission, line_items: Vec<LineItem>, tags: &str) -> Self {
        let address = Address::from_submission(submission);
        let tags = tags.trim();

        Self {
            email: submission.text(SubmissionField::Email),
            line_items,
            shipping_address: address.clone(),
            billing_address: address,
            customer: Customer {
                first_name: submission.text(SubmissionField::First),
                email: submission.text(SubmissionField::Email),
            },
            tags: (!tags.is_empty()).then(|| tags.to_string()),
        }
    }
}

/// Shipping or billing address block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl Address {
    fn from_submission(submission: &Submission) -> Self {
        Self {
            first_name: submission.text(SubmissionField::First),
            last_name: submission.text(SubmissionField::Last),
            address1: submission.text(SubmissionField::DeliveryAddress),
            phone: submission.text(SubmissionField::Phone),
            zip: submission.text(SubmissionField::DeliveryZipCode),
        }
    }
}

/// Customer identity attached to the draft order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A line item exactly as the webhook supplied it.
///
/// Shopify accepts many keys here (`variant_id`, `title`, `price`,
/// `properties`, `applied_discount`, ...), so entries are only required to be
/// JSON objects and are forwarded untouched.
pub type SuppliedLineItem = Map<String, Value>;

/// Body of `PUT /draft_orders/{id}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftOrderUpdate {
    pub id: DraftOrderId,
    /// Omitted entirely when the webhook carried no line items, so the
    /// existing items are left alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<SuppliedLineItem>>,
    pub note: String,
}

impl DraftOrderUpdate {
    /// Update with the standard webhook note.
    #[must_use]
    pub fn new(id: DraftOrderId, line_items: Option<Vec<SuppliedLineItem>>) -> Self {
        Self {
            id,
            line_items,
            note: UPDATE_NOTE.to_string(),
        }
    }
}

/// The parts of a Shopify draft order the relay reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub id: DraftOrderId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
