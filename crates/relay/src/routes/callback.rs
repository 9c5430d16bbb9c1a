//! Airtable status webhook handler.
//!
//! POST /api/webhooks/airtable
//!
//! An Airtable automation posts here when staff change a submission row.
//! `status: "updated"` pushes the row's line items onto the draft order;
//! `paid: true` completes it. Both may arrive together, in which case the
//! update is applied first.
//!
//! The two mutations are independent calls with no rollback: if the update
//! succeeds and completion fails, the draft order stays updated and the
//! webhook answers 500.

use axum::{Json, body::Bytes, extract::State};
use draft_relay_core::{DraftOrderId, DraftOrderIdError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::shopify::{DraftOrderUpdate, SuppliedLineItem};
use crate::state::AppState;

/// Status value that triggers a line item update.
const STATUS_UPDATED: &str = "updated";

/// Webhook body sent by the Airtable automation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    #[serde(default)]
    pub status: Option<String>,
    /// Older automations send `draftId`.
    #[serde(default, alias = "draftId")]
    pub draft_order_id: Option<Value>,
    /// Forwarded to Shopify as given; each entry must be an object.
    #[serde(default)]
    pub line_items: Option<Vec<SuppliedLineItem>>,
    #[serde(default)]
    pub paid: Option<bool>,
    #[serde(default)]
    pub record_id: Option<String>,
}

impl CallbackPayload {
    fn draft_order_id(&self) -> std::result::Result<DraftOrderId, DraftOrderIdError> {
        self.draft_order_id
            .as_ref()
            .map_or(Err(DraftOrderIdError::Empty), DraftOrderId::from_json)
    }

    fn wants_update(&self) -> bool {
        self.status.as_deref() == Some(STATUS_UPDATED)
    }

    fn wants_completion(&self) -> bool {
        self.paid == Some(true)
    }
}

/// Acknowledgement returned to the webhook sender.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub success: bool,
}

/// Apply a record-store status change to its draft order.
#[instrument(
    skip_all,
    fields(draft_order_id = tracing::field::Empty, record_id = tracing::field::Empty)
)]
pub async fn receive(State(state): State<AppState>, body: Bytes) -> Result<Json<CallbackResponse>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("Request body is required".to_string()));
    }

    let payload: CallbackPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;

    let id = payload
        .draft_order_id()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let span = tracing::Span::current();
    span.record("draft_order_id", id.as_u64());
    if let Some(record_id) = payload.record_id.as_deref() {
        span.record("record_id", record_id);
    }

    let backend = state.order_backend();

    if payload.wants_update() {
        let update = DraftOrderUpdate::new(id, payload.line_items.clone());
        backend.update_draft_order(&update).await?;
    }

    if payload.wants_completion()
        && let Err(e) = backend.complete_draft_order(id).await
    {
        if payload.wants_update() {
            tracing::warn!("Draft order was updated but completion failed; update is kept");
        }
        return Err(e.into());
    }

    if !payload.wants_update() && !payload.wants_completion() {
        tracing::info!(status = ?payload.status, "Webhook carried no actionable change");
    }

    Ok(Json(CallbackResponse { success: true }))
}
