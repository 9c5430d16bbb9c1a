//! Order form intake handler.
//!
//! POST /api/order-form
//!
//! Sanitizes the submitted fields, creates a Shopify draft order when the
//! form names product variants, then writes one Airtable row carrying the
//! draft order ID. Every outcome, including failures, is a JSON response
//! with CORS headers applied.
//!
//! The body is only buffered once the method and origin gates have passed,
//! so preflights and rejected origins never depend on what was sent.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{Method, StatusCode, header::ORIGIN},
    response::{IntoResponse, Response},
};
use draft_relay_core::{DraftOrderId, Submission};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::config::OriginPolicy;
use crate::error::AppError;
use crate::middleware::CorsDecision;
use crate::sanitize::sanitize;
use crate::shopify::DraftOrderRequest;
use crate::state::AppState;

/// Body of a successful submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeResponse {
    pub message: String,
    pub airtable_response: Value,
    pub shopify_draft_order_id: Option<DraftOrderId>,
}

/// A failed submission, with whatever draft order was created before the
/// failure so it can be reconciled by hand.
#[derive(Debug)]
pub struct IntakeFailure {
    pub error: AppError,
    pub draft_order_id: Option<DraftOrderId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IntakeFailureBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopify_draft_order_id: Option<DraftOrderId>,
}

impl From<AppError> for IntakeFailure {
    fn from(error: AppError) -> Self {
        Self {
            error,
            draft_order_id: None,
        }
    }
}

impl IntoResponse for IntakeFailure {
    fn into_response(self) -> Response {
        self.error.report();

        let body = IntakeFailureBody {
            error: self.error.client_message(),
            shopify_draft_order_id: self.draft_order_id,
        };
        (self.error.status(), Json(body)).into_response()
    }
}

enum IntakeOutcome {
    Preflight,
    Recorded(IntakeResponse),
}

/// Handle any method on the intake route.
///
/// OPTIONS is answered with 204 before anything else is looked at; other
/// methods than POST get 405.
#[instrument(
    skip_all,
    fields(
        method = %request.method(),
        origin = request
            .headers()
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-"),
    )
)]
pub async fn submit(State(state): State<AppState>, request: Request) -> Response {
    let cors = CorsDecision::evaluate(&state.config().cors, request.headers());

    let mut response = match process(&state, &cors, request).await {
        Ok(IntakeOutcome::Preflight) => StatusCode::NO_CONTENT.into_response(),
        Ok(IntakeOutcome::Recorded(success)) => (StatusCode::OK, Json(success)).into_response(),
        Err(failure) => failure.into_response(),
    };

    cors.apply(&mut response);
    response
}

async fn process(
    state: &AppState,
    cors: &CorsDecision,
    request: Request,
) -> Result<IntakeOutcome, IntakeFailure> {
    let method = request.method();
    if *method == Method::OPTIONS {
        return Ok(IntakeOutcome::Preflight);
    }
    if *method != Method::POST {
        return Err(AppError::MethodNotAllowed.into());
    }

    if !cors.is_allowed() {
        match state.config().cors.policy {
            OriginPolicy::Strict => {
                tracing::warn!("Rejected submission from disallowed origin");
                return Err(AppError::Forbidden("Origin not allowed".to_string()).into());
            }
            OriginPolicy::Permissive => {
                tracing::debug!("Processing submission without CORS permission");
            }
        }
    }

    let body = Bytes::from_request(request, &())
        .await
        .map_err(AppError::from)?;
    let raw = parse_body(&body)?;
    let submission = Submission::from_body(&raw, sanitize);
    if submission.is_empty() {
        return Err(AppError::BadRequest("No valid fields provided.".to_string()).into());
    }
    tracing::debug!(
        fields = ?submission.field_names().collect::<Vec<_>>(),
        "Submission sanitized"
    );

    let line_items = submission
        .line_items()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let draft_order_id = if line_items.is_empty() {
        tracing::info!("No variants submitted, skipping draft order");
        None
    } else {
        let request = DraftOrderRequest::from_submission(
            &submission,
            line_items,
            &state.config().shopify.draft_order_tags,
        );
        let draft_order = state
            .order_backend()
            .create_draft_order(&request)
            .await
            .map_err(AppError::from)?;
        Some(draft_order.id)
    };

    let record = submission.to_record(draft_order_id);
    let airtable_response = state
        .record_store()
        .create_record(&record)
        .await
        .map_err(|e| {
            if let Some(id) = draft_order_id {
                tracing::warn!(draft_order_id = %id, "Draft order created but record was not saved");
            }
            IntakeFailure {
                error: e.into(),
                draft_order_id,
            }
        })?;

    tracing::info!(
        draft_order_id = draft_order_id.map(|id| id.as_u64()),
        "Submission recorded"
    );

    Ok(IntakeOutcome::Recorded(IntakeResponse {
        message: "Submission received".to_string(),
        airtable_response,
        shopify_draft_order_id: draft_order_id,
    }))
}

/// Parse the request body, treating an empty body as `{}`.
fn parse_body(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Malformed intake body");
        AppError::BadRequest("Invalid JSON body".to_string())
    })
}
