//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client with a `{"error": "..."}` body.

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::airtable::AirtableError;
use crate::shopify::ShopifyError;

/// Message returned for failures whose detail stays in the logs.
const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Application-level error type for the relay.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify Admin API call failed.
    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    /// Airtable API call failed.
    #[error(transparent)]
    Airtable(#[from] AirtableError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request origin is not allowed to use this endpoint.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// HTTP method not supported by the endpoint.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Request body could not be buffered (too large or interrupted).
    #[error("Unreadable body: {0}")]
    Body(#[from] BytesRejection),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Body(rejection) => rejection.status(),
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Shopify(_) | Self::Airtable(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the caller.
    ///
    /// Upstream rejections carry the upstream status and body so a person can
    /// reconcile by hand; transport and internal failures do not.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Shopify(err @ ShopifyError::Api { .. }) => err.to_string(),
            Self::Airtable(err @ AirtableError::Api { .. }) => err.to_string(),
            Self::Shopify(_) | Self::Airtable(_) | Self::Internal(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
            Self::BadRequest(msg) | Self::Forbidden(msg) => msg.clone(),
            Self::MethodNotAllowed => self.to_string(),
            Self::Body(rejection) => rejection.body_text(),
        }
    }

    /// Log the error, and capture it to Sentry if it is a server error.
    pub fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        let body = ErrorBody {
            error: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
