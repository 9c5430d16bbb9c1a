//! Origin checks and CORS response headers for the intake endpoint.
//!
//! The allowed origin is echoed back verbatim; there is no wildcard. A
//! missing or unknown origin never receives `Access-Control-Allow-Origin`,
//! whatever the [`OriginPolicy`](crate::config::OriginPolicy) says about
//! processing the request.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ORIGIN, VARY,
    },
};
use axum::response::Response;

use crate::config::CorsConfig;

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// Outcome of checking a request's `Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    allow_origin: Option<HeaderValue>,
}

impl CorsDecision {
    /// Check the request's `Origin` header against the allow-list.
    #[must_use]
    pub fn evaluate(config: &CorsConfig, headers: &HeaderMap) -> Self {
        let allow_origin = headers
            .get(ORIGIN)
            .filter(|value| value.to_str().is_ok_and(|origin| config.allows(origin)))
            .cloned();

        Self { allow_origin }
    }

    /// Returns `true` if the request came from an allowed origin.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        self.allow_origin.is_some()
    }

    /// Add the CORS headers to a response.
    pub fn apply(&self, response: &mut Response) {
        let headers = response.headers_mut();

        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        // Responses differ by origin, so shared caches must key on it
        headers.append(VARY, HeaderValue::from_static("Origin"));

        if let Some(origin) = &self.allow_origin {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
    }
}
