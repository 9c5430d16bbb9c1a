//! HTTP middleware stack for the relay.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! CORS is decided per request by the intake handler, since the origin
//! policy can turn into a 403 rather than just a missing header.

pub mod cors;
pub mod request_id;

pub use cors::CorsDecision;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
