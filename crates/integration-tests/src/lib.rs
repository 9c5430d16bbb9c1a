//! Integration test support for Draft Relay.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p draft-relay-integration-tests
//! ```
//!
//! No network access is needed: router tests use the in-memory collaborators
//! below, and client tests talk to a stub server on `127.0.0.1`.
//!
//! # Test Categories
//!
//! - `intake` - Order form handler, driven through the full router
//! - `callback` - Airtable webhook handler, driven through the full router
//! - `upstream_clients` - Real Shopify/Airtable clients against a local stub

#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use draft_relay::airtable::{AirtableError, RecordStore};
use draft_relay::config::{
    AirtableConfig, CorsConfig, OriginPolicy, RelayConfig, ShopifyConfig,
};
use draft_relay::shopify::{
    DraftOrder, DraftOrderRequest, DraftOrderUpdate, OrderBackend, ShopifyError,
};
use draft_relay::state::AppState;
use draft_relay_core::{DraftOrderId, Record};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Origin allowed by [`test_config`].
pub const ALLOWED_ORIGIN: &str = "https://shop.example.com";

/// One outbound call made by the relay, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateDraftOrder(DraftOrderRequest),
    UpdateDraftOrder(DraftOrderUpdate),
    CompleteDraftOrder(DraftOrderId),
    CreateRecord(Record),
}

/// Shared, ordered log of outbound calls across both fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Snapshot of every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// An upstream rejection a fake should produce.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub status: u16,
    pub body: String,
}

impl Rejection {
    #[must_use]
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// In-memory Shopify that records calls and can be told to fail.
#[derive(Debug, Clone)]
pub struct FakeShopify {
    log: CallLog,
    draft_order_id: u64,
    fail_create: Option<Rejection>,
    fail_update: Option<Rejection>,
    fail_complete: Option<Rejection>,
}

impl FakeShopify {
    #[must_use]
    pub const fn new(log: CallLog) -> Self {
        Self {
            log,
            draft_order_id: 555,
            fail_create: None,
            fail_update: None,
            fail_complete: None,
        }
    }

    #[must_use]
    pub const fn returning_id(mut self, id: u64) -> Self {
        self.draft_order_id = id;
        self
    }

    #[must_use]
    pub fn failing_create(mut self, rejection: Rejection) -> Self {
        self.fail_create = Some(rejection);
        self
    }

    #[must_use]
    pub fn failing_update(mut self, rejection: Rejection) -> Self {
        self.fail_update = Some(rejection);
        self
    }

    #[must_use]
    pub fn failing_complete(mut self, rejection: Rejection) -> Self {
        self.fail_complete = Some(rejection);
        self
    }
}

fn shopify_rejection(rejection: Option<&Rejection>) -> Result<(), ShopifyError> {
    rejection.map_or(Ok(()), |r| {
        Err(ShopifyError::Api {
            status: r.status,
            body: r.body.clone(),
        })
    })
}

#[async_trait]
impl OrderBackend for FakeShopify {
    async fn create_draft_order(
        &self,
        order: &DraftOrderRequest,
    ) -> Result<DraftOrder, ShopifyError> {
        self.log.push(Call::CreateDraftOrder(order.clone()));
        shopify_rejection(self.fail_create.as_ref())?;

        let id = DraftOrderId::new(self.draft_order_id)
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;
        Ok(DraftOrder {
            id,
            name: Some("#D1".to_string()),
            invoice_url: Some(format!("https://shop.test/invoices/{id}")),
            status: Some("open".to_string()),
        })
    }

    async fn update_draft_order(&self, update: &DraftOrderUpdate) -> Result<(), ShopifyError> {
        self.log.push(Call::UpdateDraftOrder(update.clone()));
        shopify_rejection(self.fail_update.as_ref())
    }

    async fn complete_draft_order(&self, id: DraftOrderId) -> Result<(), ShopifyError> {
        self.log.push(Call::CompleteDraftOrder(id));
        shopify_rejection(self.fail_complete.as_ref())
    }
}

/// In-memory Airtable that records calls and can be told to fail.
#[derive(Debug, Clone)]
pub struct FakeAirtable {
    log: CallLog,
    fail: Option<Rejection>,
}

impl FakeAirtable {
    #[must_use]
    pub const fn new(log: CallLog) -> Self {
        Self { log, fail: None }
    }

    #[must_use]
    pub fn failing(mut self, rejection: Rejection) -> Self {
        self.fail = Some(rejection);
        self
    }
}

#[async_trait]
impl RecordStore for FakeAirtable {
    async fn create_record(&self, record: &Record) -> Result<Value, AirtableError> {
        self.log.push(Call::CreateRecord(record.clone()));
        if let Some(r) = &self.fail {
            return Err(AirtableError::Api {
                status: r.status,
                body: r.body.clone(),
            });
        }

        Ok(json!({
            "records": [{
                "id": "recTEST0001",
                "fields": record,
            }]
        }))
    }
}

/// Configuration with one allowed origin and dummy upstream credentials.
#[must_use]
pub fn test_config(policy: OriginPolicy) -> RelayConfig {
    RelayConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        cors: CorsConfig {
            allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
            policy,
        },
        shopify: ShopifyConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2024-07".to_string(),
            access_token: SecretString::from("shpat_test"),
            draft_order_tags: "form-submission".to_string(),
        },
        airtable: AirtableConfig {
            api_url: "https://api.airtable.com/v0".to_string(),
            api_key: SecretString::from("pat_test"),
            base_id: "appTEST".to_string(),
            table_id: "tblTEST".to_string(),
        },
        upstream_timeout: Duration::from_secs(5),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A fully wired router plus the log of its outbound calls.
pub struct TestApp {
    router: Router,
    pub log: CallLog,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, or `Value::Null` when the body is empty.
    pub body: Value,
}

impl TestApp {
    /// Router with well-behaved fakes and the strict origin policy.
    #[must_use]
    pub fn new() -> Self {
        let log = CallLog::default();
        Self::with_fakes(
            OriginPolicy::Strict,
            FakeShopify::new(log.clone()),
            FakeAirtable::new(log.clone()),
            log,
        )
    }

    /// Router with caller-supplied fakes sharing `log`.
    #[must_use]
    pub fn with_fakes(
        policy: OriginPolicy,
        shopify: FakeShopify,
        airtable: FakeAirtable,
        log: CallLog,
    ) -> Self {
        let state =
            AppState::with_backends(test_config(policy), Arc::new(shopify), Arc::new(airtable));
        Self {
            router: draft_relay::app(state),
            log,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body should be readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body should be JSON")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// POST a JSON body to the intake endpoint from the allowed origin.
    pub async fn submit(&self, body: &Value) -> TestResponse {
        self.send(intake_request("POST", Some(ALLOWED_ORIGIN), &body.to_string()))
            .await
    }

    /// POST a JSON body to the webhook endpoint.
    pub async fn callback(&self, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/api/webhooks/airtable")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.send(request).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a request to the intake endpoint.
#[must_use]
pub fn intake_request(method: &str, origin: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/api/order-form")
        .header("content-type", "application/json");
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}
