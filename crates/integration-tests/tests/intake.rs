//! Order form intake, driven through the full router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{StatusCode, header};
use draft_relay::config::OriginPolicy;
use draft_relay_core::{DRAFT_ORDER_ID_FIELD, LineItem};
use draft_relay_integration_tests::{
    ALLOWED_ORIGIN, Call, CallLog, FakeAirtable, FakeShopify, Rejection, TestApp, intake_request,
};
use serde_json::{Value, json};

fn only_record(calls: &[Call]) -> &draft_relay_core::Record {
    match calls {
        [Call::CreateRecord(record)] => record,
        other => panic!("expected a single record write, got {other:?}"),
    }
}

#[tokio::test]
async fn test_only_allow_listed_fields_reach_the_record() {
    let app = TestApp::new();

    let response = app
        .submit(&json!({
            "First": "Ada",
            "Last": "Lovelace",
            "Email": "ada@example.com",
            "Is Admin": "yes",
            "__proto__": "x",
            "product_title": "Cake"
        }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let calls = app.log.calls();
    let record = only_record(&calls);
    assert_eq!(
        record.columns().collect::<Vec<_>>(),
        vec!["Email", "First", "Last"]
    );
    assert!(record.get("Is Admin").is_none());
    assert!(record.get("product_title").is_none());
    assert!(record.get(DRAFT_ORDER_ID_FIELD).is_none());
}

#[tokio::test]
async fn test_markup_is_stripped_before_leaving_the_relay() {
    let app = TestApp::new();

    let response = app
        .submit(&json!({
            "First": "<script>alert(1)</script>Bob",
            "Delivery Address": "<b>1 Main St</b>",
            "variant_id": "101"
        }))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let calls = app.log.calls();
    let [Call::CreateDraftOrder(order), Call::CreateRecord(record)] = calls.as_slice() else {
        panic!("unexpected calls: {calls:?}");
    };

    assert_eq!(record.get("First"), Some(&json!("Bob")));
    assert_eq!(order.customer.first_name.as_deref(), Some("Bob"));
    assert_eq!(order.shipping_address.address1.as_deref(), Some("<b>1 Main St</b>"));

    for call in &calls {
        let debug = format!("{call:?}");
        assert!(!debug.contains("<script"), "script tag leaked in {debug}");
    }
}

#[tokio::test]
async fn test_nothing_usable_is_rejected_without_upstream_calls() {
    let app = TestApp::new();

    for body in [
        json!({}),
        json!({"Is Admin": "yes"}),
        json!({"First": "<script>x</script>"}),
        json!({"First": null, "Email": true}),
    ] {
        let response = app.submit(&body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(response.body, json!({"error": "No valid fields provided."}));
    }

    let empty = app
        .send(intake_request("POST", Some(ALLOWED_ORIGIN), ""))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .send(intake_request("POST", Some(ALLOWED_ORIGIN), "{\"First\":"))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({"error": "Invalid JSON body"}));
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_no_variants_skips_the_draft_order() {
    let app = TestApp::new();

    let response = app
        .submit(&json!({"First": "Ada", "variant_id": " , "}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["shopifyDraftOrderId"], Value::Null);
    assert_eq!(response.body["message"], "Submission received");
    assert!(matches!(app.log.calls().as_slice(), [Call::CreateRecord(_)]));
}

#[tokio::test]
async fn test_variant_list_becomes_line_items() {
    let app = TestApp::new();

    let response = app
        .submit(&json!({"Email": "a@b.c", "variant_id": "101, 202,303"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let calls = app.log.calls();
    let Some(Call::CreateDraftOrder(order)) = calls.first() else {
        panic!("expected a draft order first, got {calls:?}");
    };
    assert_eq!(
        order.line_items,
        vec![LineItem::new(101), LineItem::new(202), LineItem::new(303)]
    );
    assert_eq!(order.tags.as_deref(), Some("form-submission"));
    assert_eq!(order.email.as_deref(), Some("a@b.c"));
}

#[tokio::test]
async fn test_numeric_variant_becomes_one_line_item() {
    let app = TestApp::new();

    let response = app.submit(&json!({"First": "Ada", "variant_id": 42})).await;
    assert_eq!(response.status, StatusCode::OK);

    let calls = app.log.calls();
    let Some(Call::CreateDraftOrder(order)) = calls.first() else {
        panic!("expected a draft order first, got {calls:?}");
    };
    assert_eq!(order.line_items, vec![LineItem::new(42)]);
}

#[tokio::test]
async fn test_invalid_variant_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .submit(&json!({"First": "Ada", "variant_id": "101,abc"}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_draft_order_id_reaches_record_and_response() {
    let log = CallLog::default();
    let app = TestApp::with_fakes(
        OriginPolicy::Strict,
        FakeShopify::new(log.clone()).returning_id(555),
        FakeAirtable::new(log.clone()),
        log,
    );

    let response = app
        .submit(&json!({"First": "Ada", "variant_id": "101"}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["shopifyDraftOrderId"], json!(555));
    assert_eq!(response.body["airtableResponse"]["records"][0]["id"], "recTEST0001");

    let calls = app.log.calls();
    let [Call::CreateDraftOrder(_), Call::CreateRecord(record)] = calls.as_slice() else {
        panic!("draft order must be created before the record: {calls:?}");
    };
    assert_eq!(record.get(DRAFT_ORDER_ID_FIELD), Some(&json!(555)));
}

#[tokio::test]
async fn test_draft_order_failure_skips_the_record() {
    let log = CallLog::default();
    let app = TestApp::with_fakes(
        OriginPolicy::Strict,
        FakeShopify::new(log.clone())
            .failing_create(Rejection::new(422, r#"{"errors":"bad variant"}"#)),
        FakeAirtable::new(log.clone()),
        log,
    );

    let response = app
        .submit(&json!({"First": "Ada", "variant_id": "101"}))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.body["error"].as_str().unwrap();
    assert!(error.contains("422"), "error was {error}");
    assert_eq!(response.body["shopifyDraftOrderId"], Value::Null);
    assert!(matches!(
        app.log.calls().as_slice(),
        [Call::CreateDraftOrder(_)]
    ));
}

#[tokio::test]
async fn test_record_failure_reports_the_orphaned_draft_order() {
    let log = CallLog::default();
    let app = TestApp::with_fakes(
        OriginPolicy::Strict,
        FakeShopify::new(log.clone()).returning_id(777),
        FakeAirtable::new(log.clone()).failing(Rejection::new(503, "unavailable")),
        log,
    );

    let response = app
        .submit(&json!({"First": "Ada", "variant_id": "101"}))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["shopifyDraftOrderId"], json!(777));
    assert!(
        response.body["error"]
            .as_str()
            .unwrap()
            .contains("Airtable API error: 503")
    );
}

#[tokio::test]
async fn test_preflight_is_no_content_with_cors_headers() {
    let app = TestApp::new();

    let response = app
        .send(intake_request("OPTIONS", Some(ALLOWED_ORIGIN), ""))
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );
    assert_eq!(
        response.headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "POST, OPTIONS"
    );
    assert_eq!(
        response.headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Content-Type"
    );
    assert!(app.log.calls().is_empty());
}

/// Larger than the default body limit used when buffering the request.
fn oversized_body() -> String {
    "x".repeat(3 * 1024 * 1024)
}

#[tokio::test]
async fn test_preflight_ignores_the_body() {
    let app = TestApp::new();

    for body in ["{\"First\":", "not json at all", oversized_body().as_str()] {
        let response = app
            .send(intake_request("OPTIONS", Some(ALLOWED_ORIGIN), body))
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ALLOWED_ORIGIN
        );
    }
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_strict_rejection_does_not_depend_on_body_size() {
    let app = TestApp::new();

    let response = app
        .send(intake_request("POST", Some("https://evil.test"), &oversized_body()))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_body_from_allowed_origin_keeps_cors_headers() {
    let app = TestApp::new();

    let response = app
        .send(intake_request("POST", Some(ALLOWED_ORIGIN), &oversized_body()))
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.body["error"].is_string());
    assert_eq!(
        response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_preflight_from_unknown_origin_gets_no_allow_origin() {
    let app = TestApp::new();

    let response = app
        .send(intake_request("OPTIONS", Some("https://evil.test"), ""))
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let app = TestApp::new();

    for method in ["GET", "PUT", "DELETE"] {
        let response = app
            .send(intake_request(method, Some(ALLOWED_ORIGIN), ""))
            .await;
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(
            response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ALLOWED_ORIGIN
        );
    }
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_strict_policy_forbids_unknown_origins() {
    let app = TestApp::new();
    let body = json!({"First": "Ada"}).to_string();

    let foreign = app
        .send(intake_request("POST", Some("https://evil.test"), &body))
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
    assert!(foreign.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let missing = app.send(intake_request("POST", None, &body)).await;
    assert_eq!(missing.status, StatusCode::FORBIDDEN);

    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_permissive_policy_processes_without_granting_cors() {
    let log = CallLog::default();
    let app = TestApp::with_fakes(
        OriginPolicy::Permissive,
        FakeShopify::new(log.clone()),
        FakeAirtable::new(log.clone()),
        log,
    );

    let response = app
        .send(intake_request(
            "POST",
            Some("https://evil.test"),
            &json!({"First": "Ada"}).to_string(),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(app.log.calls().len(), 1);
}

#[tokio::test]
async fn test_allowed_origin_is_echoed_on_success_and_error() {
    let app = TestApp::new();

    let ok = app.submit(&json!({"First": "Ada"})).await;
    assert_eq!(
        ok.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );

    let bad = app.submit(&json!({})).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        bad.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let app = TestApp::new();

    let response = app.submit(&json!({"First": "Ada"})).await;

    let id = response.headers.get("x-request-id").unwrap();
    assert!(!id.is_empty());
}
