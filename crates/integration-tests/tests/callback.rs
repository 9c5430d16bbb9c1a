//! Airtable webhook, driven through the full router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use draft_relay::config::OriginPolicy;
use draft_relay::shopify::{DraftOrderUpdate, SuppliedLineItem, UPDATE_NOTE};
use draft_relay_core::DraftOrderId;
use draft_relay_integration_tests::{
    Call, CallLog, FakeAirtable, FakeShopify, Rejection, TestApp,
};
use serde_json::{Value, json};

fn id(n: u64) -> DraftOrderId {
    DraftOrderId::new(n).unwrap()
}

fn items(value: Value) -> Vec<SuppliedLineItem> {
    serde_json::from_value(value).unwrap()
}

fn app_with(shopify: impl FnOnce(FakeShopify) -> FakeShopify) -> TestApp {
    let log = CallLog::default();
    TestApp::with_fakes(
        OriginPolicy::Strict,
        shopify(FakeShopify::new(log.clone())),
        FakeAirtable::new(log.clone()),
        log,
    )
}

#[tokio::test]
async fn test_updated_status_pushes_line_items() {
    let app = TestApp::new();

    let response = app
        .callback(
            r#"{"draftOrderId": 555, "status": "updated",
                "lineItems": [{"variant_id": 101, "quantity": 2}, {"variant_id": 202}]}"#,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"success": true}));
    assert_eq!(
        app.log.calls(),
        vec![Call::UpdateDraftOrder(DraftOrderUpdate {
            id: id(555),
            line_items: Some(items(json!([
                {"variant_id": 101, "quantity": 2},
                {"variant_id": 202}
            ]))),
            note: UPDATE_NOTE.to_string(),
        })]
    );
}

#[tokio::test]
async fn test_supplied_line_items_are_forwarded_unchanged() {
    let app = TestApp::new();
    let supplied = json!([
        {
            "variant_id": 5,
            "quantity": 2,
            "price": "9.99",
            "properties": [{"name": "Engraving", "value": "A.L."}]
        },
        {"title": "Custom cart", "price": "10.00", "quantity": 1},
        {"variant_id": "6", "applied_discount": {"value": "5.0", "value_type": "percentage"}}
    ]);

    let response = app
        .callback(
            &json!({"draftOrderId": 555, "status": "updated", "lineItems": supplied.clone()}).to_string(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        app.log.calls(),
        vec![Call::UpdateDraftOrder(DraftOrderUpdate::new(
            id(555),
            Some(items(supplied))
        ))]
    );
}

#[tokio::test]
async fn test_non_object_line_item_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .callback(r#"{"draftOrderId": 555, "status": "updated", "lineItems": [101]}"#)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_update_without_line_items_leaves_items_alone() {
    let app = TestApp::new();

    let response = app
        .callback(r#"{"draftOrderId": "555", "status": "updated"}"#)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        app.log.calls(),
        vec![Call::UpdateDraftOrder(DraftOrderUpdate::new(id(555), None))]
    );
}

#[tokio::test]
async fn test_paid_completes_the_draft_order() {
    let app = TestApp::new();

    let response = app.callback(r#"{"draftOrderId": 555, "paid": true}"#).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.log.calls(), vec![Call::CompleteDraftOrder(id(555))]);
}

#[tokio::test]
async fn test_update_happens_before_completion() {
    let app = TestApp::new();

    let response = app
        .callback(
            r#"{"draftOrderId": 555, "status": "updated", "paid": true,
                "lineItems": [{"variant_id": 7}]}"#,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        app.log.calls(),
        vec![
            Call::UpdateDraftOrder(DraftOrderUpdate::new(
                id(555),
                Some(items(json!([{"variant_id": 7}]))),
            )),
            Call::CompleteDraftOrder(id(555)),
        ]
    );
}

#[tokio::test]
async fn test_no_actionable_change_is_acknowledged() {
    let app = TestApp::new();

    let response = app
        .callback(r#"{"draftOrderId": 555, "status": "pending", "paid": false}"#)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"success": true}));
    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_missing_draft_order_id_is_bad_request() {
    let app = TestApp::new();

    for body in [
        r#"{"status": "updated", "paid": true}"#,
        r#"{"draftOrderId": null, "paid": true}"#,
        r#"{"draftOrderId": "", "paid": true}"#,
    ] {
        let response = app.callback(body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.body, json!({"error": "draftOrderId is required"}));
    }

    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_draft_order_id_is_bad_request() {
    let app = TestApp::new();

    for body in [
        r#"{"draftOrderId": "abc", "paid": true}"#,
        r#"{"draftOrderId": 0, "paid": true}"#,
        r#"{"draftOrderId": -5, "paid": true}"#,
    ] {
        let response = app.callback(body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
    }

    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_empty_or_malformed_body_is_bad_request() {
    let app = TestApp::new();

    let empty = app.callback("").await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body, json!({"error": "Request body is required"}));

    let malformed = app.callback("{not json").await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn test_legacy_draft_id_and_gid_are_accepted() {
    let app = TestApp::new();

    let legacy = app.callback(r#"{"draftId": 42, "paid": true}"#).await;
    assert_eq!(legacy.status, StatusCode::OK);

    let gid = app
        .callback(r#"{"draftOrderId": "gid://shopify/DraftOrder/43", "paid": true}"#)
        .await;
    assert_eq!(gid.status, StatusCode::OK);

    assert_eq!(
        app.log.calls(),
        vec![
            Call::CompleteDraftOrder(id(42)),
            Call::CompleteDraftOrder(id(43)),
        ]
    );
}

#[tokio::test]
async fn test_update_failure_is_server_error_and_skips_completion() {
    let app = app_with(|s| s.failing_update(Rejection::new(404, r#"{"errors":"Not Found"}"#)));

    let response = app
        .callback(r#"{"draftOrderId": 555, "status": "updated", "paid": true}"#)
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.body["error"].as_str().unwrap();
    assert!(error.contains("404"), "error was {error}");
    assert_eq!(response.body.as_object().unwrap().len(), 1);
    assert_eq!(
        app.log.calls(),
        vec![Call::UpdateDraftOrder(DraftOrderUpdate::new(id(555), None))]
    );
}

#[tokio::test]
async fn test_completion_failure_keeps_the_update() {
    let app = app_with(|s| s.failing_complete(Rejection::new(422, "already completed")));

    let response = app
        .callback(r#"{"draftOrderId": 555, "status": "updated", "paid": true}"#)
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        response.body["error"]
            .as_str()
            .unwrap()
            .contains("already completed")
    );
    assert_eq!(app.log.calls().len(), 2);
}

#[tokio::test]
async fn test_webhook_does_not_touch_the_record_store() {
    let app = TestApp::new();

    app.callback(r#"{"draftOrderId": 555, "status": "updated", "paid": true}"#)
        .await;

    assert!(
        !app.log
            .calls()
            .iter()
            .any(|call| matches!(call, Call::CreateRecord(_)))
    );
}
