// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests across the gateway, routing engine, ledger and live bus.
//!
//! Each test builds an isolated TestHarness with a temp SQLite ledger and a
//! mock carrier. Webhook signature checks are disabled here; the gateway
//! crate covers them.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use switchboard_bus::{LiveUpdate, TenantSubscription};
use switchboard_core::{CallStatus, MessageStatus, TenantId};
use switchboard_gateway::{GatewayState, SessionAuth, build_router};
use switchboard_test_utils::{TestHarness, voice_and_sms};

async fn setup() -> (TestHarness, Router) {
    let harness = TestHarness::builder()
        .with_config(|c| c.carrier.validate_signatures = false)
        .build()
        .await
        .unwrap();
    harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();
    let state = GatewayState::new(
        &harness.config,
        harness.storage.clone(),
        Arc::new(harness.carrier.clone()),
        harness.bus.clone(),
    );
    (harness, build_router(state))
}

async fn post_form(app: &Router, path: &str, params: &[(&str, &str)]) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(serde_urlencoded::to_string(params).unwrap()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn api(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let token = SessionAuth::new(Some("test-session-secret".into()))
        .issue(&TenantId::parse("T1").unwrap(), 300)
        .unwrap();
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let body = body.map(|v| Body::from(v.to_string())).unwrap_or_else(Body::empty);
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn next_update(sub: &mut TenantSubscription) -> Arc<LiveUpdate> {
    tokio::time::timeout(Duration::from_secs(2), sub.next())
        .await
        .expect("live update within 2s")
        .expect("bus open")
}

// ---- Outbound call placed from the API ----

#[tokio::test]
async fn api_call_lifecycle_reaches_live_subscribers() {
    let (harness, app) = setup().await;
    let mut live = harness.bus.subscribe(TenantId::parse("T1").unwrap());

    let (status, created) = api(
        &app,
        Method::POST,
        "/v1/calls",
        Some(json!({"to": "+15559998888"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let call_sid = created["callId"].as_str().unwrap().to_string();

    let first = next_update(&mut live).await;
    assert_eq!(first.kind(), "call.inserted");

    // The carrier fetches the answer URL once the far end picks up.
    let (_, twiml) = post_form(
        &app,
        "/webhooks/voice/bridge",
        &[("CallSid", call_sid.as_str())],
    )
    .await;
    assert!(twiml.contains("<Client>user_T1</Client>"), "{twiml}");

    // Callbacks arrive out of order.
    for (status, duration) in [
        ("completed", Some("30")),
        ("ringing", None),
        ("in-progress", None),
    ] {
        let mut params = vec![("CallSid", call_sid.as_str()), ("CallStatus", status)];
        if let Some(d) = duration {
            params.push(("CallDuration", d));
        }
        let (code, body) = post_form(&app, "/webhooks/voice/status", &params).await;
        assert_eq!(code, StatusCode::OK);
        assert!(body.is_empty());
    }

    let update = next_update(&mut live).await;
    match update.as_ref() {
        LiveUpdate::CallUpdated(record) => {
            assert_eq!(record.status, CallStatus::Completed);
            assert_eq!(record.duration_secs, Some(30));
        }
        other => panic!("unexpected update {other:?}"),
    }
    // Stale callbacks publish nothing.
    assert!(
        tokio::time::timeout(Duration::from_millis(200), live.next())
            .await
            .is_err()
    );

    let record = harness.storage.get_call(&call_sid).await.unwrap().unwrap();
    assert_eq!(record.status, CallStatus::Completed);
    assert_eq!(record.duration_secs, Some(30));
}

// ---- Inbound call to voicemail ----

#[tokio::test]
async fn unanswered_inbound_call_leaves_voicemail() {
    let (harness, app) = setup().await;

    let (_, twiml) = post_form(
        &app,
        "/webhooks/voice",
        &[
            ("CallSid", "CA900"),
            ("From", "+15559998888"),
            ("To", "+15551234567"),
            ("CallStatus", "ringing"),
        ],
    )
    .await;
    assert!(twiml.contains("<Client>user_T1</Client>"), "{twiml}");
    assert!(twiml.contains("dial-status?leg=inbound"), "{twiml}");
    assert!(!twiml.contains("<Record"), "{twiml}");

    // The browser never picks up; the dial callback starts voicemail.
    let (_, prompt) = post_form(
        &app,
        "/webhooks/voice/dial-status?leg=inbound",
        &[("CallSid", "CA900"), ("DialCallStatus", "no-answer")],
    )
    .await;
    assert!(prompt.contains("<Record "), "{prompt}");

    let (_, goodbye) = post_form(
        &app,
        "/webhooks/voice/recording",
        &[
            ("CallSid", "CA900"),
            ("RecordingUrl", "https://api.twilio.com/rec/RE1"),
            ("RecordingSid", "RE1"),
        ],
    )
    .await;
    assert!(goodbye.contains("<Hangup/>"), "{goodbye}");

    // A later status without a recording keeps the stored URL.
    post_form(
        &app,
        "/webhooks/voice/status",
        &[("CallSid", "CA900"), ("CallStatus", "completed"), ("CallDuration", "12")],
    )
    .await;

    let (_, calls) = api(&app, Method::GET, "/v1/calls", None).await;
    assert_eq!(calls[0]["callSid"], "CA900");
    assert_eq!(calls[0]["direction"], "inbound");
    assert_eq!(calls[0]["status"], "completed");
    assert_eq!(calls[0]["recordingUrl"], "https://api.twilio.com/rec/RE1");

    let record = harness.storage.get_call("CA900").await.unwrap().unwrap();
    assert_eq!(record.duration_secs, Some(12));
}

// ---- Inbound call answered in the browser ----

#[tokio::test]
async fn answered_inbound_call_ends_without_voicemail() {
    let (harness, app) = setup().await;

    post_form(
        &app,
        "/webhooks/voice",
        &[
            ("CallSid", "CA950"),
            ("From", "+15559998888"),
            ("To", "+15551234567"),
            ("CallStatus", "ringing"),
        ],
    )
    .await;

    // The browser answered and hung up first.
    let (code, after) = post_form(
        &app,
        "/webhooks/voice/dial-status?leg=inbound",
        &[("CallSid", "CA950"), ("DialCallStatus", "completed")],
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert!(!after.contains("<Record"), "{after}");
    assert!(!after.contains("<Say"), "{after}");

    post_form(
        &app,
        "/webhooks/voice/status",
        &[("CallSid", "CA950"), ("CallStatus", "completed"), ("CallDuration", "95")],
    )
    .await;
    let record = harness.storage.get_call("CA950").await.unwrap().unwrap();
    assert_eq!(record.status, CallStatus::Completed);
    assert_eq!(record.recording_url, None);
}

// ---- Messaging round trip ----

#[tokio::test]
async fn message_round_trip_with_delivery_receipts() {
    let (harness, app) = setup().await;
    let mut live = harness.bus.subscribe(TenantId::parse("T1").unwrap());
    let mut other = harness.bus.subscribe(TenantId::parse("T2").unwrap());

    let (status, sent) = api(
        &app,
        Method::POST,
        "/v1/messages",
        Some(json!({"to": "+15559998888", "body": "on my way"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_sid = sent["messageId"].as_str().unwrap().to_string();
    assert_eq!(next_update(&mut live).await.kind(), "message.inserted");

    // Delivered arrives before sent.
    for status in ["delivered", "sent"] {
        let (code, _) = post_form(
            &app,
            "/webhooks/sms/status",
            &[("MessageSid", message_sid.as_str()), ("MessageStatus", status)],
        )
        .await;
        assert_eq!(code, StatusCode::OK);
    }
    match next_update(&mut live).await.as_ref() {
        LiveUpdate::MessageUpdated(record) => {
            assert_eq!(record.status, MessageStatus::Delivered);
        }
        other => panic!("unexpected update {other:?}"),
    }

    // The reply lands in the same conversation.
    post_form(
        &app,
        "/webhooks/sms",
        &[
            ("MessageSid", "SM901"),
            ("From", "+15559998888"),
            ("To", "+15551234567"),
            ("Body", "see you soon"),
            ("SmsStatus", "received"),
        ],
    )
    .await;
    assert_eq!(next_update(&mut live).await.kind(), "message.inserted");

    let (_, conversations) = api(&app, Method::GET, "/v1/conversations", None).await;
    assert_eq!(conversations.as_array().unwrap().len(), 1);
    assert_eq!(conversations[0]["messageCount"], 2);
    assert_eq!(conversations[0]["lastMessage"], "see you soon");
    assert_eq!(conversations[0]["unreadCount"], 1);

    // Nothing leaked to the other tenant.
    assert!(
        tokio::time::timeout(Duration::from_millis(100), other.next())
            .await
            .is_err()
    );
}

// ---- Configuration ----

#[test]
fn inline_config_satisfies_serve_requirements() {
    let config = switchboard_config::load_and_validate_str(
        r#"
[server]
public_base_url = "https://sb.example.com"
io_timeout_ms = 3000

[carrier]
account_sid = "ACtest"
auth_token = "tok"

[auth]
session_secret = "s"
"#,
    )
    .unwrap();
    assert_eq!(config.server.io_timeout_ms, 3000);
    assert!(switchboard_config::validate_serve_requirements(&config).is_ok());
}
