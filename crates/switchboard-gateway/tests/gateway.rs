// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP-level tests for the gateway: signed carrier webhooks and the
//! tenant API, driven through the router without binding a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use switchboard_carrier::{SIGNATURE_HEADER, compute_signature};
use switchboard_core::{CallStatus, Direction, StorageAdapter, SwitchboardError, TenantId};
use switchboard_gateway::{GatewayState, SessionAuth, build_router};
use switchboard_test_utils::{FaultyStorage, TestHarness, voice_and_sms, voice_only};

const BASE_URL: &str = "https://sb.example.com";
const AUTH_TOKEN: &str = "test-auth-token";

struct Gateway {
    app: Router,
    harness: TestHarness,
}

impl Gateway {
    async fn new() -> Self {
        Self::from_harness(TestHarness::new().await.unwrap())
    }

    fn from_harness(harness: TestHarness) -> Self {
        let state = GatewayState::new(
            &harness.config,
            harness.storage.clone(),
            Arc::new(harness.carrier.clone()),
            harness.bus.clone(),
        );
        Self {
            app: build_router(state),
            harness,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn webhook(&self, path: &str, params: &[(&str, &str)]) -> (StatusCode, String) {
        self.send(signed(path, params)).await
    }

    async fn api(
        &self,
        method: Method,
        path: &str,
        tenant: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = session_token(tenant);
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let (status, text) = self.send(builder.body(body).unwrap()).await;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, value)
    }
}

fn session_token(tenant: &str) -> String {
    SessionAuth::new(Some("test-session-secret".into()))
        .issue(&TenantId::parse(tenant).unwrap(), 300)
        .unwrap()
}

fn signed(path: &str, params: &[(&str, &str)]) -> Request<Body> {
    let owned: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let signature = compute_signature(AUTH_TOKEN, &format!("{BASE_URL}{path}"), &owned).unwrap();
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(serde_urlencoded::to_string(params).unwrap()))
        .unwrap()
}

/// Gateway over a ledger that stalls for 300ms with a 50ms I/O budget.
async fn stalled_gateway() -> Gateway {
    let harness = TestHarness::builder()
        .with_config(|c| c.server.io_timeout_ms = 50)
        .build()
        .await
        .unwrap();
    harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();
    let storage: Arc<dyn StorageAdapter> = Arc::new(
        FaultyStorage::new(harness.storage.clone()).stall_for(Duration::from_millis(300)),
    );
    let state = GatewayState::new(
        &harness.config,
        storage,
        Arc::new(harness.carrier.clone()),
        harness.bus.clone(),
    );
    Gateway {
        app: build_router(state),
        harness,
    }
}

// --- webhooks ---

#[tokio::test]
async fn unsigned_webhook_is_forbidden() {
    let gw = Gateway::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/voice")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("CallSid=CA1&From=%2B15559998888&To=%2B15551234567"))
        .unwrap();
    let (status, _) = gw.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn signature_over_other_params_is_forbidden() {
    let gw = Gateway::new().await;
    let mut request = signed("/webhooks/voice", &[("CallSid", "CA1"), ("To", "+15551234567")]);
    *request.body_mut() = Body::from("CallSid=CA1&To=%2B15550000000");
    let (status, _) = gw.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn disabled_validation_accepts_unsigned_webhooks() {
    let harness = TestHarness::builder()
        .with_config(|c| c.carrier.validate_signatures = false)
        .build()
        .await
        .unwrap();
    let gw = Gateway::from_harness(harness);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/voice/status")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("CallSid=CA1&CallStatus=completed"))
        .unwrap();
    let (status, _) = gw.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn inbound_call_dials_tenant_client_with_voicemail() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();

    let (status, body) = gw
        .webhook(
            "/webhooks/voice",
            &[
                ("CallSid", "CA100"),
                ("From", "+15559998888"),
                ("To", "+15551234567"),
                ("CallStatus", "ringing"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body.contains(
            r#"<Dial timeout="20" action="https://sb.example.com/webhooks/voice/dial-status?leg=inbound"><Client>user_T1</Client></Dial></Response>"#
        ),
        "{body}"
    );
    // Voicemail waits for the dial callback.
    assert!(!body.contains("<Record"), "{body}");

    let call = gw.harness.storage.get_call("CA100").await.unwrap().unwrap();
    assert_eq!(call.tenant_id, "T1");
    assert_eq!(call.direction, Direction::Inbound);
    assert_eq!(call.status, CallStatus::Ringing);
}

#[tokio::test]
async fn browser_call_dials_pstn_from_tenant_number() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_only())
        .await
        .unwrap();

    let (status, body) = gw
        .webhook(
            "/webhooks/voice",
            &[
                ("CallSid", "CA200"),
                ("From", "client:user_T1"),
                ("To", "+15559998888"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"callerId="+15551234567""#), "{body}");
    assert!(body.contains(">+15559998888</Number>"), "{body}");
}

#[tokio::test]
async fn browser_call_without_voice_number_is_spoken_reject() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .webhook(
            "/webhooks/voice",
            &[
                ("CallSid", "CA300"),
                ("From", "client:user_T2"),
                ("To", "+15559998888"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Say"), "{body}");
    assert!(body.contains("<Hangup/>"), "{body}");
    assert!(!body.contains("<Dial"), "{body}");
    assert!(gw.harness.storage.get_call("CA300").await.unwrap().is_none());
}

#[tokio::test]
async fn late_in_progress_does_not_regress_completed_call() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();
    let status_path = "/webhooks/voice/status";
    let base = [("CallSid", "CA400"), ("From", "+15559998888"), ("To", "+15551234567")];

    let mut completed = base.to_vec();
    completed.extend([("CallStatus", "completed"), ("CallDuration", "45")]);
    let (status, body) = gw.webhook(status_path, &completed).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let mut late = base.to_vec();
    late.push(("CallStatus", "in-progress"));
    let (status, _) = gw.webhook(status_path, &late).await;
    assert_eq!(status, StatusCode::OK);

    let (status, calls) = gw.api(Method::GET, "/v1/calls", "T1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.as_array().unwrap().len(), 1);
    assert_eq!(calls[0]["status"], "completed");
    assert_eq!(calls[0]["durationSecs"], 45);
}

#[tokio::test]
async fn status_for_unknown_call_is_still_acknowledged() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .webhook(
            "/webhooks/voice/status",
            &[("CallSid", "CA404"), ("CallStatus", "completed")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(gw.harness.storage.get_call("CA404").await.unwrap().is_none());
}

#[tokio::test]
async fn sms_to_unregistered_number_is_acknowledged_without_insert() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();

    let (status, body) = gw
        .webhook(
            "/webhooks/sms",
            &[
                ("MessageSid", "SM500"),
                ("From", "+15559998888"),
                ("To", "+15550001111"),
                ("Body", "hello?"),
                ("SmsStatus", "received"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("<Response/>"), "{body}");
    let t1 = TenantId::parse("T1").unwrap();
    assert!(gw.harness.storage.list_messages(&t1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn inbound_sms_appears_in_conversation_until_read() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();
    gw.webhook(
        "/webhooks/sms",
        &[
            ("MessageSid", "SM600"),
            ("From", "+15559998888"),
            ("To", "+15551234567"),
            ("Body", "are you there"),
            ("SmsStatus", "received"),
        ],
    )
    .await;

    let (_, conversations) = gw.api(Method::GET, "/v1/conversations", "T1", None).await;
    assert_eq!(conversations[0]["counterpart"], "+15559998888");
    assert_eq!(conversations[0]["lastMessage"], "are you there");
    assert_eq!(conversations[0]["unreadCount"], 1);

    let (status, read) = gw
        .api(
            Method::POST,
            "/v1/conversations/+15559998888/read",
            "T1",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["updated"], 1);

    let (_, thread) = gw
        .api(Method::GET, "/v1/conversations/+15559998888", "T1", None)
        .await;
    assert_eq!(thread[0]["messageSid"], "SM600");
    assert_eq!(thread[0]["isRead"], true);

    // Another tenant sees nothing.
    let (_, other) = gw.api(Method::GET, "/v1/conversations", "T2", None).await;
    assert!(other.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dial_status_busy_apologizes() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .webhook(
            "/webhooks/voice/dial-status?leg=outbound",
            &[("CallSid", "CA700"), ("DialCallStatus", "busy")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Say"), "{body}");
    assert!(!body.contains("<Record"), "{body}");

    let (_, body) = gw
        .webhook(
            "/webhooks/voice/dial-status?leg=outbound",
            &[("CallSid", "CA700"), ("DialCallStatus", "completed")],
        )
        .await;
    assert!(body.ends_with("<Response/>"), "{body}");
}

#[tokio::test]
async fn unanswered_inbound_dial_falls_back_to_voicemail() {
    let gw = Gateway::new().await;
    for outcome in ["no-answer", "busy", "failed"] {
        let (status, body) = gw
            .webhook(
                "/webhooks/voice/dial-status?leg=inbound",
                &[("CallSid", "CA710"), ("DialCallStatus", outcome)],
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<Record "), "{outcome}: {body}");
        assert!(body.contains("/webhooks/voice/recording"), "{body}");
    }
}

#[tokio::test]
async fn answered_inbound_dial_never_records() {
    let gw = Gateway::new().await;
    for outcome in ["completed", "answered", "canceled"] {
        let (status, body) = gw
            .webhook(
                "/webhooks/voice/dial-status?leg=inbound",
                &[("CallSid", "CA720"), ("DialCallStatus", outcome)],
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("<Record"), "{outcome}: {body}");
        assert!(body.ends_with("<Response/>"), "{body}");
    }
}

#[tokio::test]
async fn bridge_for_unknown_call_is_rejected() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .webhook("/webhooks/voice/bridge", &[("CallSid", "CA800")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Hangup/>"), "{body}");
}

#[tokio::test]
async fn stalled_routing_answers_with_static_reject() {
    let gw = stalled_gateway().await;
    let (status, body) = gw
        .webhook(
            "/webhooks/voice",
            &[
                ("CallSid", "CA60"),
                ("From", "+15559998888"),
                ("To", "+15551234567"),
                ("CallStatus", "ringing"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, switchboard_markup::static_reject());
}

#[tokio::test]
async fn stalled_status_callback_still_acknowledges() {
    let gw = stalled_gateway().await;
    let (status, body) = gw
        .webhook(
            "/webhooks/voice/status",
            &[("CallSid", "CA61"), ("CallStatus", "completed")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert!(gw.harness.storage.get_call("CA61").await.unwrap().is_none());
}

// --- api ---

#[tokio::test]
async fn api_requires_bearer_token() {
    let gw = Gateway::new().await;
    let request = Request::builder()
        .uri("/v1/calls")
        .body(Body::empty())
        .unwrap();
    let (status, body) = gw.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn sending_from_voice_only_number_is_denied() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_only())
        .await
        .unwrap();

    let (status, body) = gw
        .api(
            Method::POST,
            "/v1/messages",
            "T1",
            Some(json!({"to": "+15559998888", "body": "hi", "from": "+15551234567"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "capability_denied");
    assert!(body["error"]["suggestion"].is_string());
    assert!(gw.harness.carrier.sent_messages().await.is_empty());
}

#[tokio::test]
async fn send_message_returns_created() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();

    let (status, body) = gw
        .api(
            Method::POST,
            "/v1/messages",
            "T1",
            Some(json!({"to": "+15559998888", "body": "hello"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["messageId"], "SMmock0001");
    assert_eq!(body["status"], "queued");

    let (_, messages) = gw.api(Method::GET, "/v1/messages", "T1", None).await;
    assert_eq!(messages[0]["direction"], "outbound");
    assert_eq!(messages[0]["body"], "hello");
}

#[tokio::test]
async fn initiate_call_returns_created() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_only())
        .await
        .unwrap();

    let (status, body) = gw
        .api(
            Method::POST,
            "/v1/calls",
            "T1",
            Some(json!({"to": "+15559998888"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["callId"], "CAmock0001");
    assert_eq!(body["status"], "queued");

    let placed = gw.harness.carrier.placed_calls().await;
    assert_eq!(placed[0].from, "+15551234567");
    assert!(placed[0].answer_url.starts_with(BASE_URL));
}

#[tokio::test]
async fn call_without_voice_number_is_unprocessable() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .api(
            Method::POST,
            "/v1/calls",
            "T2",
            Some(json!({"to": "+15559998888"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "no_capable_number");
}

#[tokio::test]
async fn carrier_outage_maps_to_bad_gateway() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();
    gw.harness
        .carrier
        .fail_next(SwitchboardError::upstream("carrier returned 500"))
        .await;

    let (status, body) = gw
        .api(
            Method::POST,
            "/v1/messages",
            "T1",
            Some(json!({"to": "+15559998888", "body": "hello"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "upstream_unavailable");
}

#[tokio::test]
async fn grant_fails_closed_without_api_key() {
    let gw = Gateway::new().await;
    let (status, body) = gw.api(Method::POST, "/v1/grants", "T1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "configuration_error");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn grant_carries_tenant_identity() {
    let harness = TestHarness::builder()
        .with_config(|c| {
            c.grant.api_key_sid = Some("SKtest".into());
            c.grant.api_key_secret = Some("grant-secret".into());
            c.grant.voice_application_sid = Some("APtest".into());
        })
        .build()
        .await
        .unwrap();
    let gw = Gateway::from_harness(harness);

    let (status, body) = gw.api(Method::POST, "/v1/grants", "T1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"], "user_T1");
    assert!(body["token"].as_str().unwrap().split('.').count() == 3);
    assert!(body["expiresAt"].is_string());
}

#[tokio::test]
async fn numbers_can_be_registered_listed_and_released() {
    let gw = Gateway::new().await;
    let (status, created) = gw
        .api(
            Method::POST,
            "/v1/numbers",
            "T1",
            Some(json!({
                "number": "+15551234567",
                "capabilities": {"voice": true, "sms": true},
                "carrierSid": "PN1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "active");

    let (_, listed) = gw.api(Method::GET, "/v1/numbers", "T1", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Another tenant cannot release it.
    let (status, _) = gw
        .api(Method::DELETE, "/v1/numbers/+15551234567", "T2", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, released) = gw
        .api(Method::DELETE, "/v1/numbers/+15551234567", "T1", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(released["status"], "released");
}

#[tokio::test]
async fn invalid_number_is_bad_request() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .api(
            Method::POST,
            "/v1/numbers",
            "T1",
            Some(json!({"number": "555-1234", "capabilities": {"voice": true}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn stats_count_this_month() {
    let gw = Gateway::new().await;
    gw.harness
        .register_number("T1", "+15551234567", voice_and_sms())
        .await
        .unwrap();
    gw.api(
        Method::POST,
        "/v1/messages",
        "T1",
        Some(json!({"to": "+15559998888", "body": "hello"})),
    )
    .await;

    let (status, stats) = gw.api(Method::GET, "/v1/stats", "T1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["callsThisMonth"], 0);
    assert_eq!(stats["messagesThisMonth"], 1);
    assert_eq!(stats["activeNumbers"], 1);
}

#[tokio::test]
async fn health_is_public() {
    let gw = Gateway::new().await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = gw.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn metrics_absent_without_exporter() {
    let gw = Gateway::new().await;
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _) = gw.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
