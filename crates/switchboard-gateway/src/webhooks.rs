// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier webhook handlers.
//!
//! Once a form has parsed, the carrier always gets a 200: a failure after
//! acknowledgment is preferred to an unacknowledged event, because the
//! carrier retries non-200 responses and would repeat side effects. Voice
//! handlers fall back to a static reject document when routing fails or
//! exceeds the I/O budget.

use std::future::Future;
use std::time::Instant;

use axum::Form;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, warn};

use switchboard_core::{
    CallAction, CallStatus, CallStatusEvent, MessageStatus, MessageStatusEvent, SwitchboardError,
};
use switchboard_router::{DialLeg, InboundSms, VoiceWebhook};

use crate::server::GatewayState;

/// Carrier redelivery token; identical across retries of one event.
const IDEMPOTENCY_HEADER: &str = "i-twilio-idempotency-token";

const EMPTY_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response/>"#;

#[derive(Debug, Deserialize)]
pub struct VoiceForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "CallStatus", default)]
    pub call_status: Option<String>,
    #[serde(rename = "CallerId", alias = "callerId", default)]
    pub caller_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallStatusForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "CallStatus", default)]
    pub call_status: Option<String>,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "CallDuration", default)]
    pub call_duration: Option<String>,
    #[serde(rename = "RecordingUrl", default)]
    pub recording_url: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<String>,
    #[serde(rename = "AnsweredBy", default)]
    pub answered_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DialStatusForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "DialCallStatus", default)]
    pub dial_call_status: String,
}

/// Query string of the dial action URL.
#[derive(Debug, Default, Deserialize)]
pub struct DialQuery {
    #[serde(default)]
    pub leg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordingForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "RecordingUrl", default)]
    pub recording_url: Option<String>,
    #[serde(rename = "RecordingSid", default)]
    pub recording_sid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BridgeForm {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
}

#[derive(Debug, Deserialize)]
pub struct SmsForm {
    #[serde(rename = "MessageSid", alias = "SmsSid")]
    pub message_sid: String,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "SmsStatus", default)]
    pub sms_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SmsStatusForm {
    #[serde(rename = "MessageSid", alias = "SmsSid")]
    pub message_sid: String,
    #[serde(rename = "MessageStatus", alias = "SmsStatus", default)]
    pub message_status: Option<String>,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<String>,
}

/// Delivery id: the carrier's idempotency token, else a fresh uuid.
fn event_id(headers: &HeaderMap) -> String {
    headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn twiml(document: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        document,
    )
        .into_response()
}

/// Run `fut` within the webhook I/O budget.
async fn bounded<T>(
    state: &GatewayState,
    fut: impl Future<Output = Result<T, SwitchboardError>>,
) -> Result<T, SwitchboardError> {
    tokio::time::timeout(state.io_timeout, fut)
        .await
        .map_err(|_| SwitchboardError::Timeout {
            duration: state.io_timeout,
        })?
}

/// Render a routed action, or the static reject when routing failed.
fn render_voice(state: &GatewayState, route: &'static str, result: Result<CallAction, SwitchboardError>) -> Response {
    let document = match result {
        Ok(action) => match state.renderer.render(&action) {
            Ok(document) => document,
            Err(e) => {
                error!(route, error = %e, "call action could not be rendered");
                switchboard_markup::static_reject().to_string()
            }
        },
        Err(e @ SwitchboardError::Timeout { .. }) => {
            warn!(route, error = %e, "voice routing exceeded its time budget");
            switchboard_markup::static_reject().to_string()
        }
        Err(e) => {
            error!(route, error = %e, "voice routing failed");
            switchboard_markup::static_reject().to_string()
        }
    };
    twiml(document)
}

/// POST /webhooks/voice
pub async fn voice(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Form(form): Form<VoiceForm>,
) -> Response {
    let started = Instant::now();
    let hook = VoiceWebhook {
        event_id: event_id(&headers),
        call_sid: form.call_sid,
        from: form.from,
        to: form.to,
        call_status: form.call_status.as_deref().and_then(|s| s.parse().ok()),
        caller_id: non_empty(form.caller_id),
    };
    let result = bounded(&state, state.engine.route_voice(&hook)).await;
    let response = render_voice(&state, "voice", result);
    switchboard_prometheus::record_webhook_latency("voice", started.elapsed().as_secs_f64());
    response
}

/// POST /webhooks/voice/status
pub async fn voice_status(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Form(form): Form<CallStatusForm>,
) -> StatusCode {
    let started = Instant::now();
    let event = CallStatusEvent {
        event_id: event_id(&headers),
        call_sid: form.call_sid,
        status: form
            .call_status
            .as_deref()
            .and_then(|s| s.parse::<CallStatus>().ok()),
        from: non_empty(form.from),
        to: non_empty(form.to),
        duration_secs: form.call_duration.as_deref().and_then(|d| d.trim().parse().ok()),
        recording_url: non_empty(form.recording_url),
        price: non_empty(form.price),
        answered_by: non_empty(form.answered_by),
    };
    let call_sid = event.call_sid.clone();
    if let Err(e) = bounded(&state, state.engine.reconciler().apply_call_event(event)).await {
        error!(call_sid = %call_sid, error = %e, "call status not recorded");
    }
    switchboard_prometheus::record_webhook_latency("voice_status", started.elapsed().as_secs_f64());
    StatusCode::OK
}

/// POST /webhooks/voice/dial-status
pub async fn dial_status(
    State(state): State<GatewayState>,
    Query(query): Query<DialQuery>,
    Form(form): Form<DialStatusForm>,
) -> Response {
    let leg = DialLeg::from_query(query.leg.as_deref());
    let action = state
        .engine
        .dial_outcome(&form.call_sid, &form.dial_call_status, leg);
    render_voice(&state, "dial_status", Ok(action))
}

/// POST /webhooks/voice/recording
pub async fn recording(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Form(form): Form<RecordingForm>,
) -> Response {
    tracing::debug!(
        call_sid = %form.call_sid,
        recording_sid = ?form.recording_sid,
        "voicemail recording completed"
    );
    let result = bounded(
        &state,
        state.engine.voicemail_recorded(
            event_id(&headers),
            form.call_sid,
            non_empty(form.recording_url),
        ),
    )
    .await;
    render_voice(&state, "recording", result)
}

/// POST /webhooks/voice/bridge
pub async fn bridge(
    State(state): State<GatewayState>,
    Form(form): Form<BridgeForm>,
) -> Response {
    let result = bounded(&state, state.engine.bridge(&form.call_sid)).await;
    render_voice(&state, "bridge", result)
}

/// POST /webhooks/sms
pub async fn sms(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Form(form): Form<SmsForm>,
) -> Response {
    let started = Instant::now();
    let message_sid = form.message_sid.clone();
    let sms = InboundSms {
        event_id: event_id(&headers),
        message_sid: form.message_sid,
        from: form.from,
        to: form.to,
        body: form.body,
        status: form
            .sms_status
            .as_deref()
            .and_then(|s| s.parse::<MessageStatus>().ok()),
    };
    if let Err(e) = bounded(&state, state.engine.inbound_sms(sms)).await {
        error!(message_sid = %message_sid, error = %e, "inbound message not recorded");
    }
    switchboard_prometheus::record_webhook_latency("sms", started.elapsed().as_secs_f64());
    twiml(EMPTY_RESPONSE.to_string())
}

/// POST /webhooks/sms/status
pub async fn sms_status(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Form(form): Form<SmsStatusForm>,
) -> StatusCode {
    let event = MessageStatusEvent {
        event_id: event_id(&headers),
        message_sid: form.message_sid,
        status: form
            .message_status
            .as_deref()
            .and_then(|s| s.parse::<MessageStatus>().ok()),
        from: non_empty(form.from),
        to: non_empty(form.to),
        body: None,
        price: non_empty(form.price),
    };
    let message_sid = event.message_sid.clone();
    if let Err(e) = bounded(&state, state.engine.reconciler().apply_message_event(event)).await {
        error!(message_sid = %message_sid, error = %e, "message status not recorded");
    }
    StatusCode::OK
}
