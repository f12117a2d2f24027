// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application API handlers.
//!
//! Every `/v1` handler runs behind the session middleware, which stores the
//! caller's [`TenantId`] as a request extension. Reads and writes are always
//! scoped to that tenant.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use switchboard_carrier::Grant;
use switchboard_core::{
    ActivityStats, CallRecord, CallStatus, Capabilities, Conversation, MessageRecord,
    MessageStatus, NewTenantNumber, PhoneNumber, PluginAdapter, TenantId, TenantNumber,
};

use crate::error::ApiError;
use crate::server::GatewayState;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListQuery {
    fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub to: String,
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResponse {
    pub call_id: String,
    pub status: CallStatus,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub to: String,
    pub body: String,
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message_id: String,
    pub status: MessageStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberRequest {
    pub number: String,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub carrier_sid: Option<String>,
    #[serde(default)]
    pub voice_url: Option<String>,
    #[serde(default)]
    pub sms_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub calls_this_month: u64,
    pub messages_this_month: u64,
    pub active_numbers: u64,
}

impl From<ActivityStats> for StatsResponse {
    fn from(stats: ActivityStats) -> Self {
        Self {
            calls_this_month: stats.calls_since,
            messages_this_month: stats.messages_since,
            active_numbers: stats.active_numbers,
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let healthy = state.storage.health_check().await.is_ok();
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /v1/grants
pub async fn post_grant(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
) -> Result<Json<Grant>, ApiError> {
    let grant = state.grants.issue(&tenant_id)?;
    tracing::debug!(tenant_id = %tenant_id, expires_at = %grant.expires_at, "grant issued");
    Ok(Json(grant))
}

/// POST /v1/calls
pub async fn post_call(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Json(body): Json<CallRequest>,
) -> Result<(StatusCode, Json<CallResponse>), ApiError> {
    let call = state
        .engine
        .initiate_call(&tenant_id, &body.to, body.from.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CallResponse {
            call_id: call.call_sid,
            status: call.status,
        }),
    ))
}

/// GET /v1/calls
pub async fn list_calls(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CallRecord>>, ApiError> {
    Ok(Json(
        state.storage.list_calls(&tenant_id, query.limit()).await?,
    ))
}

/// POST /v1/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Json(body): Json<MessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let record = state
        .engine
        .send_message(&tenant_id, &body.to, &body.body, body.from.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message_id: record.message_sid,
            status: record.status,
        }),
    ))
}

/// GET /v1/messages
pub async fn list_messages(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MessageRecord>>, ApiError> {
    Ok(Json(
        state.storage.list_messages(&tenant_id, query.limit()).await?,
    ))
}

/// GET /v1/conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    Ok(Json(state.storage.list_conversations(&tenant_id).await?))
}

/// GET /v1/conversations/{counterpart}
pub async fn get_conversation(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(counterpart): Path<String>,
) -> Result<Json<Vec<MessageRecord>>, ApiError> {
    let counterpart = PhoneNumber::parse(&counterpart)?;
    Ok(Json(
        state
            .storage
            .list_conversation(&tenant_id, counterpart.as_str())
            .await?,
    ))
}

/// POST /v1/conversations/{counterpart}/read
pub async fn mark_conversation_read(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(counterpart): Path<String>,
) -> Result<Json<ReadResponse>, ApiError> {
    let counterpart = PhoneNumber::parse(&counterpart)?;
    let updated = state
        .storage
        .mark_conversation_read(&tenant_id, counterpart.as_str())
        .await?;
    Ok(Json(ReadResponse { updated }))
}

/// GET /v1/numbers
pub async fn list_numbers(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
) -> Result<Json<Vec<TenantNumber>>, ApiError> {
    Ok(Json(state.storage.list_numbers(&tenant_id).await?))
}

/// POST /v1/numbers
pub async fn post_number(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Json(body): Json<NumberRequest>,
) -> Result<(StatusCode, Json<TenantNumber>), ApiError> {
    let number = state
        .storage
        .register_number(NewTenantNumber {
            number: PhoneNumber::parse(&body.number)?,
            tenant_id: tenant_id.clone(),
            capabilities: body.capabilities,
            carrier_sid: body.carrier_sid,
            voice_url: body.voice_url,
            sms_url: body.sms_url,
        })
        .await?;
    tracing::info!(tenant_id = %tenant_id, number = %number.number, "number registered");
    Ok((StatusCode::CREATED, Json(number)))
}

/// DELETE /v1/numbers/{number}
pub async fn release_number(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(number): Path<String>,
) -> Result<Json<TenantNumber>, ApiError> {
    let number = PhoneNumber::parse(&number)?;
    let released = state
        .storage
        .release_number(&tenant_id, number.as_str())
        .await?;
    tracing::info!(tenant_id = %tenant_id, number = %released.number, "number released");
    Ok(Json(released))
}

/// GET /v1/stats
pub async fn get_stats(
    State(state): State<GatewayState>,
    Extension(tenant_id): Extension<TenantId>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state
        .storage
        .activity_stats(&tenant_id, &month_start(Utc::now()))
        .await?;
    Ok(Json(stats.into()))
}

/// First instant of the month, in the ledger's timestamp format.
fn month_start(now: chrono::DateTime<Utc>) -> String {
    format!("{}-{:02}-01T00:00:00.000Z", now.year(), now.month())
}
