// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature middleware.
//!
//! Buffers the form body, verifies `X-Twilio-Signature` against the public
//! URL the carrier called, then hands the request on with its body intact.
//! A request that fails verification is not a parsed carrier event, so it is
//! answered with 403.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use switchboard_carrier::{SIGNATURE_HEADER, verify_signature};

/// Carrier webhook bodies are small form posts.
const MAX_WEBHOOK_BODY: usize = 64 * 1024;

/// Webhook verification settings.
#[derive(Clone)]
pub struct WebhookAuth {
    enabled: bool,
    auth_token: Option<String>,
    public_base_url: String,
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAuth")
            .field("enabled", &self.enabled)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl WebhookAuth {
    pub fn new(enabled: bool, auth_token: Option<String>, public_base_url: &str) -> Self {
        Self {
            enabled,
            auth_token: auth_token.filter(|t| !t.is_empty()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Verification switched off.
    pub fn disabled() -> Self {
        Self::new(false, None, "")
    }
}

pub async fn signature_middleware(
    State(auth): State<WebhookAuth>,
    request: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(request).await;
    }
    let Some(token) = auth.auth_token.as_deref() else {
        tracing::error!("webhook signature validation enabled without carrier.auth_token");
        switchboard_prometheus::record_webhook_rejection();
        return StatusCode::FORBIDDEN.into_response();
    };

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_WEBHOOK_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable webhook body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    let url = format!("{}{path_and_query}", auth.public_base_url);
    let params: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes).unwrap_or_default();

    let valid = signature.is_some_and(|sig| verify_signature(token, &url, &params, sig));
    if !valid {
        tracing::warn!(url = %url, has_signature = signature.is_some(), "webhook signature rejected");
        switchboard_prometheus::record_webhook_rejection();
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
