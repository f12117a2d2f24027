// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the carrier REST API.
//!
//! Provides [`TwilioClient`], the production [`CarrierClient`]. Requests are
//! form-encoded POSTs authenticated with the account SID and auth token.
//! Only failures where the carrier cannot have acted on the request are
//! retried: connection errors and 429/503 responses.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use switchboard_config::model::CarrierConfig;
use switchboard_core::{
    AdapterType, CarrierClient, HealthStatus, PlaceCallRequest, PlacedCall, PluginAdapter,
    SendMessageRequest, SentMessage, SwitchboardError,
};

const API_VERSION: &str = "2010-04-01";

/// Call progress events requested for API-originated calls.
const CALL_STATUS_EVENTS: [&str; 4] = ["initiated", "ringing", "answered", "completed"];

/// Successful create response; both resources share this shape.
#[derive(Debug, Deserialize)]
struct ResourceResponse {
    sid: String,
    status: String,
}

/// Error body returned by the carrier for rejected requests.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// Carrier REST client.
#[derive(Clone)]
pub struct TwilioClient {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl TwilioClient {
    /// Build a client from carrier configuration.
    ///
    /// Fails with a configuration error when credentials are missing.
    pub fn new(config: &CarrierConfig) -> Result<Self, SwitchboardError> {
        let account_sid = config
            .account_sid
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SwitchboardError::Config("carrier.account_sid is not configured".into()))?;
        let auth_token = config
            .auth_token
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SwitchboardError::Config("carrier.auth_token is not configured".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SwitchboardError::UpstreamUnavailable {
                message: format!("failed to build HTTP client: {e}"),
                retryable: false,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Shortens the pause between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}/{resource}.json",
            self.base_url, self.account_sid
        )
    }

    async fn post_form(
        &self,
        operation: &'static str,
        resource: &str,
        form: &[(&str, String)],
    ) -> Result<ResourceResponse, SwitchboardError> {
        let url = self.resource_url(resource);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, operation, "retrying carrier request");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match self
                .client
                .post(&url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .form(form)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if e.is_connect() && attempt < self.max_retries => {
                    warn!(operation, error = %e, "carrier connection failed, will retry");
                    last_error = Some(SwitchboardError::UpstreamUnavailable {
                        message: format!("carrier connection failed: {e}"),
                        retryable: true,
                        source: Some(Box::new(e)),
                    });
                    continue;
                }
                Err(e) => {
                    switchboard_prometheus::record_carrier_request(operation, false);
                    let retryable = e.is_connect();
                    let message = if e.is_timeout() {
                        format!("carrier request timed out: {e}")
                    } else {
                        format!("carrier request failed: {e}")
                    };
                    return Err(SwitchboardError::UpstreamUnavailable {
                        message,
                        retryable,
                        source: Some(Box::new(e)),
                    });
                }
            };

            let status = response.status();
            debug!(operation, status = %status, attempt, "carrier response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| {
                    SwitchboardError::UpstreamUnavailable {
                        message: format!("failed to read carrier response: {e}"),
                        retryable: false,
                        source: Some(Box::new(e)),
                    }
                })?;
                let parsed: ResourceResponse = serde_json::from_str(&body).map_err(|e| {
                    SwitchboardError::UpstreamUnavailable {
                        message: format!("unexpected carrier response: {e}"),
                        retryable: false,
                        source: Some(Box::new(e)),
                    }
                })?;
                switchboard_prometheus::record_carrier_request(operation, true);
                return Ok(parsed);
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => match api_err.code {
                    Some(code) => format!("carrier rejected request ({code}): {}", api_err.message),
                    None => format!("carrier rejected request: {}", api_err.message),
                },
                Err(_) => format!("carrier returned {status}: {body}"),
            };

            if is_transient(status) {
                if attempt < self.max_retries {
                    warn!(operation, status = %status, "transient carrier error, will retry");
                    last_error = Some(SwitchboardError::UpstreamUnavailable {
                        message,
                        retryable: true,
                        source: None,
                    });
                    continue;
                }
                switchboard_prometheus::record_carrier_request(operation, false);
                return Err(SwitchboardError::UpstreamUnavailable {
                    message,
                    retryable: true,
                    source: None,
                });
            }

            switchboard_prometheus::record_carrier_request(operation, false);
            return Err(SwitchboardError::upstream(message));
        }

        switchboard_prometheus::record_carrier_request(operation, false);
        Err(last_error.unwrap_or_else(|| {
            SwitchboardError::upstream("carrier request failed after retries")
        }))
    }
}

/// Responses that guarantee the carrier did not act on the request.
fn is_transient(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 503)
}

#[async_trait]
impl PluginAdapter for TwilioClient {
    fn name(&self) -> &str {
        "twilio"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Carrier
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl CarrierClient for TwilioClient {
    async fn create_call(&self, request: PlaceCallRequest) -> Result<PlacedCall, SwitchboardError> {
        let mut form: Vec<(&str, String)> = vec![
            ("To", request.to),
            ("From", request.from),
            ("Url", request.answer_url),
            ("StatusCallback", request.status_callback),
        ];
        for event in CALL_STATUS_EVENTS {
            form.push(("StatusCallbackEvent", event.to_string()));
        }
        if request.record {
            form.push(("Record", "true".to_string()));
        }

        let created = self.post_form("create_call", "Calls", &form).await?;
        debug!(call_sid = %created.sid, status = %created.status, "carrier call created");
        Ok(PlacedCall {
            sid: created.sid,
            status: created.status,
        })
    }

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SentMessage, SwitchboardError> {
        let mut form: Vec<(&str, String)> = vec![
            ("To", request.to),
            ("From", request.from),
            ("Body", request.body),
        ];
        if let Some(callback) = request.status_callback {
            form.push(("StatusCallback", callback));
        }

        let sent = self.post_form("send_message", "Messages", &form).await?;
        debug!(message_sid = %sent.sid, status = %sent.status, "carrier message accepted");
        Ok(SentMessage {
            sid: sent.sid,
            status: sent.status,
        })
    }
}
