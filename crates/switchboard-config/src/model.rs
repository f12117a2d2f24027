// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Switchboard control plane.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level Switchboard configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// HTTP listener and public URL settings.
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Carrier REST credentials and webhook validation.
    #[serde(default)]
    pub carrier: CarrierConfig,

    /// Browser client grant signing.
    #[serde(default)]
    pub grant: GrantConfig,

    /// Application API session verification.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Routing timeouts and spoken prompts.
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL, used to build carrier callback URLs
    /// and to validate webhook signatures.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Upper bound on registry and ledger I/O per webhook, in milliseconds.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_io_timeout_ms() -> u64 {
    5000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("switchboard").join("switchboard.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("switchboard.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Carrier REST API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierConfig {
    /// Account identifier used for REST paths and basic auth.
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Account auth token. Also the key for webhook signatures.
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Reject carrier webhooks whose signature does not verify.
    #[serde(default = "default_validate_signatures")]
    pub validate_signatures: bool,

    /// Retries for connect failures and 429/503 responses.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            api_base_url: default_api_base_url(),
            validate_signatures: default_validate_signatures(),
            max_retries: default_max_retries(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl fmt::Debug for CarrierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("api_base_url", &self.api_base_url)
            .field("validate_signatures", &self.validate_signatures)
            .field("max_retries", &self.max_retries)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_validate_signatures() -> bool {
    true
}

fn default_max_retries() -> u32 {
    2
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Credentials used to sign browser client access grants.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GrantConfig {
    #[serde(default)]
    pub api_key_sid: Option<String>,

    #[serde(default)]
    pub api_key_secret: Option<String>,

    /// Voice application that handles outgoing calls from browser clients.
    #[serde(default)]
    pub voice_application_sid: Option<String>,

    /// Grant lifetime in seconds.
    #[serde(default = "default_grant_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self {
            api_key_sid: None,
            api_key_secret: None,
            voice_application_sid: None,
            ttl_secs: default_grant_ttl_secs(),
        }
    }
}

impl fmt::Debug for GrantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrantConfig")
            .field("api_key_sid", &self.api_key_sid)
            .field(
                "api_key_secret",
                &self.api_key_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("voice_application_sid", &self.voice_application_sid)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

fn default_grant_ttl_secs() -> u64 {
    3600
}

/// Application API authentication.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HMAC secret for HS256 session tokens presented as bearer tokens.
    #[serde(default)]
    pub session_secret: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "session_secret",
                &self.session_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Routing timeouts and the prompts spoken to callers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// How long an inbound call rings the browser client before voicemail.
    #[serde(default = "default_client_dial_timeout_secs")]
    pub client_dial_timeout_secs: u32,

    #[serde(default = "default_voicemail_timeout_secs")]
    pub voicemail_timeout_secs: u32,

    #[serde(default = "default_pstn_dial_timeout_secs")]
    pub pstn_dial_timeout_secs: u32,

    /// Record outbound PSTN calls from answer.
    #[serde(default = "default_record_outbound")]
    pub record_outbound: bool,

    /// Text-to-speech voice for spoken prompts.
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_voicemail_prompt")]
    pub voicemail_prompt: String,

    /// Spoken when an inbound call targets an unregistered number.
    #[serde(default = "default_unavailable_message")]
    pub unavailable_message: String,

    /// Spoken when a browser client has no voice-capable caller id.
    #[serde(default = "default_no_number_message")]
    pub no_number_message: String,

    /// Spoken when a dialed party is busy or does not answer.
    #[serde(default = "default_not_available_message")]
    pub not_available_message: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            client_dial_timeout_secs: default_client_dial_timeout_secs(),
            voicemail_timeout_secs: default_voicemail_timeout_secs(),
            pstn_dial_timeout_secs: default_pstn_dial_timeout_secs(),
            record_outbound: default_record_outbound(),
            voice: default_voice(),
            voicemail_prompt: default_voicemail_prompt(),
            unavailable_message: default_unavailable_message(),
            no_number_message: default_no_number_message(),
            not_available_message: default_not_available_message(),
        }
    }
}

fn default_client_dial_timeout_secs() -> u32 {
    20
}

fn default_voicemail_timeout_secs() -> u32 {
    30
}

fn default_pstn_dial_timeout_secs() -> u32 {
    30
}

fn default_record_outbound() -> bool {
    true
}

fn default_voice() -> String {
    "alice".to_string()
}

fn default_voicemail_prompt() -> String {
    "The person you are calling is not available. Please leave a message after the beep."
        .to_string()
}

fn default_unavailable_message() -> String {
    "Sorry, this number is currently unavailable.".to_string()
}

fn default_no_number_message() -> String {
    "Sorry, you need a phone number to make calls. Please acquire a number first.".to_string()
}

fn default_not_available_message() -> String {
    "The person you are calling is not available. Please try again later.".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus metrics export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Serve `/metrics` in Prometheus text format.
    #[serde(default = "default_prometheus_enabled")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: default_prometheus_enabled(),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_redacted_in_debug() {
        let carrier = CarrierConfig {
            auth_token: Some("tok-secret".into()),
            ..Default::default()
        };
        let grant = GrantConfig {
            api_key_secret: Some("key-secret".into()),
            ..Default::default()
        };
        let auth = AuthConfig {
            session_secret: Some("session-secret".into()),
        };
        let rendered = format!("{carrier:?} {grant:?} {auth:?}");
        assert!(!rendered.contains("tok-secret"));
        assert!(!rendered.contains("key-secret"));
        assert!(!rendered.contains("session-secret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn routing_defaults_match_ring_then_voicemail() {
        let routing = RoutingConfig::default();
        assert_eq!(routing.client_dial_timeout_secs, 20);
        assert_eq!(routing.voicemail_timeout_secs, 30);
        assert_eq!(routing.pstn_dial_timeout_secs, 30);
        assert!(routing.record_outbound);
    }
}
