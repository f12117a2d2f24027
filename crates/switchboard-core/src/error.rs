// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Switchboard control plane.

use thiserror::Error;

/// The primary error type used across all Switchboard adapter traits and core operations.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Configuration errors (missing credentials, invalid TOML, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A number, call, or message is not known to the registry or ledger.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A number is not allowed to perform the requested action.
    #[error("capability denied for {number}: {reason}")]
    CapabilityDenied { number: String, reason: String },

    /// The tenant owns no active number with the required capability.
    #[error("tenant {tenant_id} has no active {capability}-capable number")]
    NoCapableNumber {
        tenant_id: String,
        capability: String,
    },

    /// Malformed request input (bad phone number, empty body, bad identity).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A value could not be rendered into call-control markup.
    #[error("markup error: {0}")]
    Markup(String),

    /// The carrier API could not be reached or rejected the request.
    #[error("carrier unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        retryable: bool,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing or invalid credentials on an application-facing request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwitchboardError {
    /// Shorthand for a storage error wrapping any error source.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SwitchboardError::Storage {
            source: Box::new(err),
        }
    }

    /// Shorthand for a non-retryable carrier failure without a source.
    pub fn upstream(message: impl Into<String>) -> Self {
        SwitchboardError::UpstreamUnavailable {
            message: message.into(),
            retryable: false,
            source: None,
        }
    }

    /// Returns true when a carrier failure is safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SwitchboardError::UpstreamUnavailable {
                retryable: true,
                ..
            }
        )
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SwitchboardError::Config(_) => "configuration_error",
            SwitchboardError::Storage { .. } => "storage_error",
            SwitchboardError::NotFound { .. } => "not_found",
            SwitchboardError::CapabilityDenied { .. } => "capability_denied",
            SwitchboardError::NoCapableNumber { .. } => "no_capable_number",
            SwitchboardError::InvalidInput(_) => "invalid_input",
            SwitchboardError::Markup(_) => "invalid_markup_value",
            SwitchboardError::UpstreamUnavailable { .. } => "upstream_unavailable",
            SwitchboardError::Unauthorized(_) => "unauthorized",
            SwitchboardError::Timeout { .. } => "timeout",
            SwitchboardError::Internal(_) => "internal_error",
        }
    }
}
