// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across adapter traits and the routing core.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::SwitchboardError;

/// Maximum digits allowed by E.164 after the leading `+`.
const E164_MAX_DIGITS: usize = 15;

/// Maximum length of a tenant identifier.
const TENANT_ID_MAX_LEN: usize = 64;

/// Identifier of an application tenant (the account owning numbers and history).
///
/// Tenant ids are embedded in carrier client identities (`user_<id>`), so they
/// are restricted to ASCII alphanumerics, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    /// Validate and wrap a raw tenant identifier.
    pub fn parse(raw: &str) -> Result<Self, SwitchboardError> {
        let valid = !raw.is_empty()
            && raw.len() <= TENANT_ID_MAX_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(SwitchboardError::InvalidInput(format!(
                "invalid tenant id `{raw}`"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The carrier client identity a browser soft-phone registers as.
    pub fn client_identity(&self) -> String {
        format!("user_{}", self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated E.164 phone number (`+` followed by 2-15 digits, no leading zero).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, SwitchboardError> {
        let raw = raw.trim();
        let digits = raw.strip_prefix('+').ok_or_else(|| {
            SwitchboardError::InvalidInput(format!("`{raw}` is not an E.164 number"))
        })?;
        let valid = (2..=E164_MAX_DIGITS).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit())
            && !digits.starts_with('0');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(SwitchboardError::InvalidInput(format!(
                "`{raw}` is not an E.164 number"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = SwitchboardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PhoneNumber::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter plugged into the control plane.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Carrier,
    Observability,
}

/// A single capability a number may be provisioned with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Voice,
    Sms,
    Mms,
}

/// Declared capability set of a tenant number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub voice: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub mms: bool,
}

impl Capabilities {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Voice => self.voice,
            Capability::Sms => self.sms,
            Capability::Mms => self.mms,
        }
    }
}

/// Lifecycle status of a tenant number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NumberStatus {
    Active,
    Released,
}

/// A carrier-assigned phone number owned by exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantNumber {
    pub id: i64,
    pub number: String,
    pub tenant_id: String,
    pub capabilities: Capabilities,
    pub status: NumberStatus,
    pub carrier_sid: Option<String>,
    pub voice_url: Option<String>,
    pub sms_url: Option<String>,
    pub acquired_at: String,
    pub updated_at: String,
}

/// Input for recording a newly acquired number in the registry.
#[derive(Debug, Clone)]
pub struct NewTenantNumber {
    pub number: PhoneNumber,
    pub tenant_id: TenantId,
    pub capabilities: Capabilities,
    pub carrier_sid: Option<String>,
    pub voice_url: Option<String>,
    pub sms_url: Option<String>,
}

/// Result of a registry lookup: who owns a number and what it may do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberOwner {
    pub number: String,
    pub tenant_id: TenantId,
    pub capabilities: Capabilities,
}

/// Direction of a call leg or message relative to the tenant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    /// Map a carrier direction value (`inbound`, `outbound-api`, `outbound-dial`, ...).
    pub fn from_carrier(raw: &str) -> Option<Self> {
        if raw == "inbound" {
            Some(Direction::Inbound)
        } else if raw.starts_with("outbound") {
            Some(Direction::Outbound)
        } else {
            None
        }
    }
}

/// Carrier-reported status of a call leg.
///
/// See [`crate::lattice`] for the ordering used when reconciling updates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Queued,
    Initiated,
    Ringing,
    InProgress,
    Completed,
    Busy,
    NoAnswer,
    Failed,
    Canceled,
}

/// Carrier-reported delivery status of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MessageStatus {
    Accepted,
    Scheduled,
    Queued,
    Sending,
    Receiving,
    Sent,
    Delivered,
    Undelivered,
    Failed,
    Canceled,
    Received,
    Read,
}

/// One row per carrier call leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: i64,
    pub call_sid: String,
    pub tenant_id: String,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub direction: Direction,
    pub status: CallStatus,
    pub duration_secs: Option<i64>,
    pub recording_url: Option<String>,
    pub price: Option<String>,
    pub answered_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One row per SMS/MMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: i64,
    pub message_sid: String,
    pub tenant_id: String,
    pub from_number: String,
    pub to_number: String,
    pub body: String,
    pub direction: Direction,
    pub status: MessageStatus,
    pub is_read: bool,
    pub price: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MessageRecord {
    /// The phone number on the other side of the conversation.
    pub fn counterpart(&self) -> &str {
        match self.direction {
            Direction::Inbound => &self.from_number,
            Direction::Outbound => &self.to_number,
        }
    }
}

/// Derived view over the messages a tenant exchanged with one counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub counterpart: String,
    pub last_message: String,
    pub last_direction: Direction,
    pub last_message_at: String,
    pub message_count: u32,
    pub unread_count: u32,
}

/// Per-tenant activity counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub calls_since: u64,
    pub messages_since: u64,
    pub active_numbers: u64,
}

/// Ownership assigned to a ledger row created from a carrier event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub tenant_id: TenantId,
    pub direction: Direction,
}

/// A call status update delivered by the carrier (or synthesized by routing).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallStatusEvent {
    /// Delivery identifier used for log correlation of redeliveries.
    pub event_id: String,
    pub call_sid: String,
    /// `None` for field-only backfills such as recording callbacks.
    pub status: Option<CallStatus>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub duration_secs: Option<i64>,
    pub recording_url: Option<String>,
    pub price: Option<String>,
    pub answered_by: Option<String>,
}

/// A message status update delivered by the carrier (or synthesized on send/receive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageStatusEvent {
    pub event_id: String,
    pub message_sid: String,
    pub status: Option<MessageStatus>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub body: Option<String>,
    pub price: Option<String>,
}

/// Why the ledger declined to apply an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IgnoreReason {
    /// The event's status is behind the stored status.
    Stale,
    /// The event carries nothing the ledger does not already hold.
    Duplicate,
}

/// Outcome of applying a status event to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { created: bool },
    Ignored(IgnoreReason),
    NotFound,
}

impl ApplyOutcome {
    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ApplyOutcome::Applied { created: true } => "inserted",
            ApplyOutcome::Applied { created: false } => "updated",
            ApplyOutcome::Ignored(IgnoreReason::Stale) => "stale",
            ApplyOutcome::Ignored(IgnoreReason::Duplicate) => "duplicate",
            ApplyOutcome::NotFound => "not_found",
        }
    }
}

/// Result of a ledger upsert: the outcome plus the row as it stands afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerWrite<T> {
    pub outcome: ApplyOutcome,
    pub record: Option<T>,
}

impl<T> LedgerWrite<T> {
    pub fn not_found() -> Self {
        Self {
            outcome: ApplyOutcome::NotFound,
            record: None,
        }
    }
}
