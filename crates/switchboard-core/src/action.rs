// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-control actions produced by the routing engine.
//!
//! An action is the decision for a single signaling event. It carries no
//! markup; rendering happens after the engine has committed its ledger write.

/// Parameters of a dial to a PSTN destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PstnDial {
    pub destination: String,
    pub caller_id: String,
    pub record: bool,
    pub timeout_secs: u32,
    /// Receives per-leg status callbacks for the dialed number.
    pub status_callback: Option<String>,
    /// Requested by the carrier when the dial verb completes.
    pub action_url: Option<String>,
}

/// The next thing the carrier should do with a call leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallAction {
    /// Ring a registered browser client for up to `timeout_secs`.
    ///
    /// When the dial ends the carrier requests `action_url` with the dial
    /// outcome; `fallback` is what that callback answers when nobody picked
    /// up. The fallback is never played after an answered call.
    DialClient {
        identity: String,
        timeout_secs: u32,
        action_url: Option<String>,
        fallback: Option<Box<CallAction>>,
    },
    DialPstn(PstnDial),
    RecordVoicemail {
        prompt: Option<String>,
        timeout_secs: u32,
        action_url: Option<String>,
    },
    /// Speak a message, optionally hanging up afterwards.
    Say { message: String, hangup: bool },
    /// Speak an apology and end the call.
    Reject { message: String },
    /// Acknowledge without instructions.
    Empty,
}

impl CallAction {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CallAction::DialClient { .. } => "dial_client",
            CallAction::DialPstn(_) => "dial_pstn",
            CallAction::RecordVoicemail { .. } => "voicemail",
            CallAction::Say { .. } => "say",
            CallAction::Reject { .. } => "reject",
            CallAction::Empty => "empty",
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        CallAction::Reject {
            message: message.into(),
        }
    }
}
