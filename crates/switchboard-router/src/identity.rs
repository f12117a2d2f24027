// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of carrier-supplied signaling identities.

use switchboard_core::{PhoneNumber, TenantId};

/// Prefix the carrier puts in front of browser client identities.
const CLIENT_SCHEME: &str = "client:";

/// Prefix of every identity this control plane issues to browser clients.
const TENANT_IDENTITY_PREFIX: &str = "user_";

/// Who is on the originating side of a signaling event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingIdentity {
    /// A browser soft-phone registered as `client:user_<tenant>`.
    BrowserClient(TenantId),
    /// A phone number on the public network.
    CarrierNumber(PhoneNumber),
    /// Anything else (anonymous callers, foreign client names).
    Unrecognized(String),
}

impl SignalingIdentity {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(client) = raw.strip_prefix(CLIENT_SCHEME) {
            return client
                .strip_prefix(TENANT_IDENTITY_PREFIX)
                .and_then(|tenant| TenantId::parse(tenant).ok())
                .map(SignalingIdentity::BrowserClient)
                .unwrap_or_else(|| SignalingIdentity::Unrecognized(raw.to_string()));
        }
        match PhoneNumber::parse(raw) {
            Ok(number) => SignalingIdentity::CarrierNumber(number),
            Err(_) => SignalingIdentity::Unrecognized(raw.to_string()),
        }
    }

    pub fn is_browser_client(&self) -> bool {
        matches!(self, SignalingIdentity::BrowserClient(_))
    }
}
