// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier webhook routes, relative to the public base URL.

pub const VOICE: &str = "/webhooks/voice";
pub const VOICE_STATUS: &str = "/webhooks/voice/status";
pub const VOICE_DIAL_STATUS: &str = "/webhooks/voice/dial-status";
pub const VOICE_RECORDING: &str = "/webhooks/voice/recording";
pub const VOICE_BRIDGE: &str = "/webhooks/voice/bridge";
pub const SMS: &str = "/webhooks/sms";
pub const SMS_STATUS: &str = "/webhooks/sms/status";
