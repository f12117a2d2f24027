// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing decisions for carrier signaling events and outbound requests.
//!
//! Caller id selection, in order:
//! 1. an explicitly requested number, which must be active, owned by the
//!    tenant and capable of the action;
//! 2. the tenant's most recently acquired active number with the capability;
//! 3. otherwise `NoCapableNumber`.
//!
//! Ledger writes happen before an action is returned, so a rendered action
//! always has a committed record behind it.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use switchboard_config::model::RoutingConfig;
use switchboard_core::{
    CallAction, CallRecord, CallStatus, CallStatusEvent, Capability, CarrierClient, Direction,
    MessageRecord, MessageStatus, MessageStatusEvent, Ownership, PhoneNumber, PlaceCallRequest,
    PstnDial, SendMessageRequest, StorageAdapter, SwitchboardError, TenantId,
};

use crate::identity::SignalingIdentity;
use crate::paths;
use crate::reconciler::Reconciler;

/// Spoken after a voicemail has been recorded.
const VOICEMAIL_GOODBYE: &str = "Thank you for your message. Goodbye.";

/// Carrier limit on a single outbound message body.
const MAX_BODY_CHARS: usize = 1600;

/// Parameters of a voice signaling webhook.
#[derive(Debug, Clone, Default)]
pub struct VoiceWebhook {
    pub event_id: String,
    pub call_sid: String,
    pub from: String,
    pub to: String,
    pub call_status: Option<CallStatus>,
    /// Caller id requested by a browser client.
    pub caller_id: Option<String>,
}

/// Parameters of an inbound SMS webhook.
#[derive(Debug, Clone, Default)]
pub struct InboundSms {
    pub event_id: String,
    pub message_sid: String,
    pub from: String,
    pub to: String,
    pub body: String,
    pub status: Option<MessageStatus>,
}

/// The dial a dial-status callback reports on.
///
/// Carried as the `leg` query parameter of the dial action URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialLeg {
    /// Browser client rung for an inbound call.
    Inbound,
    /// Browser client rung for an answered API-initiated call.
    Bridge,
    /// PSTN destination dialed from a browser client.
    Outbound,
}

impl DialLeg {
    pub fn as_str(self) -> &'static str {
        match self {
            DialLeg::Inbound => "inbound",
            DialLeg::Bridge => "bridge",
            DialLeg::Outbound => "outbound",
        }
    }

    /// Parse a `leg` query value. Absent or unknown values are treated as a
    /// PSTN dial, which never falls back to voicemail.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("inbound") => DialLeg::Inbound,
            Some("bridge") => DialLeg::Bridge,
            _ => DialLeg::Outbound,
        }
    }
}

/// Result of an API-initiated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub call_sid: String,
    pub status: CallStatus,
}

/// The routing decision engine.
///
/// Holds no per-call state; concurrent webhooks coordinate only through the
/// ledger.
#[derive(Clone)]
pub struct RoutingEngine {
    storage: Arc<dyn StorageAdapter>,
    carrier: Arc<dyn CarrierClient>,
    reconciler: Reconciler,
    config: RoutingConfig,
    base_url: String,
}

impl RoutingEngine {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        carrier: Arc<dyn CarrierClient>,
        reconciler: Reconciler,
        config: RoutingConfig,
        public_base_url: &str,
    ) -> Self {
        Self {
            storage,
            carrier,
            reconciler,
            config,
            base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    fn callback(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn dial_action(&self, leg: DialLeg) -> String {
        format!("{}?leg={}", self.callback(paths::VOICE_DIAL_STATUS), leg.as_str())
    }

    /// Decide what to do with a voice signaling event.
    pub async fn route_voice(&self, hook: &VoiceWebhook) -> Result<CallAction, SwitchboardError> {
        if let Some(status) = hook.call_status.filter(|s| s.is_terminal()) {
            info!(call_sid = %hook.call_sid, status = %status, "voice webhook for a finished call");
            switchboard_prometheus::record_route_decision("finished", CallAction::Empty.kind());
            return Ok(CallAction::Empty);
        }

        let (shape, action) = match SignalingIdentity::parse(&hook.from) {
            SignalingIdentity::BrowserClient(tenant_id) => {
                ("outbound", self.outbound_from_client(&tenant_id, hook).await?)
            }
            _ => ("inbound", self.inbound_to_number(hook).await?),
        };
        switchboard_prometheus::record_route_decision(shape, action.kind());
        info!(
            call_sid = %hook.call_sid,
            event = shape,
            action = action.kind(),
            "voice call routed"
        );
        Ok(action)
    }

    async fn outbound_from_client(
        &self,
        tenant_id: &TenantId,
        hook: &VoiceWebhook,
    ) -> Result<CallAction, SwitchboardError> {
        let Ok(destination) = PhoneNumber::parse(&hook.to) else {
            warn!(call_sid = %hook.call_sid, tenant_id = %tenant_id, "client dialed a non E.164 destination");
            return Ok(CallAction::reject(self.config.unavailable_message.clone()));
        };

        let caller_id = match self
            .select_number(tenant_id, hook.caller_id.as_deref(), Capability::Voice)
            .await
        {
            Ok(number) => number,
            Err(SwitchboardError::NoCapableNumber { .. }) => {
                info!(tenant_id = %tenant_id, "no voice-capable caller id, rejecting");
                return Ok(CallAction::reject(self.config.no_number_message.clone()));
            }
            Err(SwitchboardError::CapabilityDenied { number, reason }) => {
                warn!(tenant_id = %tenant_id, number = %number, reason = %reason, "requested caller id denied");
                return Ok(CallAction::reject(self.config.no_number_message.clone()));
            }
            Err(e) => return Err(e),
        };

        let event = CallStatusEvent {
            event_id: hook.event_id.clone(),
            call_sid: hook.call_sid.clone(),
            status: Some(CallStatus::Initiated),
            from: Some(caller_id.to_string()),
            to: Some(destination.to_string()),
            ..Default::default()
        };
        self.reconciler
            .apply_call_event_as(
                event,
                Some(Ownership {
                    tenant_id: tenant_id.clone(),
                    direction: Direction::Outbound,
                }),
            )
            .await?;

        Ok(CallAction::DialPstn(PstnDial {
            destination: destination.to_string(),
            caller_id: caller_id.to_string(),
            record: self.config.record_outbound,
            timeout_secs: self.config.pstn_dial_timeout_secs,
            status_callback: Some(self.callback(paths::VOICE_STATUS)),
            action_url: Some(self.dial_action(DialLeg::Outbound)),
        }))
    }

    async fn inbound_to_number(&self, hook: &VoiceWebhook) -> Result<CallAction, SwitchboardError> {
        let owner = match PhoneNumber::parse(&hook.to) {
            Ok(to) => self.storage.resolve_owner(to.as_str()).await?,
            Err(_) => None,
        };
        let Some(owner) = owner.filter(|o| o.capabilities.voice) else {
            warn!(call_sid = %hook.call_sid, to = %hook.to, "inbound call to unregistered number");
            return Ok(CallAction::reject(self.config.unavailable_message.clone()));
        };

        let event = CallStatusEvent {
            event_id: hook.event_id.clone(),
            call_sid: hook.call_sid.clone(),
            status: Some(CallStatus::Ringing),
            from: Some(hook.from.clone()),
            to: Some(hook.to.clone()),
            ..Default::default()
        };
        self.reconciler
            .apply_call_event_as(
                event,
                Some(Ownership {
                    tenant_id: owner.tenant_id.clone(),
                    direction: Direction::Inbound,
                }),
            )
            .await?;

        Ok(self.dial_client(&owner.tenant_id, DialLeg::Inbound))
    }

    fn dial_client(&self, tenant_id: &TenantId, leg: DialLeg) -> CallAction {
        CallAction::DialClient {
            identity: tenant_id.client_identity(),
            timeout_secs: self.config.client_dial_timeout_secs,
            action_url: Some(self.dial_action(leg)),
            fallback: Some(Box::new(self.unanswered(leg))),
        }
    }

    /// What a dial leg falls back to when nobody picked up.
    fn unanswered(&self, leg: DialLeg) -> CallAction {
        match leg {
            DialLeg::Inbound => CallAction::RecordVoicemail {
                prompt: Some(self.config.voicemail_prompt.clone()),
                timeout_secs: self.config.voicemail_timeout_secs,
                action_url: Some(self.callback(paths::VOICE_RECORDING)),
            },
            DialLeg::Bridge => CallAction::Say {
                message: self.config.not_available_message.clone(),
                hangup: true,
            },
            DialLeg::Outbound => CallAction::Say {
                message: self.config.not_available_message.clone(),
                hangup: false,
            },
        }
    }

    /// Answer URL for API-initiated calls: connect the answered leg to the
    /// owning tenant's browser client.
    pub async fn bridge(&self, call_sid: &str) -> Result<CallAction, SwitchboardError> {
        let tenant = match self.storage.get_call(call_sid).await? {
            Some(record) => TenantId::parse(&record.tenant_id).ok(),
            None => None,
        };
        let action = match tenant {
            Some(tenant_id) => self.dial_client(&tenant_id, DialLeg::Bridge),
            None => {
                warn!(call_sid, "bridge requested for unknown call");
                CallAction::reject(self.config.unavailable_message.clone())
            }
        };
        switchboard_prometheus::record_route_decision("bridge", action.kind());
        Ok(action)
    }

    /// Outcome of a `<Dial>`.
    ///
    /// Only a dial nobody picked up falls back (voicemail on inbound legs, an
    /// apology otherwise). An answered or canceled dial just ends.
    pub fn dial_outcome(&self, call_sid: &str, dial_call_status: &str, leg: DialLeg) -> CallAction {
        let action = match dial_call_status {
            "no-answer" | "busy" | "failed" => self.unanswered(leg),
            _ => CallAction::Empty,
        };
        debug!(
            call_sid,
            dial_call_status,
            leg = leg.as_str(),
            action = action.kind(),
            "dial completed"
        );
        switchboard_prometheus::record_route_decision("dial_status", action.kind());
        action
    }

    /// Store a finished voicemail recording and say goodbye.
    pub async fn voicemail_recorded(
        &self,
        event_id: String,
        call_sid: String,
        recording_url: Option<String>,
    ) -> Result<CallAction, SwitchboardError> {
        let event = CallStatusEvent {
            event_id,
            call_sid,
            status: None,
            recording_url,
            ..Default::default()
        };
        self.reconciler.apply_call_event(event).await?;
        Ok(CallAction::Say {
            message: VOICEMAIL_GOODBYE.to_string(),
            hangup: true,
        })
    }

    /// Record an inbound message. Messages to unregistered numbers are
    /// dropped and yield `None`.
    pub async fn inbound_sms(
        &self,
        sms: InboundSms,
    ) -> Result<Option<MessageRecord>, SwitchboardError> {
        let owner = match PhoneNumber::parse(&sms.to) {
            Ok(to) => self.storage.resolve_owner(to.as_str()).await?,
            Err(_) => None,
        };
        let Some(owner) = owner else {
            warn!(message_sid = %sms.message_sid, to = %sms.to, "inbound message to unregistered number");
            switchboard_prometheus::record_route_decision("inbound_sms", "dropped");
            return Ok(None);
        };

        let event = MessageStatusEvent {
            event_id: sms.event_id,
            message_sid: sms.message_sid,
            status: Some(sms.status.unwrap_or(MessageStatus::Received)),
            from: Some(sms.from),
            to: Some(sms.to),
            body: Some(sms.body),
            price: None,
        };
        let write = self
            .reconciler
            .apply_message_event_as(
                event,
                Some(Ownership {
                    tenant_id: owner.tenant_id,
                    direction: Direction::Inbound,
                }),
            )
            .await?;
        switchboard_prometheus::record_route_decision("inbound_sms", "recorded");
        Ok(write.record)
    }

    /// Place a call from the API on behalf of a tenant.
    pub async fn initiate_call(
        &self,
        tenant_id: &TenantId,
        to: &str,
        from: Option<&str>,
    ) -> Result<OutboundCall, SwitchboardError> {
        let destination = PhoneNumber::parse(to)?;
        let caller_id = self.select_number(tenant_id, from, Capability::Voice).await?;

        let placed = self
            .carrier
            .create_call(PlaceCallRequest {
                to: destination.to_string(),
                from: caller_id.to_string(),
                answer_url: self.callback(paths::VOICE_BRIDGE),
                status_callback: self.callback(paths::VOICE_STATUS),
                record: self.config.record_outbound,
            })
            .await?;

        let status = CallStatus::from_str(&placed.status).unwrap_or(CallStatus::Initiated);
        let event = CallStatusEvent {
            event_id: format!("create-{}", placed.sid),
            call_sid: placed.sid.clone(),
            status: Some(status),
            from: Some(caller_id.to_string()),
            to: Some(destination.to_string()),
            ..Default::default()
        };
        let write = self
            .reconciler
            .apply_call_event_as(
                event,
                Some(Ownership {
                    tenant_id: tenant_id.clone(),
                    direction: Direction::Outbound,
                }),
            )
            .await
            .inspect_err(|e| {
                // The carrier is already dialing this call.
                error!(
                    tenant_id = %tenant_id,
                    call_sid = %placed.sid,
                    to = %destination,
                    error = %e,
                    "call placed but not recorded"
                );
            })?;

        info!(tenant_id = %tenant_id, call_sid = %placed.sid, "outbound call placed");
        Ok(OutboundCall {
            status: write.record.map(|r: CallRecord| r.status).unwrap_or(status),
            call_sid: placed.sid,
        })
    }

    /// Send a message on behalf of a tenant.
    ///
    /// Ownership and capability of the sender are checked before the carrier
    /// is contacted.
    pub async fn send_message(
        &self,
        tenant_id: &TenantId,
        to: &str,
        body: &str,
        from: Option<&str>,
    ) -> Result<MessageRecord, SwitchboardError> {
        let destination = PhoneNumber::parse(to)?;
        if body.trim().is_empty() {
            return Err(SwitchboardError::InvalidInput("message body is empty".into()));
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(SwitchboardError::InvalidInput(format!(
                "message body exceeds {MAX_BODY_CHARS} characters"
            )));
        }
        let sender = self.select_number(tenant_id, from, Capability::Sms).await?;

        let sent = self
            .carrier
            .send_message(SendMessageRequest {
                to: destination.to_string(),
                from: sender.to_string(),
                body: body.to_string(),
                status_callback: Some(self.callback(paths::SMS_STATUS)),
            })
            .await?;

        let status = MessageStatus::from_str(&sent.status).unwrap_or(MessageStatus::Queued);
        let event = MessageStatusEvent {
            event_id: format!("send-{}", sent.sid),
            message_sid: sent.sid.clone(),
            status: Some(status),
            from: Some(sender.to_string()),
            to: Some(destination.to_string()),
            body: Some(body.to_string()),
            price: None,
        };
        let write = self
            .reconciler
            .apply_message_event_as(
                event,
                Some(Ownership {
                    tenant_id: tenant_id.clone(),
                    direction: Direction::Outbound,
                }),
            )
            .await
            .inspect_err(|e| {
                error!(
                    tenant_id = %tenant_id,
                    message_sid = %sent.sid,
                    error = %e,
                    "message sent but not recorded"
                );
            })?;

        info!(tenant_id = %tenant_id, message_sid = %sent.sid, "message sent");
        write.record.ok_or_else(|| {
            SwitchboardError::Internal(format!("message {} missing after send", sent.sid))
        })
    }

    /// Pick the number a tenant acts from.
    async fn select_number(
        &self,
        tenant_id: &TenantId,
        requested: Option<&str>,
        capability: Capability,
    ) -> Result<PhoneNumber, SwitchboardError> {
        if let Some(requested) = requested.map(str::trim).filter(|r| !r.is_empty()) {
            let number = PhoneNumber::parse(requested)?;
            let owner = self.storage.resolve_owner(number.as_str()).await?;
            return match owner {
                Some(owner) if owner.tenant_id != *tenant_id => {
                    Err(SwitchboardError::CapabilityDenied {
                        number: number.to_string(),
                        reason: "number is not owned by this tenant".into(),
                    })
                }
                Some(owner) if !owner.capabilities.allows(capability) => {
                    Err(SwitchboardError::CapabilityDenied {
                        number: number.to_string(),
                        reason: format!("number is not {capability}-capable"),
                    })
                }
                Some(_) => Ok(number),
                None => Err(SwitchboardError::CapabilityDenied {
                    number: number.to_string(),
                    reason: "number is not registered".into(),
                }),
            };
        }

        match self
            .storage
            .latest_capable_number(tenant_id, capability)
            .await?
        {
            Some(record) => PhoneNumber::parse(&record.number),
            None => Err(SwitchboardError::NoCapableNumber {
                tenant_id: tenant_id.to_string(),
                capability: capability.to_string(),
            }),
        }
    }
}
