// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived voice grants for browser soft-phone clients.
//!
//! A grant is a carrier access token (HS256 JWT signed with an API key
//! secret) that lets a browser client register as `user_<tenant>` and
//! receive calls routed to that identity. Grants are never stored; clients
//! request a new one before the old one expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use switchboard_config::model::{CarrierConfig, GrantConfig};
use switchboard_core::{SwitchboardError, TenantId};

const CONTENT_TYPE: &str = "twilio-fpa;v=1";

/// A signed grant ready to hand to a browser client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub token: String,
    pub identity: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AccessTokenClaims {
    pub jti: String,
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub grants: Grants,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Grants {
    pub identity: String,
    pub voice: VoiceGrant,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct VoiceGrant {
    pub incoming: IncomingGrant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<OutgoingGrant>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct IncomingGrant {
    pub allow: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OutgoingGrant {
    pub application_sid: String,
}

/// Issues voice grants from the configured API key.
#[derive(Clone)]
pub struct GrantIssuer {
    account_sid: Option<String>,
    api_key_sid: Option<String>,
    api_key_secret: Option<String>,
    voice_application_sid: Option<String>,
    ttl: Duration,
}

impl std::fmt::Debug for GrantIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantIssuer")
            .field("account_sid", &self.account_sid)
            .field("api_key_sid", &self.api_key_sid)
            .field(
                "api_key_secret",
                &self.api_key_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("voice_application_sid", &self.voice_application_sid)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

impl GrantIssuer {
    /// Build an issuer. Missing credentials are tolerated here and reported
    /// per request by [`GrantIssuer::issue`].
    pub fn new(carrier: &CarrierConfig, grant: &GrantConfig) -> Self {
        Self {
            account_sid: carrier.account_sid.clone(),
            api_key_sid: grant.api_key_sid.clone(),
            api_key_secret: grant.api_key_secret.clone(),
            voice_application_sid: grant.voice_application_sid.clone(),
            ttl: Duration::seconds(i64::try_from(grant.ttl_secs).unwrap_or(i64::MAX / 2)),
        }
    }

    /// True when every credential needed to sign a grant is present.
    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Issue a grant for the tenant's browser client, valid from now.
    pub fn issue(&self, tenant_id: &TenantId) -> Result<Grant, SwitchboardError> {
        self.issue_at(tenant_id, Utc::now())
    }

    /// Issue a grant as of `now`.
    pub fn issue_at(
        &self,
        tenant_id: &TenantId,
        now: DateTime<Utc>,
    ) -> Result<Grant, SwitchboardError> {
        let (account_sid, api_key_sid, secret) = self.credentials()?;
        let identity = tenant_id.client_identity();
        let iat = now.timestamp();
        let expires_at = now + self.ttl;

        let claims = AccessTokenClaims {
            jti: format!("{api_key_sid}-{iat}"),
            iss: api_key_sid.to_string(),
            sub: account_sid.to_string(),
            iat,
            nbf: iat,
            exp: expires_at.timestamp(),
            grants: Grants {
                identity: identity.clone(),
                voice: VoiceGrant {
                    incoming: IncomingGrant { allow: true },
                    outgoing: self
                        .voice_application_sid
                        .as_ref()
                        .map(|sid| OutgoingGrant {
                            application_sid: sid.clone(),
                        }),
                },
            },
        };

        let mut header = Header::new(Algorithm::HS256);
        header.cty = Some(CONTENT_TYPE.to_string());

        let token = encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| SwitchboardError::Internal(format!("failed to sign grant: {e}")))?;

        tracing::debug!(identity = %identity, expires_at = %expires_at, "issued client grant");

        Ok(Grant {
            token,
            identity,
            expires_at,
        })
    }

    fn credentials(&self) -> Result<(&str, &str, &str), SwitchboardError> {
        let missing = |key: &str| SwitchboardError::Config(format!("{key} is not configured"));
        let account_sid = non_empty(&self.account_sid).ok_or_else(|| missing("carrier.account_sid"))?;
        let api_key_sid = non_empty(&self.api_key_sid).ok_or_else(|| missing("grant.api_key_sid"))?;
        let secret =
            non_empty(&self.api_key_secret).ok_or_else(|| missing("grant.api_key_secret"))?;
        Ok((account_sid, api_key_sid, secret))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};

    fn issuer() -> GrantIssuer {
        let carrier = CarrierConfig {
            account_sid: Some("ACtest".into()),
            auth_token: Some("token".into()),
            ..Default::default()
        };
        let grant = GrantConfig {
            api_key_sid: Some("SKtest".into()),
            api_key_secret: Some("grant-secret".into()),
            voice_application_sid: Some("APtest".into()),
            ttl_secs: 3600,
        };
        GrantIssuer::new(&carrier, &grant)
    }

    #[test]
    fn grant_binds_tenant_identity() {
        let tenant = TenantId::parse("T1").unwrap();
        let grant = issuer().issue(&tenant).unwrap();
        assert_eq!(grant.identity, "user_T1");

        let header = decode_header(&grant.token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.cty.as_deref(), Some(CONTENT_TYPE));

        let data = decode::<AccessTokenClaims>(
            &grant.token,
            &DecodingKey::from_secret(b"grant-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        let claims = data.claims;
        assert_eq!(claims.iss, "SKtest");
        assert_eq!(claims.sub, "ACtest");
        assert_eq!(claims.grants.identity, "user_T1");
        assert!(claims.grants.voice.incoming.allow);
        assert_eq!(
            claims.grants.voice.outgoing.map(|o| o.application_sid),
            Some("APtest".to_string())
        );
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.jti, format!("SKtest-{}", claims.iat));
    }

    #[test]
    fn expiry_follows_ttl() {
        let now = Utc::now();
        let grant = issuer()
            .issue_at(&TenantId::parse("T1").unwrap(), now)
            .unwrap();
        assert_eq!(grant.expires_at, now + Duration::seconds(3600));
    }

    #[test]
    fn missing_secret_fails_closed() {
        let carrier = CarrierConfig {
            account_sid: Some("ACtest".into()),
            ..Default::default()
        };
        let grant = GrantConfig {
            api_key_sid: Some("SKtest".into()),
            api_key_secret: None,
            ..Default::default()
        };
        let issuer = GrantIssuer::new(&carrier, &grant);
        assert!(!issuer.is_configured());
        let err = issuer.issue(&TenantId::parse("T1").unwrap()).unwrap_err();
        assert!(matches!(err, SwitchboardError::Config(ref m) if m.contains("api_key_secret")));
    }

    #[test]
    fn empty_account_sid_counts_as_missing() {
        let carrier = CarrierConfig {
            account_sid: Some(String::new()),
            ..Default::default()
        };
        let grant = GrantConfig {
            api_key_sid: Some("SKtest".into()),
            api_key_secret: Some("s".into()),
            ..Default::default()
        };
        assert!(!GrantIssuer::new(&carrier, &grant).is_configured());
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", issuer());
        assert!(!debug.contains("grant-secret"));
        assert!(debug.contains("[redacted]"));
    }
}
