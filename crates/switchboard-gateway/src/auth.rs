// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for the application API.
//!
//! Session tokens are HS256 JWTs issued by the external account service; the
//! `userId` claim names the tenant. When no session secret is configured
//! every request is rejected (fail-closed).

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use switchboard_core::{SwitchboardError, TenantId};

use crate::error::ApiError;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub exp: i64,
}

/// Session token verifier.
#[derive(Clone)]
pub struct SessionAuth {
    secret: Option<String>,
}

impl std::fmt::Debug for SessionAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuth")
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl SessionAuth {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Verify a token and return the tenant it was issued to.
    pub fn verify(&self, token: &str) -> Result<TenantId, SwitchboardError> {
        let Some(secret) = &self.secret else {
            tracing::error!("no session secret configured -- rejecting request");
            return Err(SwitchboardError::Unauthorized(
                "authentication is not configured".into(),
            ));
        };
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| SwitchboardError::Unauthorized(format!("invalid session token: {e}")))?;
        TenantId::parse(&data.claims.user_id)
            .map_err(|_| SwitchboardError::Unauthorized("session names an invalid tenant".into()))
    }

    /// Sign a session token for `tenant_id`, as the account service would.
    pub fn issue(&self, tenant_id: &TenantId, ttl_secs: i64) -> Result<String, SwitchboardError> {
        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| SwitchboardError::Config("auth.session_secret is not configured".into()))?;
        let claims = SessionClaims {
            user_id: tenant_id.to_string(),
            exp: chrono::Utc::now().timestamp() + ttl_secs,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| SwitchboardError::Internal(format!("failed to sign session token: {e}")))
    }
}

/// Middleware that authenticates `Authorization: Bearer <token>` and stores
/// the caller's [`TenantId`] as a request extension.
pub async fn session_middleware(
    State(auth): State<SessionAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| SwitchboardError::Unauthorized("missing bearer token".into()))?;

    let tenant_id = auth.verify(token.trim())?;
    request.extensions_mut().insert(tenant_id);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let auth = SessionAuth::new(Some("s3cret".into()));
        let tenant = TenantId::parse("T1").unwrap();
        let token = auth.issue(&tenant, 60).unwrap();
        assert_eq!(auth.verify(&token).unwrap(), tenant);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = SessionAuth::new(Some("other".into()));
        let token = issuer.issue(&TenantId::parse("T1").unwrap(), 60).unwrap();
        let auth = SessionAuth::new(Some("s3cret".into()));
        assert!(matches!(
            auth.verify(&token),
            Err(SwitchboardError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = SessionAuth::new(Some("s3cret".into()));
        let token = auth.issue(&TenantId::parse("T1").unwrap(), -3600).unwrap();
        assert!(auth.verify(&token).is_err());
    }

    #[test]
    fn missing_secret_fails_closed() {
        let auth = SessionAuth::new(Some(String::new()));
        assert!(auth.verify("anything").is_err());
        assert!(auth.issue(&TenantId::parse("T1").unwrap(), 60).is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let auth = SessionAuth::new(Some("s3cret".into()));
        assert!(!format!("{auth:?}").contains("s3cret"));
    }
}
