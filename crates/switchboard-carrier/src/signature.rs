// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier webhook signature validation.
//!
//! The carrier signs each webhook with HMAC-SHA1 keyed by the account auth
//! token over the full request URL followed by every form parameter's name
//! and value, sorted by name. The base64 digest arrives in
//! `X-Twilio-Signature`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use switchboard_core::SwitchboardError;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

type HmacSha1 = Hmac<Sha1>;

fn signed_mac(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<HmacSha1, SwitchboardError> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .map_err(|e| SwitchboardError::Config(format!("unusable auth token: {e}")))?;

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Ok(mac)
}

/// Compute the expected signature for a webhook request.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<String, SwitchboardError> {
    let mac = signed_mac(auth_token, url, params)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a received signature in constant time.
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> bool {
    let Ok(provided) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    match signed_mac(auth_token, url, params) {
        Ok(mac) => mac.verify_slice(&provided).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://sb.example.com/webhooks/voice";

    fn params() -> Vec<(String, String)> {
        vec![
            ("To".into(), "+15551234567".into()),
            ("CallSid".into(), "CA123".into()),
            ("From".into(), "+15559998888".into()),
        ]
    }

    #[test]
    fn signature_is_order_independent() {
        let mut reversed = params();
        reversed.reverse();
        assert_eq!(
            compute_signature("secret", URL, &params()).unwrap(),
            compute_signature("secret", URL, &reversed).unwrap()
        );
    }

    #[test]
    fn valid_signature_verifies() {
        let sig = compute_signature("secret", URL, &params()).unwrap();
        assert!(verify_signature("secret", URL, &params(), &sig));
    }

    #[test]
    fn tampered_parameter_fails() {
        let sig = compute_signature("secret", URL, &params()).unwrap();
        let mut tampered = params();
        tampered[0].1 = "+15550000000".into();
        assert!(!verify_signature("secret", URL, &tampered, &sig));
    }

    #[test]
    fn wrong_token_or_url_fails() {
        let sig = compute_signature("secret", URL, &params()).unwrap();
        assert!(!verify_signature("other", URL, &params(), &sig));
        assert!(!verify_signature(
            "secret",
            "https://sb.example.com/webhooks/sms",
            &params(),
            &sig
        ));
    }

    #[test]
    fn garbage_signature_fails() {
        assert!(!verify_signature("secret", URL, &params(), "not base64!!"));
        assert!(!verify_signature("secret", URL, &params(), ""));
    }

    #[test]
    fn signature_is_base64_sha1_length() {
        let sig = compute_signature("secret", URL, &[]).unwrap();
        assert_eq!(STANDARD.decode(sig).unwrap().len(), 20);
    }
}
