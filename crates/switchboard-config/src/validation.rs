// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::SwitchboardConfig;

/// Largest permitted webhook I/O bound.
const MAX_IO_TIMEOUT_MS: u64 = 5000;

const GRANT_TTL_RANGE: std::ops::RangeInclusive<u64> = 60..=86_400;

const MAX_CARRIER_RETRIES: u32 = 5;

fn invalid(errors: &mut Vec<ConfigError>, message: String) {
    errors.push(ConfigError::Validation { message });
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &SwitchboardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        invalid(&mut errors, "server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            invalid(
                &mut errors,
                format!("server.host `{host}` is not a valid IP address or hostname"),
            );
        }
    }

    let base = config.server.public_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        invalid(
            &mut errors,
            format!("server.public_base_url `{base}` must start with http:// or https://"),
        );
    }

    if !(1..=MAX_IO_TIMEOUT_MS).contains(&config.server.io_timeout_ms) {
        invalid(
            &mut errors,
            format!(
                "server.io_timeout_ms must be between 1 and {MAX_IO_TIMEOUT_MS}, got {}",
                config.server.io_timeout_ms
            ),
        );
    }

    if config.storage.database_path.trim().is_empty() {
        invalid(
            &mut errors,
            "storage.database_path must not be empty".to_string(),
        );
    }

    if config.carrier.max_retries > MAX_CARRIER_RETRIES {
        invalid(
            &mut errors,
            format!(
                "carrier.max_retries must be at most {MAX_CARRIER_RETRIES}, got {}",
                config.carrier.max_retries
            ),
        );
    }

    if config.carrier.request_timeout_ms == 0 {
        invalid(
            &mut errors,
            "carrier.request_timeout_ms must be greater than 0".to_string(),
        );
    }

    if !GRANT_TTL_RANGE.contains(&config.grant.ttl_secs) {
        invalid(
            &mut errors,
            format!(
                "grant.ttl_secs must be between {} and {}, got {}",
                GRANT_TTL_RANGE.start(),
                GRANT_TTL_RANGE.end(),
                config.grant.ttl_secs
            ),
        );
    }

    let routing = &config.routing;
    for (key, value) in [
        ("client_dial_timeout_secs", routing.client_dial_timeout_secs),
        ("voicemail_timeout_secs", routing.voicemail_timeout_secs),
        ("pstn_dial_timeout_secs", routing.pstn_dial_timeout_secs),
    ] {
        if value == 0 {
            invalid(
                &mut errors,
                format!("routing.{key} must be greater than 0"),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check the credentials `serve` cannot start without.
pub fn validate_serve_requirements(config: &SwitchboardConfig) -> Result<(), Vec<ConfigError>> {
    let required = [
        ("carrier.account_sid", &config.carrier.account_sid),
        ("carrier.auth_token", &config.carrier.auth_token),
        ("auth.session_secret", &config.auth.session_secret),
    ];

    let errors: Vec<ConfigError> = required
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(key, _)| ConfigError::MissingKey {
            key: key.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&SwitchboardConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = SwitchboardConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn io_timeout_is_bounded() {
        let mut config = SwitchboardConfig::default();
        config.server.io_timeout_ms = 30_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "io_timeout_ms"));

        config.server.io_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = SwitchboardConfig::default();
        config.server.public_base_url = "ftp://example.com".into();
        config.grant.ttl_secs = 5;
        config.carrier.max_retries = 50;
        config.routing.client_dial_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_message(&errors, "public_base_url"));
        assert!(has_message(&errors, "ttl_secs"));
        assert!(has_message(&errors, "max_retries"));
        assert!(has_message(&errors, "client_dial_timeout_secs"));
    }

    #[test]
    fn bad_host_fails_validation() {
        let mut config = SwitchboardConfig::default();
        config.server.host = "not a host!".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "server.host"));
    }

    #[test]
    fn serve_requires_carrier_and_session_credentials() {
        let config = SwitchboardConfig::default();
        let errors = validate_serve_requirements(&config).unwrap_err();
        let keys: Vec<String> = errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::MissingKey { key } => Some(key.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                "carrier.account_sid",
                "carrier.auth_token",
                "auth.session_secret"
            ]
        );

        let mut config = SwitchboardConfig::default();
        config.carrier.account_sid = Some("AC123".into());
        config.carrier.auth_token = Some("token".into());
        config.auth.session_secret = Some("secret".into());
        assert!(validate_serve_requirements(&config).is_ok());
    }

    #[test]
    fn routing_section_deserializes_with_defaults() {
        let toml_str = r#"
[routing]
voice = "Polly.Joanna"
record_outbound = false
"#;
        let config: SwitchboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.routing.voice, "Polly.Joanna");
        assert!(!config.routing.record_outbound);
        assert_eq!(config.routing.client_dial_timeout_secs, 20);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn routing_denies_unknown_fields() {
        let toml_str = r#"
[routing]
fallback_number = "+15550000000"
"#;
        assert!(toml::from_str::<SwitchboardConfig>(toml_str).is_err());
    }
}
