// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./switchboard.toml` > `~/.config/switchboard/switchboard.toml`
//! > `/etc/switchboard/switchboard.toml` with environment variable overrides via
//! the `SWITCHBOARD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SwitchboardConfig;

/// Config sections addressable through `SWITCHBOARD_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "server",
    "storage",
    "carrier",
    "grant",
    "auth",
    "routing",
    "log",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/switchboard/switchboard.toml` (system-wide)
/// 3. `~/.config/switchboard/switchboard.toml` (user XDG config)
/// 4. `./switchboard.toml` (local directory)
/// 5. `SWITCHBOARD_*` environment variables
pub fn load_config() -> Result<SwitchboardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file("/etc/switchboard/switchboard.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("switchboard/switchboard.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("switchboard.toml"))
        .merge(env_provider())
}

/// Map the first `_` after a known section name to a dot.
///
/// `Env::split("_")` would turn `SWITCHBOARD_CARRIER_AUTH_TOKEN` into
/// `carrier.auth.token`; the key must become `carrier.auth_token`.
fn env_key(raw: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = raw
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    raw.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("SWITCHBOARD_").map(|key| env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_keep_underscores_in_field_names() {
        assert_eq!(env_key("carrier_auth_token"), "carrier.auth_token");
        assert_eq!(env_key("grant_api_key_secret"), "grant.api_key_secret");
        assert_eq!(env_key("server_io_timeout_ms"), "server.io_timeout_ms");
        assert_eq!(env_key("log_level"), "log.level");
        assert_eq!(env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "switchboard.toml",
                r#"
[carrier]
account_sid = "AC-from-file"
"#,
            )?;
            jail.set_env("SWITCHBOARD_CARRIER_AUTH_TOKEN", "tok-from-env");
            jail.set_env("SWITCHBOARD_SERVER_PORT", "9090");

            let config = load_config_from_path(Path::new("switchboard.toml"))?;
            assert_eq!(config.carrier.account_sid.as_deref(), Some("AC-from-file"));
            assert_eq!(config.carrier.auth_token.as_deref(), Some("tok-from-env"));
            assert_eq!(config.server.port, 9090);
            Ok(())
        });
    }
}
