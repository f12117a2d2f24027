// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switchboard - a multi-tenant telephony control plane.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod numbers;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use switchboard_config::{ConfigError, SwitchboardConfig};

use crate::numbers::NumbersCommand;

/// Switchboard - a multi-tenant telephony control plane.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook and API server.
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Manage the number registry directly in the database.
    Numbers {
        #[command(subcommand)]
        action: NumbersCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration, including the credentials `serve` needs.
    Check,
}

fn load_config(path: Option<&std::path::Path>) -> Result<SwitchboardConfig, Vec<ConfigError>> {
    match path {
        Some(path) => switchboard_config::load_and_validate_path(path),
        None => switchboard_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            switchboard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(errors) = switchboard_config::validate_serve_requirements(&config) {
                switchboard_config::render_errors(&errors);
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => match switchboard_config::validate_serve_requirements(&config) {
            Ok(()) => {
                println!(
                    "switchboard: config ok (listen {}:{}, public url {}, database {})",
                    config.server.host,
                    config.server.port,
                    config.server.public_base_url,
                    config.storage.database_path
                );
            }
            Err(errors) => {
                switchboard_config::render_errors(&errors);
                std::process::exit(1);
            }
        },
        Some(Commands::Numbers { action }) => {
            if let Err(e) = numbers::run_numbers(&config, action).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("switchboard: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn parses_numbers_add() {
        let cli = Cli::try_parse_from([
            "switchboard",
            "numbers",
            "add",
            "T1",
            "+15551234567",
            "--voice",
            "--sms",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Numbers {
                action:
                    NumbersCommand::Add {
                        tenant,
                        number,
                        voice,
                        sms,
                        mms,
                        ..
                    },
            }) => {
                assert_eq!(tenant, "T1");
                assert_eq!(number, "+15551234567");
                assert!(voice && sms && !mms);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["switchboard", "config", "check", "--config", "/tmp/sb.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/sb.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommand::Check
            })
        ));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["switchboard", "dial"]).is_err());
    }
}
