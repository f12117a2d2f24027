// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard numbers` command implementation.
//!
//! Records acquired numbers in the registry, releases them and lists a
//! tenant's numbers. Purchasing numbers from the carrier happens elsewhere.

use clap::Subcommand;

use switchboard_config::SwitchboardConfig;
use switchboard_core::{
    Capabilities, NewTenantNumber, PhoneNumber, PluginAdapter, StorageAdapter, SwitchboardError,
    TenantId, TenantNumber,
};
use switchboard_storage::SqliteStorage;

#[derive(Subcommand, Debug)]
pub enum NumbersCommand {
    /// Record a number acquired from the carrier.
    Add {
        /// Owning tenant id.
        tenant: String,
        /// E.164 number, e.g. +15551234567.
        number: String,
        #[arg(long)]
        voice: bool,
        #[arg(long)]
        sms: bool,
        #[arg(long)]
        mms: bool,
        /// Carrier's id for the number (PN...).
        #[arg(long)]
        carrier_sid: Option<String>,
    },
    /// Release a number; its history is kept.
    Release { tenant: String, number: String },
    /// List a tenant's numbers.
    List { tenant: String },
}

pub async fn run_numbers(
    config: &SwitchboardConfig,
    command: NumbersCommand,
) -> Result<(), SwitchboardError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let result = execute(&storage, command).await;
    storage.shutdown().await?;

    for line in result? {
        println!("{line}");
    }
    Ok(())
}

async fn execute(
    storage: &dyn StorageAdapter,
    command: NumbersCommand,
) -> Result<Vec<String>, SwitchboardError> {
    match command {
        NumbersCommand::Add {
            tenant,
            number,
            voice,
            sms,
            mms,
            carrier_sid,
        } => {
            if !(voice || sms || mms) {
                return Err(SwitchboardError::InvalidInput(
                    "give at least one of --voice, --sms, --mms".into(),
                ));
            }
            let added = storage
                .register_number(NewTenantNumber {
                    number: PhoneNumber::parse(&number)?,
                    tenant_id: TenantId::parse(&tenant)?,
                    capabilities: Capabilities { voice, sms, mms },
                    carrier_sid,
                    voice_url: None,
                    sms_url: None,
                })
                .await?;
            Ok(vec![format!("added {}", describe(&added))])
        }
        NumbersCommand::Release { tenant, number } => {
            let released = storage
                .release_number(&TenantId::parse(&tenant)?, PhoneNumber::parse(&number)?.as_str())
                .await?;
            Ok(vec![format!("released {}", released.number)])
        }
        NumbersCommand::List { tenant } => {
            let numbers = storage.list_numbers(&TenantId::parse(&tenant)?).await?;
            if numbers.is_empty() {
                return Ok(vec![format!("tenant {tenant} has no numbers")]);
            }
            Ok(numbers.iter().map(describe).collect())
        }
    }
}

fn describe(number: &TenantNumber) -> String {
    let caps = &number.capabilities;
    let flags: Vec<&str> = [(caps.voice, "voice"), (caps.sms, "sms"), (caps.mms, "mms")]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
    format!(
        "{} tenant={} status={} capabilities={}",
        number.number,
        number.tenant_id,
        number.status,
        flags.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage(dir: &tempfile::TempDir) -> SqliteStorage {
        let mut config = SwitchboardConfig::default();
        config.storage.database_path = dir.path().join("numbers.db").to_string_lossy().into_owned();
        let storage = SqliteStorage::new(config.storage);
        storage.initialize().await.unwrap();
        storage
    }

    fn add(tenant: &str, number: &str) -> NumbersCommand {
        NumbersCommand::Add {
            tenant: tenant.into(),
            number: number.into(),
            voice: true,
            sms: false,
            mms: false,
            carrier_sid: None,
        }
    }

    #[tokio::test]
    async fn add_list_release() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;

        let out = execute(&storage, add("T1", "+15551234567")).await.unwrap();
        assert_eq!(
            out,
            vec!["added +15551234567 tenant=T1 status=active capabilities=voice"]
        );

        let out = execute(&storage, NumbersCommand::List { tenant: "T1".into() })
            .await
            .unwrap();
        assert_eq!(out.len(), 1);

        let out = execute(
            &storage,
            NumbersCommand::Release {
                tenant: "T1".into(),
                number: "+15551234567".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, vec!["released +15551234567"]);
    }

    #[tokio::test]
    async fn add_requires_a_capability() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        let command = NumbersCommand::Add {
            tenant: "T1".into(),
            number: "+15551234567".into(),
            voice: false,
            sms: false,
            mms: false,
            carrier_sid: None,
        };
        assert!(matches!(
            execute(&storage, command).await,
            Err(SwitchboardError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn release_by_other_tenant_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        execute(&storage, add("T1", "+15551234567")).await.unwrap();
        let result = execute(
            &storage,
            NumbersCommand::Release {
                tenant: "T2".into(),
                number: "+15551234567".into(),
            },
        )
        .await;
        assert!(matches!(result, Err(SwitchboardError::NotFound { .. })));
    }
}
