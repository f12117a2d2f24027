// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity & capability registry queries.

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use switchboard_core::{
    Capabilities, Capability, NewTenantNumber, NumberOwner, NumberStatus, SwitchboardError,
    TenantId, TenantNumber,
};

use crate::database::{Database, map_tr_err};
use crate::queries::enum_col;

const NUMBER_COLUMNS: &str = "id, number, tenant_id, voice, sms, mms, status, carrier_sid,
     voice_url, sms_url, acquired_at, updated_at";

fn row_to_number(row: &rusqlite::Row<'_>) -> rusqlite::Result<TenantNumber> {
    Ok(TenantNumber {
        id: row.get(0)?,
        number: row.get(1)?,
        tenant_id: row.get(2)?,
        capabilities: Capabilities {
            voice: row.get(3)?,
            sms: row.get(4)?,
            mms: row.get(5)?,
        },
        status: enum_col(row, 6)?,
        carrier_sid: row.get(7)?,
        voice_url: row.get(8)?,
        sms_url: row.get(9)?,
        acquired_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn capability_column(capability: Capability) -> &'static str {
    match capability {
        Capability::Voice => "voice",
        Capability::Sms => "sms",
        Capability::Mms => "mms",
    }
}

fn select_by_number(
    conn: &rusqlite::Connection,
    number: &str,
) -> rusqlite::Result<Option<TenantNumber>> {
    conn.query_row(
        &format!("SELECT {NUMBER_COLUMNS} FROM numbers WHERE number = ?1"),
        params![number],
        row_to_number,
    )
    .optional()
}

enum Registration {
    Registered(TenantNumber),
    OwnedElsewhere,
}

/// Record an acquired number, reactivating a released row for the same number.
///
/// Registering a number the tenant already holds keeps its capabilities and
/// only refreshes the carrier SID and callback URLs.
pub async fn register_number(
    db: &Database,
    new: NewTenantNumber,
) -> Result<TenantNumber, SwitchboardError> {
    let number = new.number.as_str().to_string();
    let tenant_id = new.tenant_id.as_str().to_string();
    let caps = new.capabilities;
    let (carrier_sid, voice_url, sms_url) = (new.carrier_sid, new.voice_url, new.sms_url);

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let existing = select_by_number(&tx, &number)?;

            match existing {
                Some(row) if row.status == NumberStatus::Active && row.tenant_id != tenant_id => {
                    return Ok(Registration::OwnedElsewhere);
                }
                Some(row) if row.status == NumberStatus::Active => {
                    // Capabilities are fixed at acquisition; a repeat registration only
                    // refreshes the carrier callbacks.
                    tx.execute(
                        "UPDATE numbers SET carrier_sid = COALESCE(?1, carrier_sid),
                         voice_url = COALESCE(?2, voice_url), sms_url = COALESCE(?3, sms_url),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?4",
                        params![carrier_sid, voice_url, sms_url, row.id],
                    )?;
                }
                Some(row) => {
                    // Released rows are re-acquired, so their acquisition time restarts.
                    tx.execute(
                        "UPDATE numbers SET tenant_id = ?1, voice = ?2, sms = ?3, mms = ?4,
                         status = 'active', carrier_sid = COALESCE(?5, carrier_sid),
                         voice_url = COALESCE(?6, voice_url), sms_url = COALESCE(?7, sms_url),
                         acquired_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?8",
                        params![
                            tenant_id,
                            caps.voice,
                            caps.sms,
                            caps.mms,
                            carrier_sid,
                            voice_url,
                            sms_url,
                            row.id
                        ],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO numbers (number, tenant_id, voice, sms, mms,
                         carrier_sid, voice_url, sms_url)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![
                            number,
                            tenant_id,
                            caps.voice,
                            caps.sms,
                            caps.mms,
                            carrier_sid,
                            voice_url,
                            sms_url
                        ],
                    )?;
                }
            }

            let stored =
                select_by_number(&tx, &number)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(Registration::Registered(stored))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        Registration::Registered(number) => Ok(number),
        Registration::OwnedElsewhere => Err(SwitchboardError::CapabilityDenied {
            number: new.number.to_string(),
            reason: "number is active under another tenant".to_string(),
        }),
    }
}

/// Soft-release a tenant's active number.
pub async fn release_number(
    db: &Database,
    tenant_id: &TenantId,
    number: &str,
) -> Result<TenantNumber, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    let key = number.to_string();
    let released = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE numbers SET status = 'released',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE number = ?1 AND tenant_id = ?2 AND status = 'active'",
                params![key, tenant],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_by_number(conn, &key)
        })
        .await
        .map_err(map_tr_err)?;

    released.ok_or_else(|| SwitchboardError::NotFound {
        entity: "number",
        key: number.to_string(),
    })
}

/// Look up the active owner of a number.
pub async fn resolve_owner(
    db: &Database,
    number: &str,
) -> Result<Option<NumberOwner>, SwitchboardError> {
    let number = number.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT number, tenant_id, voice, sms, mms FROM numbers
                 WHERE number = ?1 AND status = 'active'",
                params![number],
                |row| {
                    Ok(NumberOwner {
                        number: row.get(0)?,
                        tenant_id: TenantId(row.get(1)?),
                        capabilities: Capabilities {
                            voice: row.get(2)?,
                            sms: row.get(3)?,
                            mms: row.get(4)?,
                        },
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Active numbers of a tenant, newest acquisition first.
pub async fn list_numbers(
    db: &Database,
    tenant_id: &TenantId,
) -> Result<Vec<TenantNumber>, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NUMBER_COLUMNS} FROM numbers
                 WHERE tenant_id = ?1 AND status = 'active'
                 ORDER BY acquired_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![tenant], row_to_number)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// The most recently acquired active number of a tenant with `capability`.
pub async fn latest_capable_number(
    db: &Database,
    tenant_id: &TenantId,
    capability: Capability,
) -> Result<Option<TenantNumber>, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    let column = capability_column(capability);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {NUMBER_COLUMNS} FROM numbers
                     WHERE tenant_id = ?1 AND status = 'active' AND {column} = 1
                     ORDER BY acquired_at DESC, id DESC LIMIT 1"
                ),
                params![tenant],
                row_to_number,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Count of a tenant's active numbers.
pub async fn count_active(db: &Database, tenant_id: &TenantId) -> Result<u64, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM numbers WHERE tenant_id = ?1 AND status = 'active'",
                params![tenant],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|count| count as u64)
        .map_err(map_tr_err)
}
