// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call ledger: atomic upsert by carrier call id.

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use switchboard_core::{
    ApplyOutcome, CallRecord, CallStatusEvent, IgnoreReason, LedgerWrite, Merge, Ownership,
    SwitchboardError, TenantId, merge_call,
};

use crate::database::{Database, map_tr_err};
use crate::queries::enum_col;

const CALL_COLUMNS: &str = "id, call_sid, tenant_id, from_number, to_number, direction, status,
     duration_secs, recording_url, price, answered_by, created_at, updated_at";

fn row_to_call(row: &rusqlite::Row<'_>) -> rusqlite::Result<CallRecord> {
    Ok(CallRecord {
        id: row.get(0)?,
        call_sid: row.get(1)?,
        tenant_id: row.get(2)?,
        from_number: row.get(3)?,
        to_number: row.get(4)?,
        direction: enum_col(row, 5)?,
        status: enum_col(row, 6)?,
        duration_secs: row.get(7)?,
        recording_url: row.get(8)?,
        price: row.get(9)?,
        answered_by: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn select_by_sid(conn: &rusqlite::Connection, sid: &str) -> rusqlite::Result<Option<CallRecord>> {
    conn.query_row(
        &format!("SELECT {CALL_COLUMNS} FROM calls WHERE call_sid = ?1"),
        params![sid],
        row_to_call,
    )
    .optional()
}

fn reselect(conn: &rusqlite::Connection, sid: &str) -> rusqlite::Result<CallRecord> {
    select_by_sid(conn, sid)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Apply a call status event inside one IMMEDIATE transaction.
///
/// Concurrent deliveries of the same call id serialize on the write lock, so
/// the read-merge-write below never produces a second row or loses a field.
pub async fn apply_call_event(
    db: &Database,
    event: CallStatusEvent,
    ownership: Option<Ownership>,
) -> Result<LedgerWrite<CallRecord>, SwitchboardError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let sid = event.call_sid.as_str();

            let write = match select_by_sid(&tx, sid)? {
                None => match (event.status, ownership) {
                    (Some(status), Some(owner)) => {
                        tx.execute(
                            "INSERT INTO calls (call_sid, tenant_id, from_number, to_number,
                             direction, status, duration_secs, recording_url, price, answered_by)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                            params![
                                sid,
                                owner.tenant_id.as_str(),
                                event.from,
                                event.to,
                                owner.direction.to_string(),
                                status.to_string(),
                                event.duration_secs,
                                event.recording_url,
                                event.price,
                                event.answered_by,
                            ],
                        )?;
                        LedgerWrite {
                            outcome: ApplyOutcome::Applied { created: true },
                            record: Some(reselect(&tx, sid)?),
                        }
                    }
                    _ => LedgerWrite::not_found(),
                },
                Some(current) => match merge_call(&current, &event) {
                    Merge::Stale => LedgerWrite {
                        outcome: ApplyOutcome::Ignored(IgnoreReason::Stale),
                        record: Some(current),
                    },
                    Merge::Unchanged => LedgerWrite {
                        outcome: ApplyOutcome::Ignored(IgnoreReason::Duplicate),
                        record: Some(current),
                    },
                    Merge::Changed(next) => {
                        tx.execute(
                            "UPDATE calls SET from_number = ?1, to_number = ?2, status = ?3,
                             duration_secs = ?4, recording_url = ?5, price = ?6, answered_by = ?7,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE id = ?8",
                            params![
                                next.from_number,
                                next.to_number,
                                next.status.to_string(),
                                next.duration_secs,
                                next.recording_url,
                                next.price,
                                next.answered_by,
                                next.id,
                            ],
                        )?;
                        LedgerWrite {
                            outcome: ApplyOutcome::Applied { created: false },
                            record: Some(reselect(&tx, sid)?),
                        }
                    }
                },
            };

            tx.commit()?;
            Ok(write)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a call by carrier call id, regardless of tenant.
pub async fn get_call(db: &Database, call_sid: &str) -> Result<Option<CallRecord>, SwitchboardError> {
    let sid = call_sid.to_string();
    db.connection()
        .call(move |conn| select_by_sid(conn, &sid))
        .await
        .map_err(map_tr_err)
}

/// A tenant's calls, newest first.
pub async fn list_calls(
    db: &Database,
    tenant_id: &TenantId,
    limit: u32,
) -> Result<Vec<CallRecord>, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CALL_COLUMNS} FROM calls WHERE tenant_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![tenant, limit], row_to_call)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of a tenant's calls created at or after `since`.
pub async fn count_since(
    db: &Database,
    tenant_id: &TenantId,
    since: &str,
) -> Result<u64, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    let since = since.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM calls WHERE tenant_id = ?1 AND created_at >= ?2",
                params![tenant, since],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|count| count as u64)
        .map_err(map_tr_err)
}
