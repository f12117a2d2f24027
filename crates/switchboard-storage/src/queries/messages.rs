// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message ledger and the derived conversation view.

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use switchboard_core::{
    ApplyOutcome, Conversation, Direction, IgnoreReason, LedgerWrite, Merge, MessageRecord,
    MessageStatusEvent, Ownership, SwitchboardError, TenantId, merge_message,
};

use crate::database::{Database, map_tr_err};
use crate::queries::enum_col;

const MESSAGE_COLUMNS: &str = "id, message_sid, tenant_id, from_number, to_number, body,
     direction, status, is_read, price, created_at, updated_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        id: row.get(0)?,
        message_sid: row.get(1)?,
        tenant_id: row.get(2)?,
        from_number: row.get(3)?,
        to_number: row.get(4)?,
        body: row.get(5)?,
        direction: enum_col(row, 6)?,
        status: enum_col(row, 7)?,
        is_read: row.get(8)?,
        price: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn select_by_sid(
    conn: &rusqlite::Connection,
    sid: &str,
) -> rusqlite::Result<Option<MessageRecord>> {
    conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_sid = ?1"),
        params![sid],
        row_to_message,
    )
    .optional()
}

fn reselect(conn: &rusqlite::Connection, sid: &str) -> rusqlite::Result<MessageRecord> {
    select_by_sid(conn, sid)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Apply a message status event inside one IMMEDIATE transaction.
///
/// New inbound rows start unread; outbound rows are always read.
pub async fn apply_message_event(
    db: &Database,
    event: MessageStatusEvent,
    ownership: Option<Ownership>,
) -> Result<LedgerWrite<MessageRecord>, SwitchboardError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let sid = event.message_sid.as_str();

            let write = match select_by_sid(&tx, sid)? {
                None => match (event.status, ownership) {
                    (Some(status), Some(owner)) => {
                        let from = event.from.clone().unwrap_or_default();
                        let to = event.to.clone().unwrap_or_default();
                        let counterpart = match owner.direction {
                            Direction::Inbound => from.clone(),
                            Direction::Outbound => to.clone(),
                        };
                        tx.execute(
                            "INSERT INTO messages (message_sid, tenant_id, from_number, to_number,
                             counterpart, body, direction, status, is_read, price)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                            params![
                                sid,
                                owner.tenant_id.as_str(),
                                from,
                                to,
                                counterpart,
                                event.body.clone().unwrap_or_default(),
                                owner.direction.to_string(),
                                status.to_string(),
                                owner.direction == Direction::Outbound,
                                event.price,
                            ],
                        )?;
                        LedgerWrite {
                            outcome: ApplyOutcome::Applied { created: true },
                            record: Some(reselect(&tx, sid)?),
                        }
                    }
                    _ => LedgerWrite::not_found(),
                },
                Some(current) => match merge_message(&current, &event) {
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
                            "UPDATE messages SET from_number = ?1, to_number = ?2,
                             counterpart = ?3, body = ?4, status = ?5, price = ?6,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE id = ?7",
                            params![
                                next.from_number,
                                next.to_number,
                                next.counterpart(),
                                next.body,
                                next.status.to_string(),
                                next.price,
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

/// A tenant's messages, newest first.
pub async fn list_messages(
    db: &Database,
    tenant_id: &TenantId,
    limit: u32,
) -> Result<Vec<MessageRecord>, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE tenant_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![tenant, limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Conversations derived from the message table, most recent activity first.
pub async fn list_conversations(
    db: &Database,
    tenant_id: &TenantId,
) -> Result<Vec<Conversation>, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT m.counterpart, m.body, m.direction, m.created_at,
                    (SELECT COUNT(*) FROM messages c
                      WHERE c.tenant_id = m.tenant_id AND c.counterpart = m.counterpart),
                    (SELECT COUNT(*) FROM messages u
                      WHERE u.tenant_id = m.tenant_id AND u.counterpart = m.counterpart
                        AND u.direction = 'inbound' AND u.is_read = 0)
                 FROM messages m
                 WHERE m.tenant_id = ?1
                   AND m.id = (SELECT l.id FROM messages l
                                WHERE l.tenant_id = m.tenant_id AND l.counterpart = m.counterpart
                                ORDER BY l.created_at DESC, l.id DESC LIMIT 1)
                 ORDER BY m.created_at DESC, m.id DESC",
            )?;
            let rows = stmt.query_map(params![tenant], |row| {
                Ok(Conversation {
                    counterpart: row.get(0)?,
                    last_message: row.get(1)?,
                    last_direction: enum_col(row, 2)?,
                    last_message_at: row.get(3)?,
                    message_count: row.get(4)?,
                    unread_count: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages exchanged with one counterpart, oldest first.
pub async fn list_conversation(
    db: &Database,
    tenant_id: &TenantId,
    counterpart: &str,
) -> Result<Vec<MessageRecord>, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    let counterpart = counterpart.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE tenant_id = ?1 AND counterpart = ?2
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![tenant, counterpart], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a conversation's inbound messages read.
pub async fn mark_conversation_read(
    db: &Database,
    tenant_id: &TenantId,
    counterpart: &str,
) -> Result<u64, SwitchboardError> {
    let tenant = tenant_id.as_str().to_string();
    let counterpart = counterpart.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET is_read = 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE tenant_id = ?1 AND counterpart = ?2
                   AND direction = 'inbound' AND is_read = 0",
                params![tenant, counterpart],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed as u64)
}

/// Number of a tenant's messages created at or after `since`.
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
                "SELECT COUNT(*) FROM messages WHERE tenant_id = ?1 AND created_at >= ?2",
                params![tenant, since],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|count| count as u64)
        .map_err(map_tr_err)
}
