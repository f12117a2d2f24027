// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status lattice for call and message records.
//!
//! Carrier callbacks arrive unordered and may be redelivered. Acceptance is
//! governed by status precedence rather than arrival order: an update whose
//! status ranks below the stored one is stale, one of equal rank can only
//! backfill fields, and one of higher rank advances the record. A populated
//! field is never cleared by a later event that omits it.

use crate::types::{CallRecord, CallStatus, CallStatusEvent, MessageRecord, MessageStatus, MessageStatusEvent};

/// Result of merging an event into a stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum Merge<T> {
    /// The event's status is behind the stored status; nothing changes.
    Stale,
    /// The event carries nothing new.
    Unchanged,
    /// The merged record to persist.
    Changed(T),
}

impl CallStatus {
    /// Position in `initiated < ringing < in-progress < terminal`.
    pub fn rank(self) -> u8 {
        match self {
            CallStatus::Queued | CallStatus::Initiated => 0,
            CallStatus::Ringing => 1,
            CallStatus::InProgress => 2,
            CallStatus::Completed
            | CallStatus::Busy
            | CallStatus::NoAnswer
            | CallStatus::Failed
            | CallStatus::Canceled => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 3
    }
}

impl MessageStatus {
    pub fn rank(self) -> u8 {
        match self {
            MessageStatus::Accepted | MessageStatus::Scheduled => 0,
            MessageStatus::Queued => 1,
            MessageStatus::Sending | MessageStatus::Receiving => 2,
            MessageStatus::Sent => 3,
            MessageStatus::Delivered
            | MessageStatus::Undelivered
            | MessageStatus::Failed
            | MessageStatus::Canceled
            | MessageStatus::Received
            | MessageStatus::Read => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 4
    }
}

/// Replace `slot` with `incoming` only when the incoming value is present.
fn fill<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) {
    if let Some(value) = incoming {
        *slot = Some(value.clone());
    }
}

fn max_duration(stored: Option<i64>, incoming: Option<i64>) -> Option<i64> {
    match (stored, incoming) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Merge a call status event into the stored record.
pub fn merge_call(current: &CallRecord, event: &CallStatusEvent) -> Merge<CallRecord> {
    let mut next = current.clone();
    let current_rank = current.status.rank();

    // A terminal record only accepts duration, price and recording backfill.
    let mut backfill_only = current.status.is_terminal();

    match event.status {
        Some(status) if status.rank() < current_rank => return Merge::Stale,
        Some(status) if status.rank() > current_rank => {
            next.status = status;
            backfill_only = false;
        }
        Some(_) => {}
        None => backfill_only = true,
    }

    next.duration_secs = max_duration(current.duration_secs, event.duration_secs);
    fill(&mut next.price, &event.price);
    fill(&mut next.recording_url, &event.recording_url);

    if !backfill_only {
        fill(&mut next.answered_by, &event.answered_by);
        fill(&mut next.from_number, &event.from);
        fill(&mut next.to_number, &event.to);
    }

    if next == *current {
        Merge::Unchanged
    } else {
        Merge::Changed(next)
    }
}

/// Merge a message status event into the stored record.
pub fn merge_message(current: &MessageRecord, event: &MessageStatusEvent) -> Merge<MessageRecord> {
    let mut next = current.clone();
    let current_rank = current.status.rank();
    let mut backfill_only = current.status.is_terminal();

    match event.status {
        Some(status) if status.rank() < current_rank => return Merge::Stale,
        Some(status) if status.rank() > current_rank => {
            next.status = status;
            backfill_only = false;
        }
        Some(_) => {}
        None => backfill_only = true,
    }

    fill(&mut next.price, &event.price);

    if !backfill_only {
        if let Some(body) = event.body.as_ref().filter(|b| !b.is_empty()) {
            next.body = body.clone();
        }
        if let Some(from) = &event.from {
            next.from_number = from.clone();
        }
        if let Some(to) = &event.to {
            next.to_number = to.clone();
        }
    }

    if next == *current {
        Merge::Unchanged
    } else {
        Merge::Changed(next)
    }
}
