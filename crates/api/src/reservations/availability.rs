//! Decides whether a set of tables is free for a requested interval.
//!
//! Intervals are half-open: `[from, to)`. A booking ending at 13:00 does not
//! collide with one starting at 13:00.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use infra::models::BookedSlotRow;
use infra::repos::reservations;

use super::error::ReservationError;

/// `[candidate_from, candidate_to)` and `[existing_from, existing_to)` share
/// at least one instant.
pub fn is_overlapping(
    candidate_from: DateTime<Utc>,
    candidate_to: DateTime<Utc>,
    existing_from: DateTime<Utc>,
    existing_to: DateTime<Utc>,
) -> bool {
    candidate_from < existing_to && existing_from < candidate_to
}

/// Existing reservations blocking a request, grouped by the table they block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Conflicts {
    by_table: BTreeMap<Uuid, BTreeSet<Uuid>>,
}

impl Conflicts {
    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty()
    }

    /// Tables that are unavailable, in ascending id order.
    pub fn tables(&self) -> Vec<Uuid> {
        self.by_table.keys().copied().collect()
    }

    /// Union of all reservations blocking any requested table.
    pub fn reservations(&self) -> BTreeSet<Uuid> {
        self.by_table.values().flatten().copied().collect()
    }

    pub fn reservations_on(&self, table_id: Uuid) -> Option<&BTreeSet<Uuid>> {
        self.by_table.get(&table_id)
    }

    pub fn into_result(self) -> Result<(), ReservationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ReservationError::Conflict {
                tables: self.tables(),
            })
        }
    }

    fn insert(&mut self, table_id: Uuid, reservation_id: Uuid) {
        self.by_table
            .entry(table_id)
            .or_default()
            .insert(reservation_id);
    }
}

/// Evaluate every booked slot against the request, per table. Slots on
/// tables outside `tables` are ignored.
pub fn collect_conflicts(
    tables: &BTreeSet<Uuid>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    booked: &[BookedSlotRow],
) -> Conflicts {
    let mut conflicts = Conflicts::default();

    for slot in booked {
        if tables.contains(&slot.table_id)
            && is_overlapping(from, to, slot.reservation_from, slot.reservation_to)
        {
            conflicts.insert(slot.table_id, slot.reservation_id);
        }
    }

    conflicts
}

/// Look up every reservation holding one of `tables` during `[from, to)`.
///
/// Run this inside the transaction that inserts the new reservation, after
/// the table locks are taken, so the answer is still true at commit time.
pub async fn find_conflicting_reservations<'e>(
    executor: impl PgExecutor<'e>,
    tables: &BTreeSet<Uuid>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Conflicts, sqlx::Error> {
    let table_ids: Vec<Uuid> = tables.iter().copied().collect();
    let booked = reservations::find_overlapping(executor, &table_ids, from, to).await?;

    Ok(collect_conflicts(tables, from, to, &booked))
}
