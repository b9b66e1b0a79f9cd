//! Append-only journal of accepted turns.
//!
//! Each accepted turn produces exactly one [`TurnRecord`], keyed by the
//! tick the turn advanced the clock to. Records are never mutated or
//! removed.

use std::collections::BTreeMap;

use dopewars_types::{TurnRecord, UserId};

/// In-memory turn journal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnJournal {
    records: BTreeMap<u64, TurnRecord>,
}

impl TurnJournal {
    /// Create an empty journal.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Append a record.
    ///
    /// Ticks come from the game clock, so each append carries a tick
    /// strictly greater than every earlier one. A record whose tick is
    /// already present is ignored and returned.
    pub fn record(&mut self, record: TurnRecord) -> Option<TurnRecord> {
        if self.records.contains_key(&record.tick) {
            return Some(record);
        }
        self.records.insert(record.tick, record);
        None
    }

    /// The record produced at `tick`.
    pub fn get(&self, tick: u64) -> Option<&TurnRecord> {
        self.records.get(&tick)
    }

    /// The most recent record.
    pub fn latest(&self) -> Option<&TurnRecord> {
        self.records.values().next_back()
    }

    /// All records by one player, oldest first.
    pub fn turns_for_user(&self, user: UserId) -> impl Iterator<Item = &TurnRecord> + '_ {
        self.records
            .values()
            .filter(move |record| record.request.user == user)
    }

    /// All records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TurnRecord> + '_ {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no turn has been accepted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
