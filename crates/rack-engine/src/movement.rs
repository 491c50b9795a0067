//! Append-only movement log for audit and reporting

use chrono::{DateTime, Utc};
use rack_core::{Movement, MovementKind};

/// Append-only record of state-changing operations
///
/// Entries are never mutated or removed; readers only get shared references.
#[derive(Debug, Clone, Default)]
pub struct MovementLog {
    entries: Vec<Movement>,
}

impl MovementLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, movement: Movement) {
        self.entries.push(movement);
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[Movement] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `limit` most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<&Movement> {
        self.entries.iter().rev().take(limit).collect()
    }

    pub fn for_box<'a>(&'a self, box_id: &'a str) -> impl Iterator<Item = &'a Movement> + 'a {
        self.entries
            .iter()
            .filter(move |m| m.box_snapshot.id == box_id)
    }

    pub fn of_kind(&self, kind: MovementKind) -> impl Iterator<Item = &Movement> + '_ {
        self.entries.iter().filter(move |m| m.kind == kind)
    }

    /// Entries recorded at or after `since`
    pub fn since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &Movement> + '_ {
        self.entries.iter().filter(move |m| m.timestamp >= since)
    }
}
