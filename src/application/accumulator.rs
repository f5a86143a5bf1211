//! Identity-keyed message set built up across scroll passes.

use std::collections::HashSet;

use crate::domain::{MessageKey, MessageRecord};

/// Ordered, deduplicated collection of records from one collection run.
#[derive(Debug, Default)]
pub struct Accumulator {
    records: Vec<MessageRecord>,
    seen: HashSet<MessageKey>,
}

impl Accumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the records whose identity is new. Returns how many were added.
    pub fn merge(&mut self, scanned: Vec<MessageRecord>) -> usize {
        let before = self.records.len();
        for record in scanned {
            if self.seen.insert(record.key()) {
                self.records.push(record);
            }
        }
        self.records.len() - before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the set and returns the canonical transcript.
    #[must_use]
    pub fn finalize(self) -> Vec<MessageRecord> {
        let mut records = self.records;
        sort_by_datetime(&mut records);
        records
    }
}

/// Orders records with a parseable `datetime` ascending.
///
/// Records without one stay where they are, so their relative order is never
/// changed; dated records are stably sorted among the remaining positions.
pub fn sort_by_datetime(records: &mut [MessageRecord]) {
    let dated: Vec<usize> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.instant().map(|_| i))
        .collect();

    let mut ordered: Vec<MessageRecord> = dated.iter().map(|&i| records[i].clone()).collect();
    ordered.sort_by_key(MessageRecord::instant);

    for (slot, record) in dated.into_iter().zip(ordered) {
        records[slot] = record;
    }
}
