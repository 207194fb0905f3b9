//! The streaming query cursor.

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use stratum_core::query::eval;
use stratum_core::{HashKey, OrderByClause, Record, Result, Select, SharedCatalog, hash_key};

/// Lazy cursor over the committed candidates of one query.
///
/// Pull driven: with no ordering clauses the predicate runs per pull and
/// the limit window applies during the scan; with ordering clauses the
/// first pull materializes every match, sorts by the declared clauses
/// (first clause primary), and slices. Either way, each yielded record is
/// re-staged into the connection's staged-insert map: the write-back
/// coupling that marks pulled records as seen.
pub(crate) struct MemoryRows {
    catalog: SharedCatalog,
    staged: Arc<Mutex<HashMap<HashKey, Record>>>,
    select: Select,
    candidates: std::vec::IntoIter<Record>,
    ordered: Option<std::vec::IntoIter<Record>>,
    match_index: usize,
    done: bool,
}

impl MemoryRows {
    pub(crate) fn new(
        catalog: SharedCatalog,
        staged: Arc<Mutex<HashMap<HashKey, Record>>>,
        select: Select,
        candidates: Vec<Record>,
    ) -> Self {
        Self {
            catalog,
            staged,
            select,
            candidates: candidates.into_iter(),
            ordered: None,
            match_index: 0,
            done: false,
        }
    }

    /// Record the yielded record into the staged-insert map.
    fn restage(&self, record: &Record) -> Result<()> {
        let key = hash_key(&self.catalog, record)?;
        self.staged.lock().insert(key, record.clone());
        Ok(())
    }

    fn next_streaming(&mut self) -> Option<Result<Record>> {
        let limit = self.select.limit();
        #[allow(clippy::while_let_on_iterator)]
        while let Some(record) = self.candidates.next() {
            if !eval::matches(self.select.predicate(), &record) {
                continue;
            }
            let position = self.match_index;
            self.match_index += 1;
            if let Some(window) = limit {
                if window.end.is_some_and(|end| position >= end) {
                    self.done = true;
                    return None;
                }
                if !window.contains(position) {
                    continue;
                }
            }
            if let Err(e) = self.restage(&record) {
                return Some(Err(e));
            }
            return Some(Ok(record));
        }
        self.done = true;
        None
    }

    fn next_ordered(&mut self) -> Option<Result<Record>> {
        if self.ordered.is_none() {
            let mut matched: Vec<Record> = self
                .candidates
                .by_ref()
                .filter(|record| eval::matches(self.select.predicate(), record))
                .collect();
            sort_records(&mut matched, self.select.order_by());

            if let Some(window) = self.select.limit() {
                let end = window.end.unwrap_or(matched.len()).min(matched.len());
                let start = window.start.min(end);
                matched = matched[start..end].to_vec();
            }
            self.ordered = Some(matched.into_iter());
        }

        let record = self.ordered.as_mut()?.next()?;
        if let Err(e) = self.restage(&record) {
            return Some(Err(e));
        }
        Some(Ok(record))
    }
}

impl Iterator for MemoryRows {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.select.order_by().is_empty() {
            self.next_streaming()
        } else {
            self.next_ordered()
        }
    }
}

/// Stable sort by the declared clauses: the first clause is the primary
/// key, later clauses only order what earlier clauses left equal.
fn sort_records(records: &mut [Record], clauses: &[OrderByClause]) {
    records.sort_by(|a, b| {
        for clause in clauses {
            let ordering = a
                .field_value(&clause.field)
                .compare(&b.field_value(&clause.field))
                .unwrap_or(Ordering::Equal);
            let ordering = if clause.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
