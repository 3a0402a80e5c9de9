//! Bounded view over observed DNS queries.

use std::collections::VecDeque;

use crate::types::QueryLogEntry;

/// Entries kept when no capacity is given
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Page size when no limit is given
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Newest-first buffer of query log entries; the oldest entry is evicted when full
#[derive(Debug, Clone)]
pub struct QueryLog {
    entries: VecDeque<QueryLogEntry>,
    capacity: usize,
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl QueryLog {
    /// Empty log holding at most `capacity` entries (minimum 1)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
            capacity,
        }
    }

    /// Record a new entry at the front
    pub fn push(&mut self, entry: QueryLogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    /// Entries whose domain contains `filter` (case-insensitive), newest first.
    ///
    /// An empty filter matches everything. `limit` defaults to
    /// [`DEFAULT_PAGE_LIMIT`].
    pub fn query<'a>(
        &'a self,
        filter: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> impl Iterator<Item = &'a QueryLogEntry> + 'a {
        let needle = filter.trim().to_lowercase();
        self.entries
            .iter()
            .filter(move |e| needle.is_empty() || e.domain.to_lowercase().contains(&needle))
            .skip(offset)
            .take(limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    }

    /// Look up an entry by id
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&QueryLogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Number of entries held
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries held
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Extend<QueryLogEntry> for QueryLog {
    fn extend<I: IntoIterator<Item = QueryLogEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry);
        }
    }
}
