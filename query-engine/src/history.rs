//! Bounded, in-memory log of answered queries.
//!
//! Entries are kept in arrival order inside a ring of [`HISTORY_CAPACITY`]
//! slots; the oldest arrival is evicted first. Every operation holds the
//! same lock for its whole duration, so a page and its `total_count`
//! always describe the same snapshot.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::query::Query;

pub const HISTORY_CAPACITY: usize = 100;

/// One page of history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub queries: Vec<Query>,
    /// Number of stored entries before pagination.
    pub total_count: usize,
}

#[derive(Debug)]
struct Entry {
    /// Arrival sequence number; breaks timestamp ties.
    seq: u64,
    query: Query,
}

#[derive(Debug, Default)]
struct Ring {
    entries: VecDeque<Entry>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    inner: Mutex<Ring>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `query` and returns the entry evicted to make room, if any.
    pub async fn append(&self, query: Query) -> Option<Query> {
        let mut ring = self.inner.lock().await;

        let seq = ring.next_seq;
        ring.next_seq += 1;
        ring.entries.push_back(Entry { seq, query });

        if ring.entries.len() > HISTORY_CAPACITY {
            let evicted = ring.entries.pop_front().map(|e| e.query);
            if let Some(old) = &evicted {
                debug!(evicted_id = %old.id, "history full, evicted oldest query");
            }
            evicted
        } else {
            None
        }
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        let mut ring = self.inner.lock().await;
        let dropped = ring.entries.len();
        ring.entries.clear();
        debug!(dropped, "history cleared");
    }

    /// Returns `limit` entries starting at `offset`, ordered by timestamp
    /// descending. Equal timestamps list the later arrival first.
    pub async fn list(&self, limit: usize, offset: usize) -> HistoryPage {
        let ring = self.inner.lock().await;
        let total_count = ring.entries.len();

        let mut ordered: Vec<&Entry> = ring.entries.iter().collect();
        ordered.sort_by(|a, b| {
            b.query
                .timestamp
                .cmp(&a.query.timestamp)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        let queries = ordered
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| e.query.clone())
            .collect();

        HistoryPage {
            queries,
            total_count,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
