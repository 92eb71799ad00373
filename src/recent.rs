//! Most-recently-used list of the user's own queries

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How many recent queries are kept.
pub const RECENT_QUERY_LIMIT: usize = 5;

/// Bounded, de-duplicated, most-recent-first list of prior queries.
/// Cloning yields another handle to the same list.
#[derive(Clone, Default)]
pub struct RecentQueryCache {
    entries: Arc<Mutex<VecDeque<String>>>,
}

impl RecentQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `query` to the front, dropping any older copy and the oldest
    /// entry once the list is full.
    pub fn record(&self, query: &str) {
        let mut entries = self.lock();
        if let Some(pos) = entries.iter().position(|entry| entry == query) {
            entries.remove(pos);
        }
        entries.push_front(query.to_string());
        entries.truncate(RECENT_QUERY_LIMIT);
    }

    /// Hand back a cached query so the caller can stage it as pending input.
    /// Neither the list order nor the conversation is touched.
    pub fn select(&self, query: &str) -> Option<String> {
        self.lock().iter().find(|entry| *entry == query).cloned()
    }

    pub fn get(&self, index: usize) -> Option<String> {
        self.lock().get(index).cloned()
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
