//! Session-scoped query cache.
//!
//! Each [`QueryKey`] owns one slot moving through `Idle → Loading →
//! (Success | Error)`. A successful result is served from the slot until
//! [`QueryCache::invalidate`] marks it stale. Fetches for the same key are
//! serialised, so a reader arriving while a fetch runs waits for it and gets
//! its result instead of starting another.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn todos() -> Self {
        Self::new(["todos"])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

struct Entry<T> {
    state: QueryState<T>,
    stale: bool,
}

struct Slot<T> {
    entry: Mutex<Entry<T>>,
    flight: tokio::sync::Mutex<()>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            entry: Mutex::new(Entry { state: QueryState::Idle, stale: false }),
            flight: tokio::sync::Mutex::new(()),
        }
    }

    fn entry(&self) -> MutexGuard<'_, Entry<T>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct QueryCache<T> {
    slots: Mutex<HashMap<QueryKey, Arc<Slot<T>>>>,
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> QueryCache<T> {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    fn slot(&self, key: &QueryKey) -> Arc<Slot<T>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.clone()).or_insert_with(|| Arc::new(Slot::new())).clone()
    }

    fn existing(&self, key: &QueryKey) -> Option<Arc<Slot<T>>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).cloned()
    }

    pub fn state(&self, key: &QueryKey) -> QueryState<T> {
        self.existing(key)
            .map(|slot| slot.entry().state.clone())
            .unwrap_or(QueryState::Idle)
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.existing(key).is_some_and(|slot| slot.entry().stale)
    }

    /// Marks the cached result stale; the next [`fetch`](Self::fetch) goes to
    /// the server. Returns whether the key had an entry.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        match self.existing(key) {
            Some(slot) => {
                debug!("invalidating query {:?}", key);
                slot.entry().stale = true;
                true
            }
            None => false,
        }
    }

    /// Returns the cached result when it is fresh, otherwise runs `fetcher`
    /// and stores what it yields. Previously loaded data stays visible while
    /// a refetch is in flight.
    pub async fn fetch<F, Fut, E>(&self, key: &QueryKey, fetcher: F) -> QueryState<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let slot = self.slot(key);
        let _flight = slot.flight.lock().await;

        {
            let mut entry = slot.entry();
            let has_data = matches!(entry.state, QueryState::Success(_));
            if has_data && !entry.stale {
                return entry.state.clone();
            }
            if !has_data {
                entry.state = QueryState::Loading;
            }
        }

        debug!("fetching query {:?}", key);
        let next = match fetcher().await {
            Ok(data) => QueryState::Success(data),
            Err(e) => QueryState::Error(e.to_string()),
        };

        let mut entry = slot.entry();
        entry.state = next.clone();
        entry.stale = false;
        next
    }

    /// Drops every entry, e.g. when the session ends.
    pub fn clear(&self) {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
