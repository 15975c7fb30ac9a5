//! Key to entry store with exclusive-start claims.
//!
//! Each key owns a `watch` channel that acts as a key-scoped condition
//! variable: waiters subscribe while the load is pending and wake exactly
//! once, when the winner completes or abandons it. Completion additionally
//! publishes a [`Signal`] named after the key on the cache's [`SignalBus`].

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::signal::{Signal, SignalBus};

/// Process-wide store, created on first access and never torn down.
static SHARED: LazyLock<Arc<ResourceCache>> = LazyLock::new(|| Arc::new(ResourceCache::new()));

/// Snapshot of a cached resource.
///
/// For scripts the key is the completion-signal name and `data` stays empty;
/// the entry's presence alone means "load started" or "load finished".
/// For stylesheets the key is the URL and `data` holds the fetched text once
/// `loaded` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Whether the load finished successfully. Goes `false -> true` once.
    pub loaded: bool,
    /// Payload shared by every reader of this key.
    pub data: Arc<str>,
}

impl CacheEntry {
    fn pending() -> Self {
        Self {
            loaded: false,
            data: Arc::from(""),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Pending,
    Loaded,
    Abandoned,
}

struct Slot {
    entry: CacheEntry,
    status: watch::Sender<Status>,
}

impl Slot {
    fn pending() -> Self {
        let (status, _) = watch::channel(Status::Pending);
        Self {
            entry: CacheEntry::pending(),
            status,
        }
    }
}

/// Error returned by [`Waiter::wait`] when the load it waited on was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("load of {key} was abandoned before completing")]
pub struct WaitError {
    /// Resource key that was being waited on.
    pub key: String,
}

/// Outcome of [`ResourceCache::claim`].
pub enum Claim<'a> {
    /// The caller won the race and must perform the load.
    Begun(LoadGuard<'a>),
    /// Another caller is loading; wait for its completion.
    Pending(Waiter),
    /// The resource is already available.
    Loaded(CacheEntry),
}

/// Key to [`CacheEntry`] store shared by all widget instances.
///
/// The store is unbounded: one entry per distinct key ever requested, with
/// no eviction. Entries only ever move from pending to loaded; a pending
/// entry whose load fails is removed (see [`abandon`](Self::abandon)) so that
/// a later request starts afresh.
pub struct ResourceCache {
    slots: Mutex<HashMap<String, Slot>>,
    signals: SignalBus,
}

impl ResourceCache {
    /// Create an isolated cache with its own signal bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_signals(SignalBus::new())
    }

    /// Create an isolated cache publishing completions on `signals`.
    #[must_use]
    pub fn with_signals(signals: SignalBus) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            signals,
        }
    }

    /// The process-wide cache, constructed on first access.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Bus on which completion signals are published.
    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a load for `key` was started (pending or loaded).
    pub fn has(&self, key: &str) -> bool {
        self.slots().contains_key(key)
    }

    /// Mark a load for `key` as started.
    ///
    /// Returns `true` if this call created the entry, `false` if one already
    /// existed. Calling it repeatedly is harmless.
    pub fn begin(&self, key: &str) -> bool {
        let mut slots = self.slots();
        if slots.contains_key(key) {
            return false;
        }
        slots.insert(key.to_owned(), Slot::pending());
        true
    }

    /// Mark `key` as loaded, store `payload` if given, and wake all waiters.
    ///
    /// Publishes a [`Signal`] named `key`. Completing an already loaded entry
    /// leaves it untouched and returns the existing snapshot.
    pub fn complete(&self, key: &str, payload: Option<String>) -> CacheEntry {
        let mut slots = self.slots();
        let slot = slots.entry(key.to_owned()).or_insert_with(Slot::pending);
        if slot.entry.loaded {
            tracing::debug!(key, "Resource already loaded, ignoring completion");
            return slot.entry.clone();
        }
        if let Some(payload) = payload {
            slot.entry.data = Arc::from(payload);
        }
        slot.entry.loaded = true;
        slot.status.send_replace(Status::Loaded);
        let entry = slot.entry.clone();
        drop(slots);

        self.signals.emit(Signal::new(key));
        entry
    }

    /// Drop a pending entry after a failed load and wake its waiters.
    ///
    /// Loaded entries are never removed. Returns `true` if an entry was dropped.
    pub fn abandon(&self, key: &str) -> bool {
        let mut slots = self.slots();
        if slots.get(key).is_none_or(|slot| slot.entry.loaded) {
            return false;
        }
        if let Some(slot) = slots.remove(key) {
            slot.status.send_replace(Status::Abandoned);
        }
        tracing::debug!(key, "Abandoned pending resource");
        true
    }

    /// Current snapshot of `key`, if a load was ever started.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.slots().get(key).map(|slot| slot.entry.clone())
    }

    /// Wait handle for `key`, if a load was ever started.
    pub fn subscribe(&self, key: &str) -> Option<Waiter> {
        self.slots().get(key).map(|slot| Waiter {
            key: key.to_owned(),
            status: slot.status.subscribe(),
        })
    }

    /// Atomically check and begin a load for `key`.
    ///
    /// Exactly one concurrent caller receives [`Claim::Begun`]; the rest get a
    /// [`Waiter`] or, once loaded, the cached entry.
    pub fn claim(&self, key: &str) -> Claim<'_> {
        let mut slots = self.slots();
        match slots.get(key) {
            Some(slot) if slot.entry.loaded => Claim::Loaded(slot.entry.clone()),
            Some(slot) => {
                tracing::debug!(key, "Resource load in flight, waiting");
                Claim::Pending(Waiter {
                    key: key.to_owned(),
                    status: slot.status.subscribe(),
                })
            }
            None => {
                tracing::debug!(key, "Starting resource load");
                slots.insert(key.to_owned(), Slot::pending());
                Claim::Begun(LoadGuard {
                    cache: self,
                    key: key.to_owned(),
                    settled: false,
                })
            }
        }
    }

    /// Number of entries (pending or loaded).
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to load one resource.
///
/// Dropping the guard without calling [`complete`](Self::complete) abandons
/// the entry, so waiters never hang on a load nobody is performing.
pub struct LoadGuard<'a> {
    cache: &'a ResourceCache,
    key: String,
    settled: bool,
}

impl LoadGuard<'_> {
    /// Resource key this guard loads.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Finish the load, storing `payload` if given.
    pub fn complete(mut self, payload: Option<String>) -> CacheEntry {
        self.settled = true;
        self.cache.complete(&self.key, payload)
    }

    /// Give up the load so a later request can retry it.
    pub fn abandon(mut self) {
        self.settled = true;
        self.cache.abandon(&self.key);
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.abandon(&self.key);
        }
    }
}

/// Subscription to the completion of one pending load.
pub struct Waiter {
    key: String,
    status: watch::Receiver<Status>,
}

impl Waiter {
    /// Resource key being waited on.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Suspend until the load completes.
    ///
    /// Returns immediately if it already has. Read the payload afterwards
    /// with [`ResourceCache::get`].
    pub async fn wait(mut self) -> Result<(), WaitError> {
        match self.status.wait_for(|status| *status != Status::Pending).await {
            Ok(status) if *status == Status::Loaded => Ok(()),
            _ => Err(WaitError { key: self.key }),
        }
    }
}
