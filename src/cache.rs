//! # Stage: Mutation Query Cache
//!
//! ## Responsibility
//! Perform the network round-trip to the mutation service while collapsing
//! duplicate requests. Every distinct [`MutationRequest`] (its fingerprint)
//! owns one entry moving through `idle → pending → (success | failed)`.
//!
//! ## Guarantees
//! - At most one network call per fingerprint, ever: the presence check and
//!   the pending insert happen under one lock
//! - A completion only writes the entry of its own fingerprint, so a slow
//!   superseded call can never overwrite a newer result
//! - Failed is terminal: no retries; a different request is a different entry
//! - Pending calls are bounded by the configured timeout and may be
//!   cancelled; both end in `failed`, never in silence
//! - Bounded: completed entries beyond `capacity` are evicted least recently
//!   used first, skipping pending entries and the pinned (displayed) entry
//!
//! ## NOT Responsible For
//! - Choosing which request is displayed (that is the session controller)
//! - Validating user input (requests are only built from non-empty text)

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::models::MutationResponse;
use crate::request::MutationRequest;
use crate::service::MutatorApi;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle of one fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    /// No entry exists.
    Idle,
    /// A network call is in flight.
    Pending,
    Success(Arc<MutationResponse>),
    Failed(FetchError),
}

impl QueryState {
    /// `true` for `Success` and `Failed`.
    pub fn is_settled(&self) -> bool {
        matches!(self, QueryState::Success(_) | QueryState::Failed(_))
    }

    pub fn response(&self) -> Option<&Arc<MutationResponse>> {
        match self {
            QueryState::Success(r) => Some(r),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries held before eviction kicks in. Values below 1 behave as 1.
    pub capacity: usize,
    /// A call still pending after this long resolves as [`FetchError::Timeout`].
    pub request_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: 64,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ClientConfig> for CacheConfig {
    fn from(config: &ClientConfig) -> Self {
        CacheConfig {
            capacity: config.cache_capacity,
            request_timeout: config.request_timeout(),
        }
    }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Submits answered by an existing entry.
    pub hits: u64,
    /// Submits that issued a network call.
    pub calls_issued: u64,
    pub evictions: u64,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A view on one cache entry returned by [`MutationQueryCache::submit`].
#[derive(Debug, Clone)]
pub struct QueryHandle {
    request: MutationRequest,
    rx: watch::Receiver<QueryState>,
}

impl QueryHandle {
    pub fn request(&self) -> &MutationRequest {
        &self.request
    }

    /// Current state of the entry.
    pub fn state(&self) -> QueryState {
        self.rx.borrow().clone()
    }

    /// Wait until the entry is `Success` or `Failed`.
    pub async fn settled(&mut self) -> QueryState {
        let settled = self.rx.wait_for(QueryState::is_settled).await.map(|s| s.clone());
        match settled {
            Ok(state) => state,
            // The entry was dropped from the cache; report its last state.
            Err(_) => self.rx.borrow().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct Entry {
    state: watch::Sender<QueryState>,
    last_used: u64,
    task: Option<AbortHandle>,
}

impl Entry {
    fn is_pending(&self) -> bool {
        matches!(*self.state.borrow(), QueryState::Pending)
    }
}

#[derive(Default)]
struct Store {
    entries: HashMap<MutationRequest, Entry>,
    /// Monotonic use counter driving LRU order.
    clock: u64,
    pinned: Option<MutationRequest>,
    stats: CacheStats,
}

impl Store {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drop least recently used settled entries until there is room for one
    /// more. Gives up when only pending or pinned entries remain.
    fn make_room(&mut self, capacity: usize) {
        while self.entries.len() >= capacity {
            let victim = self
                .entries
                .iter()
                .filter(|(key, entry)| !entry.is_pending() && self.pinned.as_ref() != Some(*key))
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());

            match victim {
                Some(key) => {
                    self.entries.remove(&key);
                    self.stats.evictions += 1;
                    debug!(chars = key.text().chars().count(), "evicted cache entry");
                }
                None => break,
            }
        }
    }
}

struct Inner<A> {
    api: Arc<A>,
    config: CacheConfig,
    store: Mutex<Store>,
}

impl<A> Inner<A> {
    fn store(&self) -> MutexGuard<'_, Store> {
        // No operation leaves the store half-updated, so a poisoned lock is
        // still consistent.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, request: &MutationRequest, outcome: Result<Arc<MutationResponse>, FetchError>) {
        let mut store = self.store();
        let Some(entry) = store.entries.get_mut(request) else {
            debug!("completion for an entry no longer cached, dropping it");
            return;
        };
        if !entry.is_pending() {
            // Already cancelled.
            return;
        }
        entry.task = None;
        let next = match outcome {
            Ok(response) => {
                debug!(mutations = response.total(), "mutation request succeeded");
                QueryState::Success(response)
            }
            Err(e) => {
                warn!(error = %e, "mutation request failed");
                QueryState::Failed(e)
            }
        };
        entry.state.send_replace(next);
    }
}

/// Deduplicating, caching front for a [`MutatorApi`].
///
/// Cloning is cheap and every clone shares the same entries.
pub struct MutationQueryCache<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for MutationQueryCache<A> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<A: MutatorApi> MutationQueryCache<A> {
    pub fn new(api: Arc<A>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                config,
                store: Mutex::new(Store::default()),
            }),
        }
    }

    /// Return the entry for `request`, starting a network call only when no
    /// entry exists yet.
    ///
    /// Must be called from within a Tokio runtime: the call is spawned onto
    /// it. An existing entry is returned as is, whatever its state, so a
    /// failed request is not retried.
    pub fn submit(&self, request: &MutationRequest) -> QueryHandle {
        let mut store = self.inner.store();
        let now = store.tick();

        if let Some(entry) = store.entries.get_mut(request) {
            entry.last_used = now;
            let rx = entry.state.subscribe();
            store.stats.hits += 1;
            debug!(settled = rx.borrow().is_settled(), "mutation cache hit");
            return QueryHandle { request: request.clone(), rx };
        }

        store.make_room(self.inner.config.capacity.max(1));

        let (tx, rx) = watch::channel(QueryState::Pending);
        let inner = Arc::clone(&self.inner);
        let key = request.clone();
        let timeout = self.inner.config.request_timeout;
        let task = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, inner.api.mutate(&key)).await {
                Ok(Ok(response)) => {
                    let malformed = response.malformed_sites();
                    if !malformed.is_empty() {
                        warn!(
                            sites = ?malformed,
                            total = response.total(),
                            "mutation spans out of bounds, reveal will clamp them"
                        );
                    }
                    Ok(Arc::new(response))
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(FetchError::Timeout(timeout.as_millis() as u64)),
            };
            inner.resolve(&key, outcome);
        });

        store.entries.insert(
            request.clone(),
            Entry {
                state: tx,
                last_used: now,
                task: Some(task.abort_handle()),
            },
        );
        store.stats.calls_issued += 1;
        debug!(chars = request.text().chars().count(), "mutation cache miss, calling service");

        QueryHandle { request: request.clone(), rx }
    }

    /// Abort the in-flight call for `request`.
    ///
    /// Returns `true` when a pending entry was moved to
    /// `Failed(Cancelled)`; settled or unknown entries are left alone.
    pub fn cancel(&self, request: &MutationRequest) -> bool {
        let mut store = self.inner.store();
        let Some(entry) = store.entries.get_mut(request) else {
            return false;
        };
        if !entry.is_pending() {
            return false;
        }
        if let Some(task) = entry.task.take() {
            task.abort();
        }
        entry.state.send_replace(QueryState::Failed(FetchError::Cancelled));
        debug!("cancelled in-flight mutation request");
        true
    }

    /// Protect `request`'s entry from eviction, replacing any earlier pin.
    pub fn pin(&self, request: Option<MutationRequest>) {
        self.inner.store().pinned = request;
    }

    pub fn state(&self, request: &MutationRequest) -> QueryState {
        self.inner
            .store()
            .entries
            .get(request)
            .map(|e| e.state.borrow().clone())
            .unwrap_or(QueryState::Idle)
    }

    pub fn contains(&self, request: &MutationRequest) -> bool {
        self.inner.store().entries.contains_key(request)
    }

    pub fn len(&self) -> usize {
        self.inner.store().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.store().stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
