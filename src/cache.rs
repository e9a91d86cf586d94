//! Result Cache
//! コード毎の照会結果キャッシュ（cache-and-network）
//!
//! Every key owns a `watch` channel holding its current [`CacheEntry`].
//! Fetches run on spawned tasks and publish into that channel, so a
//! background refresh completes even when nobody is awaiting it. Each
//! issued fetch gets a per-key generation; only the latest generation may
//! publish.

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::LookupError;
use crate::models::PricedItem;
use crate::validate::ValidatedCode;

/// Cache key: the validated code itself.
pub type QueryKey = ValidatedCode;

pub type FetchResult = Result<PricedItem, LookupError>;

// ========================================
// CacheEntry
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Snapshot of one key. `data` survives failed refreshes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: QueryKey,
    pub status: EntryStatus,
    pub data: Option<Arc<PricedItem>>,
    pub last_error: Option<LookupError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn new(key: QueryKey) -> Self {
        Self {
            key,
            status: EntryStatus::Idle,
            data: None,
            last_error: None,
            fetched_at: None,
        }
    }

    pub fn item(&self) -> Option<&PricedItem> {
        self.data.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.status == EntryStatus::Ready
    }

    pub fn is_error(&self) -> bool {
        self.status == EntryStatus::Error
    }
}

// ========================================
// Two-phase result
// ========================================

#[derive(Debug, Clone)]
pub enum Phase {
    /// Last known entry, delivered before the network answers.
    Stale(CacheEntry),
    /// Entry after the network request settled.
    Resolved(CacheEntry),
}

impl Phase {
    pub fn entry(&self) -> &CacheEntry {
        match self {
            Phase::Stale(entry) | Phase::Resolved(entry) => entry,
        }
    }

    pub fn into_entry(self) -> CacheEntry {
        match self {
            Phase::Stale(entry) | Phase::Resolved(entry) => entry,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Phase::Stale(_))
    }
}

/// Yields `Phase::Stale` when cached data exists, then `Phase::Resolved`.
///
/// Dropping the stream abandons interest in the key: the request is not
/// aborted, but this caller never observes its result.
pub struct LookupStream {
    stale: Option<CacheEntry>,
    rx: watch::Receiver<CacheEntry>,
    done: bool,
}

impl LookupStream {
    pub fn stale(&self) -> Option<&CacheEntry> {
        self.stale.as_ref()
    }

    pub async fn next_phase(&mut self) -> Option<Phase> {
        if let Some(entry) = self.stale.take() {
            return Some(Phase::Stale(entry));
        }
        if self.done {
            return None;
        }
        let entry = settled(&mut self.rx).await;
        self.done = true;
        Some(Phase::Resolved(entry))
    }

    /// Skip the stale phase and wait for the network result.
    pub async fn resolved(mut self) -> CacheEntry {
        settled(&mut self.rx).await
    }

    pub fn into_stream(self) -> impl Stream<Item = Phase> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next_phase().await.map(|phase| (phase, stream))
        })
    }
}

async fn settled(rx: &mut watch::Receiver<CacheEntry>) -> CacheEntry {
    if let Ok(entry) = rx.wait_for(|e| e.status != EntryStatus::Loading).await {
        return entry.clone();
    }
    // Sender gone: the cache was dropped mid-flight.
    rx.borrow().clone()
}

// ========================================
// ResultCache
// ========================================

struct Slot {
    tx: watch::Sender<CacheEntry>,
    /// Generation of the most recently issued fetch.
    issued: u64,
    /// The only generation allowed to publish.
    in_flight: Option<u64>,
    /// Set by `invalidate`: data fetched at or before this generation is not
    /// served as stale.
    invalidated_at: Option<u64>,
}

impl Slot {
    fn new(key: QueryKey) -> Self {
        let (tx, _) = watch::channel(CacheEntry::new(key));
        Self {
            tx,
            issued: 0,
            in_flight: None,
            invalidated_at: None,
        }
    }
}

/// In-memory result store shared by every lookup in a session.
///
/// Cloning is cheap and yields a handle to the same store. Entries are never
/// evicted. Methods that may issue a fetch spawn onto the current tokio
/// runtime and must be called from within one.
#[derive(Clone, Default)]
pub struct ResultCache {
    slots: Arc<Mutex<HashMap<QueryKey, Slot>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached entry if present and fresh, otherwise wait for the network.
    /// A cached hit still triggers a background refresh.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> CacheEntry
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let mut stream = self.watch(key, fetcher);
        if let Some(entry) = stream.stale.take() {
            return entry;
        }
        stream.resolved().await
    }

    /// Cache-and-network lookup as an explicit two-phase stream.
    pub fn watch<F, Fut>(&self, key: QueryKey, fetcher: F) -> LookupStream
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot::new(key.clone()));

        let current = slot.tx.borrow().clone();
        let stale = (current.data.is_some() && slot.invalidated_at.is_none()).then_some(current);

        if slot.in_flight.is_some() {
            debug!("joining in-flight lookup for {}", key);
        } else {
            self.issue(slot, key.clone(), fetcher);
        }

        if stale.is_some() {
            debug!("serving cached entry for {} while refreshing", key);
        }

        LookupStream {
            stale,
            rx: slot.tx.subscribe(),
            done: false,
        }
    }

    /// Force a new request now, superseding any request in flight. The
    /// returned stream has no stale phase.
    pub fn refresh<F, Fut>(&self, key: QueryKey, fetcher: F) -> LookupStream
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        self.invalidate(&key);
        self.watch(key, fetcher)
    }

    /// The next read for `key` waits on a fresh fetch instead of serving
    /// the cached entry. A request in flight is superseded: its result is
    /// discarded and its waiters settle on the `Idle` entry.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(key) {
            slot.invalidated_at = Some(slot.issued);
            if let Some(superseded) = slot.in_flight.take() {
                debug!("superseding request {} for {}", superseded, key);
            }
            slot.tx.send_modify(|entry| entry.status = EntryStatus::Idle);
            info!("invalidated {}", key);
        }
    }

    pub fn entry(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.slots().get(key).map(|slot| slot.tx.borrow().clone())
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    fn issue<F, Fut>(&self, slot: &mut Slot, key: QueryKey, fetcher: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        slot.issued += 1;
        let generation = slot.issued;
        slot.in_flight = Some(generation);
        slot.tx.send_modify(|entry| entry.status = EntryStatus::Loading);
        info!("lookup issued for {} (generation {})", key, generation);

        let cache = self.clone();
        let request = fetcher();
        tokio::spawn(async move {
            let result = request.await;
            cache.publish(&key, generation, result);
        });
    }

    fn publish(&self, key: &QueryKey, generation: u64, result: FetchResult) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(key) else {
            return;
        };

        if slot.in_flight != Some(generation) {
            warn!(
                "discarding result of superseded request {} for {} (latest {})",
                generation, key, slot.issued
            );
            return;
        }

        slot.in_flight = None;
        slot.invalidated_at = None;

        slot.tx.send_modify(|entry| match result {
            Ok(item) => {
                info!("lookup resolved for {}", key);
                entry.status = EntryStatus::Ready;
                entry.data = Some(Arc::new(item));
                entry.last_error = None;
                entry.fetched_at = Some(Utc::now());
            }
            Err(err) => {
                warn!("lookup failed for {}: {}", key, err);
                entry.status = EntryStatus::Error;
                entry.last_error = Some(err);
            }
        });
    }
}
