//! Query cache
//!
//! Provides:
//! - Key-addressed read results with `idle → loading → success | error` states
//! - In-flight de-duplication: concurrent reads of one key share one call
//! - Stale-while-revalidate: a failed refetch keeps the last good value
//! - Prefix invalidation driven by mutations
//! - Mutation state tracking (`idle → pending → success | error`)

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::{AppError, Result};
use crate::metrics;

/// One element of a cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    UInt(u64),
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::UInt(value)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => write!(f, "{:?}", s),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::UInt(u) => write!(f, "{}", u),
        }
    }
}

/// Ordered tuple identifying a read, e.g. `["messages", 0, 1]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        Self(vec![KeyPart::from(root)])
    }

    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// First segment, used as the metrics label
    pub fn root(&self) -> &str {
        match self.0.first() {
            Some(KeyPart::Str(s)) => s,
            _ => "",
        }
    }

    /// `true` when `prefix` addresses this key (or a family containing it)
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// What a reader sees for one key
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    /// Last successful value; survives later errors
    pub data: Option<T>,
    pub error: Option<Arc<AppError>>,
    pub is_stale: bool,
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_stale: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Value, Arc<AppError>>>>;

struct InFlight {
    id: u64,
    generation: u64,
    future: SharedFetch,
}

struct Entry {
    status: QueryStatus,
    data: Option<Value>,
    error: Option<Arc<AppError>>,
    stale: bool,
    updated_at: Option<Instant>,
    /// Bumped on every invalidation
    generation: u64,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn new() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            stale: false,
            updated_at: None,
            generation: 0,
            in_flight: None,
        }
    }

    fn is_fresh(&self, stale_time: Option<Duration>) -> bool {
        if self.status != QueryStatus::Success || self.stale {
            return false;
        }
        match (stale_time, self.updated_at) {
            (Some(limit), Some(at)) => at.elapsed() < limit,
            _ => true,
        }
    }

    fn snapshot<T: DeserializeOwned>(&self, stale_time: Option<Duration>) -> QueryState<T> {
        let mut state = QueryState {
            status: self.status,
            data: None,
            error: self.error.clone(),
            is_stale: self.data.is_some() && !self.is_fresh(stale_time) && self.status != QueryStatus::Error,
        };
        if let Some(value) = &self.data {
            match serde_json::from_value(value.clone()) {
                Ok(data) => state.data = Some(data),
                Err(e) => {
                    state.status = QueryStatus::Error;
                    state.error = Some(Arc::new(AppError::Serialization(e)));
                }
            }
        }
        state
    }
}

/// Cache of read results shared by every binding
pub struct QueryClient {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    stale_time: Option<Duration>,
    next_fetch_id: AtomicU64,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(None)
    }
}

impl QueryClient {
    /// `stale_time: None` keeps results fresh until invalidated
    pub fn new(stale_time: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_time,
            next_fetch_id: AtomicU64::new(0),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state without triggering a fetch
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryState<T> {
        self.entries()
            .get(key)
            .map(|entry| entry.snapshot(self.stale_time))
            .unwrap_or_else(QueryState::idle)
    }

    /// Read through the cache
    ///
    /// A fresh hit returns immediately. Otherwise the key moves to
    /// `Loading` (keeping any previous value) and `fetcher` runs, unless a
    /// fetch for the same key is already in flight, in which case this
    /// call waits on that one instead.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (fetch_id, future) = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);

            if entry.in_flight.is_none() && entry.is_fresh(self.stale_time) {
                metrics::record_cache(true, key.root());
                debug!(key = %key, "Query cache hit");
                return entry.snapshot(self.stale_time);
            }

            match &entry.in_flight {
                Some(in_flight) => {
                    debug!(key = %key, "Joining in-flight query");
                    (in_flight.id, in_flight.future.clone())
                }
                None => {
                    metrics::record_cache(false, key.root());
                    debug!(key = %key, stale = entry.data.is_some(), "Query cache miss");

                    let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let call = fetcher();
                    let future = async move {
                        let value = call.await.map_err(Arc::new)?;
                        serde_json::to_value(value).map_err(|e| Arc::new(AppError::Serialization(e)))
                    }
                    .boxed()
                    .shared();

                    entry.status = QueryStatus::Loading;
                    entry.in_flight = Some(InFlight {
                        id,
                        generation: entry.generation,
                        future: future.clone(),
                    });
                    (id, future)
                }
            }
        };

        let outcome = future.await;

        let mut entries = self.entries();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        self.settle(&key, entry, fetch_id, outcome);
        entry.snapshot(self.stale_time)
    }

    /// Store a finished fetch; only the first waiter of a fetch applies it
    fn settle(
        &self,
        key: &QueryKey,
        entry: &mut Entry,
        fetch_id: u64,
        outcome: std::result::Result<Value, Arc<AppError>>,
    ) {
        if entry.in_flight.as_ref().map(|f| f.id) != Some(fetch_id) {
            return;
        }
        let Some(in_flight) = entry.in_flight.take() else {
            return;
        };
        let invalidated = in_flight.generation != entry.generation;

        match outcome {
            Ok(value) => {
                entry.status = QueryStatus::Success;
                entry.data = Some(value);
                entry.error = None;
                entry.stale = invalidated;
                entry.updated_at = Some(Instant::now());
                debug!(key = %key, stale = invalidated, "Query succeeded");
            }
            Err(error) => {
                entry.status = QueryStatus::Error;
                entry.error = Some(error.clone());
                entry.stale = true;
                warn!(key = %key, error = %error, kept_data = entry.data.is_some(), "Query failed");
            }
        }
    }

    /// Mark every entry under `prefix` stale; returns how many matched
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                entry.generation += 1;
                count += 1;
            }
        }
        metrics::record_invalidation(prefix.root(), count);
        debug!(prefix = %prefix, entries = count, "Invalidated queries");
        count
    }

    /// Seed or overwrite a value, e.g. with the result of a mutation
    pub fn set_data<T: Serialize>(&self, key: QueryKey, data: &T) -> Result<()> {
        let value = serde_json::to_value(data)?;
        let mut entries = self.entries();
        let entry = entries.entry(key).or_insert_with(Entry::new);
        entry.status = QueryStatus::Success;
        entry.data = Some(value);
        entry.error = None;
        entry.stale = false;
        entry.updated_at = Some(Instant::now());
        Ok(())
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct MutationState<T> {
    pub status: MutationStatus,
    pub data: Option<T>,
    pub error: Option<Arc<AppError>>,
}

impl<T> MutationState<T> {
    pub fn idle() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

/// One write the caller can observe while it runs
pub struct Mutation<T> {
    name: &'static str,
    state: Mutex<MutationState<T>>,
}

impl<T: Clone> Mutation<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(MutationState::idle()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> MutationState<T> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, state: MutationState<T>) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Run `call`; on success the keys from `invalidations` are marked
    /// stale before the state settles
    pub async fn run<Fut, I>(&self, client: &QueryClient, call: Fut, invalidations: I) -> MutationState<T>
    where
        Fut: Future<Output = Result<T>>,
        I: FnOnce(&T) -> Vec<QueryKey>,
    {
        self.set(MutationState {
            status: MutationStatus::Pending,
            data: None,
            error: None,
        });
        debug!(mutation = self.name, "Mutation pending");

        let state = match call.await {
            Ok(data) => {
                for key in invalidations(&data) {
                    client.invalidate(&key);
                }
                metrics::record_mutation(self.name, true);
                debug!(mutation = self.name, "Mutation succeeded");
                MutationState {
                    status: MutationStatus::Success,
                    data: Some(data),
                    error: None,
                }
            }
            Err(error) => {
                metrics::record_mutation(self.name, false);
                warn!(mutation = self.name, error = %error, "Mutation failed");
                MutationState {
                    status: MutationStatus::Error,
                    data: None,
                    error: Some(Arc::new(error)),
                }
            }
        };

        self.set(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Resource;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: i64,
    ) -> impl Future<Output = Result<i64>> + Send + 'static {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[test]
    fn test_key_prefix_matching() {
        let key = QueryKey::new("messages").with(0i64).with(1i64);
        assert!(key.starts_with(&QueryKey::new("messages")));
        assert!(key.starts_with(&QueryKey::new("messages").with(0i64)));
        assert!(!key.starts_with(&QueryKey::new("messages").with(1i64)));
        assert!(!QueryKey::new("messages").starts_with(&key));
        assert_eq!(key.to_string(), r#"["messages", 0, 1]"#);
    }

    #[test]
    fn test_large_unsigned_parts_keep_their_value() {
        let key = QueryKey::new("posts").with(u64::MAX);
        assert_eq!(key.parts()[1], KeyPart::UInt(u64::MAX));
        assert_ne!(key, QueryKey::new("posts").with(-1i64));
        assert_eq!(key.to_string(), format!(r#"["posts", {}]"#, u64::MAX));
    }

    #[tokio::test]
    async fn test_unknown_key_is_idle() {
        let client = QueryClient::default();
        let state: QueryState<i64> = client.peek(&QueryKey::new("currentUser"));
        assert_eq!(state.status, QueryStatus::Idle);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_hit_skips_fetcher() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("user").with(1i64);

        let first = client.fetch(key.clone(), || counting_fetch(&calls, 7)).await;
        assert_eq!(first.status, QueryStatus::Success);
        assert_eq!(first.data, Some(7));

        let second = client.fetch(key, || counting_fetch(&calls, 8)).await;
        assert_eq!(second.data, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_call() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("allKnowledgeBases");
        let (release, gate) = oneshot::channel::<()>();

        let slow = {
            let calls = calls.clone();
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                gate.await.ok();
                Ok::<_, AppError>(3i64)
            }
        };

        let (a, b, _) = tokio::join!(
            client.fetch(key.clone(), slow),
            client.fetch(key.clone(), || counting_fetch(&calls, 99)),
            async {
                tokio::task::yield_now().await;
                let loading: QueryState<i64> = client.peek(&key);
                assert_eq!(loading.status, QueryStatus::Loading);
                release.send(()).ok();
            }
        );

        assert_eq!(a.data, Some(3));
        assert_eq!(b.data, Some(3));
        assert_eq!(b.status, QueryStatus::Success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("conversations").with(0i64);

        client.fetch(key.clone(), || counting_fetch(&calls, 1)).await;
        assert_eq!(client.invalidate(&QueryKey::new("conversations")), 1);
        assert!(client.peek::<i64>(&key).is_stale);

        let refreshed = client.fetch(key, || counting_fetch(&calls, 2)).await;
        assert_eq!(refreshed.data, Some(2));
        assert!(!refreshed.is_stale);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_leaves_other_keys_alone() {
        let client = QueryClient::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mine = QueryKey::new("conversations").with(0i64);
        let theirs = QueryKey::new("conversations").with(5i64);

        client.fetch(mine.clone(), || counting_fetch(&calls, 1)).await;
        client.fetch(theirs.clone(), || counting_fetch(&calls, 1)).await;
        client.invalidate(&mine);

        assert!(client.peek::<i64>(&mine).is_stale);
        assert!(!client.peek::<i64>(&theirs).is_stale);
    }

    #[tokio::test]
    async fn test_error_keeps_last_value() {
        let client = QueryClient::default();
        let key = QueryKey::new("user").with(9i64);

        client.fetch(key.clone(), || async { Ok::<_, AppError>(41i64) }).await;
        client.invalidate(&key);

        let failed = client
            .fetch(key.clone(), || async {
                Err::<i64, _>(AppError::RemoteUnavailable {
                    message: "offline".into(),
                })
            })
            .await;
        assert_eq!(failed.status, QueryStatus::Error);
        assert_eq!(failed.data, Some(41));
        assert_eq!(failed.error.unwrap().to_string(), "Remote backend unavailable: offline");

        // An errored key is fetched again on the next read
        let recovered = client.fetch(key, || async { Ok::<_, AppError>(42i64) }).await;
        assert_eq!(recovered.status, QueryStatus::Success);
        assert_eq!(recovered.data, Some(42));
        assert!(recovered.error.is_none());
    }

    #[tokio::test]
    async fn test_invalidated_while_in_flight_lands_stale() {
        let client = QueryClient::default();
        let key = QueryKey::new("followingList");
        let (release, gate) = oneshot::channel::<()>();

        let (state, _) = tokio::join!(
            client.fetch(key.clone(), move || async move {
                gate.await.ok();
                Ok::<_, AppError>(vec![1i64])
            }),
            async {
                tokio::task::yield_now().await;
                client.invalidate(&QueryKey::new("followingList"));
                release.send(()).ok();
            }
        );

        assert_eq!(state.status, QueryStatus::Success);
        assert!(state.is_stale);

        let calls = Arc::new(AtomicUsize::new(0));
        client.fetch(key, || counting_fetch(&calls, 0).map(|r| r.map(|v| vec![v]))).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_time_expires_entries() {
        let client = QueryClient::new(Some(Duration::ZERO));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("allKnowledgeBases");

        client.fetch(key.clone(), || counting_fetch(&calls, 1)).await;
        client.fetch(key, || counting_fetch(&calls, 1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mutation_invalidates_before_settling() {
        let client = QueryClient::default();
        let key = QueryKey::new("currentUser");
        client.set_data(key.clone(), &1i64).unwrap();

        let mutation = Mutation::<bool>::new("followUser");
        assert_eq!(mutation.state().status, MutationStatus::Idle);

        let (release, gate) = oneshot::channel::<()>();
        let (state, _) = tokio::join!(
            mutation.run(
                &client,
                async move {
                    gate.await.ok();
                    Ok::<_, AppError>(true)
                },
                |_| vec![QueryKey::new("currentUser")],
            ),
            async {
                tokio::task::yield_now().await;
                assert_eq!(mutation.state().status, MutationStatus::Pending);
                assert!(!client.peek::<i64>(&key).is_stale);
                release.send(()).ok();
            }
        );

        assert!(state.is_success());
        assert_eq!(state.data, Some(true));
        assert!(client.peek::<i64>(&key).is_stale);
        assert_eq!(mutation.state().status, MutationStatus::Success);
    }

    #[tokio::test]
    async fn test_failed_mutation_invalidates_nothing() {
        let client = QueryClient::default();
        let key = QueryKey::new("knowledgeBase").with(99i64);
        client.set_data(key.clone(), &0i64).unwrap();

        let mutation = Mutation::<i64>::new("addPaperToKnowledgeBase");
        let state = mutation
            .run(
                &client,
                async { Err(AppError::not_found(Resource::KnowledgeBase, 99)) },
                |_| vec![QueryKey::new("knowledgeBase").with(99i64)],
            )
            .await;

        assert!(state.is_error());
        assert!(!client.peek::<i64>(&key).is_stale);
    }
}
