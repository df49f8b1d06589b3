//! Reducer state that survives restarts.
//!
//! A [`StickyStore`] goes through two phases:
//!
//! 1. `new(reducer, initial)` builds a purely in-memory store. `loading()` is
//!    `true` and nothing is ever written in this phase.
//! 2. `attach_persistence(slots, key)` performs the one-shot load of the
//!    snapshot stored under `key`, replaces the in-memory state with it (or
//!    re-applies `initial`), and flips `loading()` to `false`. From then on
//!    every accepted change is written back to the slot.
//!
//! Storage failures never reach the caller: an unavailable backend turns the
//! store into in-memory state, a malformed snapshot falls back to `initial`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::SlotStorage;

/// Names one snapshot inside the shared slot namespace.
///
/// Two stores attached under the same key overwrite each other's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StoreKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for StoreKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State and loading flag observed together, consistent for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreView<S> {
    pub state: S,
    pub loading: bool,
}

/// What the one-shot load did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored snapshot replaced the in-memory state.
    Restored,
    /// The slot was empty; `initial` was re-applied.
    Defaulted,
    /// The slot held something that does not parse; `initial` was re-applied.
    Malformed,
    /// The backend failed to read; `initial` was re-applied.
    ReadFailed,
    /// No persistent storage in this environment; the store stays in memory.
    Unavailable,
    /// Persistence was attached earlier; nothing happened.
    AlreadyAttached,
}

enum Persistence {
    Detached,
    InMemory,
    Slot {
        slots: Arc<dyn SlotStorage>,
        key: StoreKey,
    },
}

impl Persistence {
    async fn write<S: Serialize>(&self, state: &S) {
        let Persistence::Slot { slots, key } = self else {
            return;
        };
        let raw = match serde_json::to_string(state) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %key, error = %err, "failed to serialize state; snapshot not written");
                return;
            }
        };
        match slots.set(key.as_str(), &raw).await {
            Ok(()) => debug!(key = %key, backend = slots.name(), bytes = raw.len(), "snapshot written"),
            Err(err) => {
                warn!(key = %key, backend = slots.name(), error = %err, "failed to write snapshot")
            }
        }
    }
}

type ReducerFn<S, A> = dyn Fn(&S, A) -> S + Send + Sync;

struct Inner<S, A> {
    reducer: Box<ReducerFn<S, A>>,
    initial: S,
    view: watch::Sender<StoreView<S>>,
    // Also serializes dispatches so the slot always holds the latest state.
    persistence: Mutex<Persistence>,
}

/// Shared handle to a persistent reducer store. Clones share state.
pub struct StickyStore<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for StickyStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> StickyStore<S, A>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new<R>(reducer: R, initial: S) -> Self
    where
        R: Fn(&S, A) -> S + Send + Sync + 'static,
    {
        let (view, _) = watch::channel(StoreView {
            state: initial.clone(),
            loading: true,
        });
        Self {
            inner: Arc::new(Inner {
                reducer: Box::new(reducer),
                initial,
                view,
                persistence: Mutex::new(Persistence::Detached),
            }),
        }
    }

    pub fn state(&self) -> S {
        self.inner.view.borrow().state.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.view.borrow().loading
    }

    pub fn view(&self) -> StoreView<S> {
        self.inner.view.borrow().clone()
    }

    /// Receiver notified after every change of state or loading flag.
    pub fn subscribe(&self) -> watch::Receiver<StoreView<S>> {
        self.inner.view.subscribe()
    }

    /// Load the snapshot under `key` and start persisting to it.
    ///
    /// `slots` is `None` when the environment has no persistent storage.
    /// Only the first call has an effect.
    pub async fn attach_persistence(
        &self,
        slots: Option<Arc<dyn SlotStorage>>,
        key: impl Into<StoreKey>,
    ) -> LoadOutcome {
        let key = key.into();
        let mut persistence = self.inner.persistence.lock().await;
        if !matches!(*persistence, Persistence::Detached) {
            debug!(key = %key, "persistence already attached");
            return LoadOutcome::AlreadyAttached;
        }

        let Some(slots) = slots else {
            *persistence = Persistence::InMemory;
            self.inner.view.send_modify(|view| view.loading = false);
            debug!(key = %key, "persistent storage unavailable; keeping state in memory");
            return LoadOutcome::Unavailable;
        };

        let (loaded, outcome) = match slots.get(key.as_str()).await {
            Ok(Some(raw)) => match serde_json::from_str::<S>(&raw) {
                Ok(snapshot) => {
                    info!(key = %key, backend = slots.name(), "restored stored snapshot");
                    (snapshot, LoadOutcome::Restored)
                }
                Err(err) => {
                    warn!(key = %key, backend = slots.name(), error = %err, "stored snapshot is malformed; using default");
                    (self.inner.initial.clone(), LoadOutcome::Malformed)
                }
            },
            Ok(None) => {
                debug!(key = %key, backend = slots.name(), "no stored snapshot; using default");
                (self.inner.initial.clone(), LoadOutcome::Defaulted)
            }
            Err(err) => {
                warn!(key = %key, backend = slots.name(), error = %err, "failed to read snapshot; using default");
                (self.inner.initial.clone(), LoadOutcome::ReadFailed)
            }
        };

        *persistence = Persistence::Slot { slots, key };
        self.inner.view.send_modify(|view| {
            view.state = loaded.clone();
            view.loading = false;
        });
        persistence.write(&loaded).await;
        outcome
    }

    /// Run `action` through the reducer and persist the result once loaded.
    pub async fn dispatch(&self, action: A) {
        let persistence = self.inner.persistence.lock().await;
        let next = {
            let current = self.inner.view.borrow();
            (self.inner.reducer)(&current.state, action)
        };
        self.commit(&persistence, next).await;
    }

    /// Replace the whole state with `snapshot` without involving the reducer.
    pub async fn restore_snapshot(&self, snapshot: S) {
        let persistence = self.inner.persistence.lock().await;
        self.commit(&persistence, snapshot).await;
    }

    async fn commit(&self, persistence: &Persistence, next: S) {
        self.inner.view.send_modify(|view| view.state = next.clone());
        persistence.write(&next).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySlots;

    #[derive(Debug)]
    enum Counter {
        Add(i32),
    }

    fn counter_reducer(state: &i32, action: Counter) -> i32 {
        match action {
            Counter::Add(n) => state + n,
        }
    }

    #[tokio::test]
    async fn starts_loading_with_initial_state() {
        let store = StickyStore::new(counter_reducer, 5);
        assert!(store.loading());
        assert_eq!(store.state(), 5);
        assert_eq!(
            store.view(),
            StoreView {
                state: 5,
                loading: true
            }
        );
    }

    #[tokio::test]
    async fn unavailable_storage_resolves_loading_in_memory() {
        let store = StickyStore::new(counter_reducer, 1);
        let outcome = store.attach_persistence(None, "counter").await;
        assert_eq!(outcome, LoadOutcome::Unavailable);
        assert!(!store.loading());

        store.dispatch(Counter::Add(2)).await;
        assert_eq!(store.state(), 3);
    }

    #[tokio::test]
    async fn second_attach_is_a_no_op() {
        let first = Arc::new(MemorySlots::with_slot("counter", "10"));
        let second = Arc::new(MemorySlots::with_slot("counter", "99"));
        let store = StickyStore::new(counter_reducer, 0);

        assert_eq!(
            store.attach_persistence(Some(first), "counter").await,
            LoadOutcome::Restored
        );
        assert_eq!(
            store.attach_persistence(Some(second.clone()), "counter").await,
            LoadOutcome::AlreadyAttached
        );
        assert_eq!(store.state(), 10);
        assert_eq!(second.get("counter").await.unwrap().as_deref(), Some("99"));
    }

    #[tokio::test]
    async fn restore_snapshot_bypasses_reducer() {
        let slots = Arc::new(MemorySlots::new());
        let store = StickyStore::new(|_: &i32, _: Counter| panic!("reducer must not run"), 0);
        store.attach_persistence(Some(slots.clone()), "counter").await;

        store.restore_snapshot(42).await;
        assert_eq!(store.state(), 42);
        assert_eq!(slots.get("counter").await.unwrap().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = StickyStore::new(counter_reducer, 0);
        let handle = store.clone();
        store.attach_persistence(None, "counter").await;

        handle.dispatch(Counter::Add(4)).await;
        assert_eq!(store.state(), 4);
        assert!(!handle.loading());
    }

    #[tokio::test]
    async fn subscribers_see_load_and_dispatch() {
        let slots = Arc::new(MemorySlots::with_slot("counter", "7"));
        let store = StickyStore::new(counter_reducer, 0);
        let mut rx = store.subscribe();

        store.attach_persistence(Some(slots), "counter").await;
        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            StoreView {
                state: 7,
                loading: false
            }
        );

        store.dispatch(Counter::Add(1)).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, 8);
    }
}
