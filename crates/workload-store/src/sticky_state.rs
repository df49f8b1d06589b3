use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::{LoadOutcome, SlotStorage, StickyStore, StoreKey, StoreView};

/// A single persisted value: a [`StickyStore`] whose only transition is "replace".
pub struct StickyState<T> {
    store: StickyStore<T, T>,
}

impl<T> Clone for StickyState<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T> StickyState<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            store: StickyStore::new(|_: &T, next: T| next, initial),
        }
    }

    pub fn get(&self) -> T {
        self.store.state()
    }

    pub fn loading(&self) -> bool {
        self.store.loading()
    }

    pub fn view(&self) -> StoreView<T> {
        self.store.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreView<T>> {
        self.store.subscribe()
    }

    pub async fn attach_persistence(
        &self,
        slots: Option<Arc<dyn SlotStorage>>,
        key: impl Into<StoreKey>,
    ) -> LoadOutcome {
        self.store.attach_persistence(slots, key).await
    }

    pub async fn set(&self, value: T) {
        self.store.dispatch(value).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySlots;

    #[tokio::test]
    async fn restores_and_persists_plain_value() {
        let slots = Arc::new(MemorySlots::with_slot("theme", r#""dark""#));
        let theme = StickyState::new("light".to_string());

        let outcome = theme.attach_persistence(Some(slots.clone()), "theme").await;
        assert_eq!(outcome, LoadOutcome::Restored);
        assert_eq!(theme.get(), "dark");

        theme.set("solarized".to_string()).await;
        assert_eq!(
            slots.get("theme").await.unwrap().as_deref(),
            Some(r#""solarized""#)
        );
    }

    #[tokio::test]
    async fn set_before_load_is_not_written() {
        let slots = Arc::new(MemorySlots::new());
        let limit = StickyState::new(3u32);

        limit.set(8).await;
        assert_eq!(limit.get(), 8);
        assert_eq!(slots.get("limit").await.unwrap(), None);

        let outcome = limit.attach_persistence(Some(slots.clone()), "limit").await;
        assert_eq!(outcome, LoadOutcome::Defaulted);
        assert_eq!(limit.get(), 3);
        assert_eq!(slots.get("limit").await.unwrap().as_deref(), Some("3"));
    }
}
