//! Type-erased capability value store.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chime_core::{Capability, CapabilityKey};
use parking_lot::RwLock;

/// A type-erased `Arc<T>` as stored in a [`ValueStore`].
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Maps each capability to a single shared value.
///
/// Values are write-once: inserting a capability that is already present
/// leaves the existing value in place.
#[derive(Default)]
pub struct ValueStore {
    values: RwLock<HashMap<CapabilityKey, ErasedValue>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `T`. Returns `false` if `T` was already present.
    pub fn insert<T: Capability + ?Sized>(&self, value: Arc<T>) -> bool {
        self.insert_erased(CapabilityKey::of::<T>(), erase(value))
    }

    /// Stores an already erased value. Returns `false` if `key` was already
    /// present.
    pub fn insert_erased(&self, key: CapabilityKey, value: ErasedValue) -> bool {
        let mut values = self.values.write();
        if values.contains_key(&key) {
            return false;
        }
        values.insert(key, value);
        true
    }

    /// Returns the value stored under `T`.
    pub fn get<T: Capability + ?Sized>(&self) -> Option<Arc<T>> {
        self.values
            .read()
            .get(&CapabilityKey::of::<T>())
            .and_then(|value| value.downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn contains(&self, key: &CapabilityKey) -> bool {
        self.values.read().contains_key(key)
    }

    /// Returns every stored capability.
    pub fn keys(&self) -> Vec<CapabilityKey> {
        self.values.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

/// Erases `Arc<T>`, keeping the `Arc<T>` itself so unsized `T` round-trips.
pub(crate) fn erase<T: Capability + ?Sized>(value: Arc<T>) -> ErasedValue {
    Arc::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter: Send + Sync {
        fn count(&self) -> usize;
    }

    impl Capability for dyn Counter {
        const ID: &'static str = "test.counter";
    }

    struct Fixed(usize);

    impl Counter for Fixed {
        fn count(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn test_trait_object_round_trip() {
        let store = ValueStore::new();
        let value: Arc<dyn Counter> = Arc::new(Fixed(7));
        assert!(store.insert(value));
        assert_eq!(store.get::<dyn Counter>().unwrap().count(), 7);
        assert!(store.contains(&CapabilityKey::of::<dyn Counter>()));
    }

    #[test]
    fn test_write_once() {
        let store = ValueStore::new();
        assert!(store.insert::<dyn Counter>(Arc::new(Fixed(1))));
        assert!(!store.insert::<dyn Counter>(Arc::new(Fixed(2))));
        assert_eq!(store.get::<dyn Counter>().unwrap().count(), 1);
        assert_eq!(store.len(), 1);
    }
}
