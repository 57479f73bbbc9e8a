//! Capability tokens.
//!
//! A capability is any `'static` type (usually a trait object such as
//! `dyn KarmaStore`) that plugins exchange through the injector. Each one
//! carries a stable human-readable identifier used in diagnostics, while
//! identity is decided by [`TypeId`].
//!
//! ```rust,ignore
//! pub trait KarmaStore: Send + Sync {
//!     fn bump(&self, name: &str, delta: i64) -> i64;
//! }
//!
//! impl Capability for dyn KarmaStore {
//!     const ID: &'static str = "karma.store";
//! }
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker trait for values exchanged between plugins.
pub trait Capability: Send + Sync + 'static {
    /// Stable identifier shown in logs and resolver reports.
    const ID: &'static str;
}

/// Type-level identity of a capability.
///
/// Equality and hashing use only the [`TypeId`]; the id string is carried
/// for display.
#[derive(Clone, Copy)]
pub struct CapabilityKey {
    type_id: TypeId,
    id: &'static str,
}

impl CapabilityKey {
    /// Returns the key for capability `T`.
    pub fn of<T: Capability + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            id: T::ID,
        }
    }

    /// Returns the human-readable identifier.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Returns the underlying type id.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilityKey({})", self.id)
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Greeter: Send + Sync {}

    impl Capability for dyn Greeter {
        const ID: &'static str = "test.greeter";
    }

    struct Counter;

    impl Capability for Counter {
        const ID: &'static str = "test.counter";
    }

    #[test]
    fn test_keys_compare_by_type() {
        let a = CapabilityKey::of::<dyn Greeter>();
        let b = CapabilityKey::of::<dyn Greeter>();
        let c = CapabilityKey::of::<Counter>();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(CapabilityKey::of::<dyn Greeter>().to_string(), "test.greeter");
        assert_eq!(CapabilityKey::of::<Counter>().id(), "test.counter");
    }
}
