//! Registry of every provider, used for bulk reset
//!
//! Providers are generic over heterogeneous `T`, so the registry only sees
//! them through the type-erased [`Resettable`] capability.

use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(feature = "logging")]
use tracing::debug;

/// Non-generic capability every provider exposes to its registry.
pub trait Resettable: Send + Sync {
    /// Drop any cached instance or mock so the next use runs the factory again.
    fn reset(&self);

    /// Name of the provided type (for debugging)
    fn type_name(&self) -> &'static str;
}

type Members = Vec<Arc<dyn Resettable>>;

/// Append-only, insertion-ordered collection of providers.
///
/// Cloning a `Registry` yields another handle to the same collection.
///
/// # Examples
///
/// ```rust
/// use lazy_provider::Registry;
///
/// let registry = Registry::new();
/// let answer = registry.provider(|| 42u32);
///
/// assert_eq!(*answer.get().unwrap(), 42);
/// registry.reset_all();
/// assert!(!answer.is_instantiated());
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    members: Arc<Mutex<Members>>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(|| {
    #[cfg(feature = "logging")]
    debug!(target: "lazy_provider", "Creating process-wide provider registry");

    Registry::new()
});

impl Registry {
    /// Create a new, empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`Provider::new`](crate::Provider::new).
    #[inline]
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Append a provider. Called once per provider, at construction.
    pub(crate) fn register(&self, member: Arc<dyn Resettable>) {
        let mut members = self.lock();

        #[cfg(feature = "logging")]
        debug!(
            target: "lazy_provider",
            service = member.type_name(),
            position = members.len(),
            "Registering provider"
        );

        members.push(member);
    }

    /// Reset every registered provider, in registration order.
    pub fn reset_all(&self) {
        // Snapshot so provider resets never run under the registry lock.
        let members: Members = self.lock().clone();

        #[cfg(feature = "logging")]
        debug!(
            target: "lazy_provider",
            provider_count = members.len(),
            "Resetting all providers"
        );

        for member in &members {
            member.reset();
        }
    }

    /// Number of registered providers.
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no provider has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every registered provider.
    ///
    /// Intended for test harnesses that share a registry between suites.
    /// Providers stay usable, they are just no longer reached by
    /// [`reset_all`](Self::reset_all).
    pub fn clear(&self) {
        let mut members = self.lock();

        #[cfg(feature = "logging")]
        debug!(
            target: "lazy_provider",
            provider_count = members.len(),
            "Clearing provider registry"
        );

        members.clear();
    }

    /// Registered type names, in registration order.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.lock().iter().map(|m| m.type_name()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Members> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.type_names())
            .finish()
    }
}

/// Reset every provider in the process-wide registry.
#[inline]
pub fn reset_all() {
    Registry::global().reset_all();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Resettable for Recorder {
        fn reset(&self) {
            self.log.lock().unwrap().push(self.name);
        }

        fn type_name(&self) -> &'static str {
            self.name
        }
    }

    #[test]
    fn test_reset_all_in_registration_order() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            registry.register(Arc::new(Recorder {
                name,
                log: Arc::clone(&log),
            }));
        }

        registry.reset_all();
        registry.reset_all();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first", "second", "third", "first", "second", "third"]
        );
    }

    #[test]
    fn test_len_and_clear() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(Arc::new(Recorder {
            name: "only",
            log: Arc::clone(&log),
        }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.type_names(), vec!["only"]);

        registry.clear();
        assert!(registry.is_empty());

        registry.reset_all();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_members() {
        let registry = Registry::new();
        let handle = registry.clone();

        handle.register(Arc::new(Recorder {
            name: "shared",
            log: Arc::new(Mutex::new(Vec::new())),
        }));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_is_a_single_instance() {
        let a = Registry::global() as *const Registry;
        let b = Registry::global() as *const Registry;
        assert_eq!(a, b);
    }
}
