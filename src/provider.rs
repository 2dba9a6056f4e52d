//! Lazily-initialized, mockable providers
//!
//! A [`Provider`] wraps a zero-argument factory. The first [`get`](Provider::get)
//! runs the factory and caches the result; later calls hand out the cached
//! `Arc<T>`. Tests can substitute a value with [`mock`](Provider::mock) before
//! first use, and [`reset`](Provider::reset) puts the provider back to empty.

use crate::registry::{Registry, Resettable};
use crate::{DiError, Result, wait_graph};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Marker trait for types a provider can hold.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Observable lifecycle state of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderState {
    /// Nothing cached, next `get` runs the factory
    #[default]
    Empty,

    /// Factory is currently running
    Pending,

    /// A mock overrides the factory
    Mocked,

    /// Factory ran and its result is cached
    Instantiated,
}

/// Type-erased factory. Infallible factories are wrapped to always return `Ok`.
type FactoryFn<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

struct Slot<T> {
    instance: Option<Arc<T>>,
    mock: Option<Arc<T>>,
    /// Thread currently running the factory
    pending: Option<ThreadId>,
    /// Bumped on every reset
    epoch: u64,
    /// Constructions finished within this epoch
    completed: u64,
    /// Error of the last finished construction, handed to its waiters
    failure: Option<DiError>,
}

impl<T> Slot<T> {
    fn state(&self) -> ProviderState {
        if self.mock.is_some() {
            ProviderState::Mocked
        } else if self.instance.is_some() {
            ProviderState::Instantiated
        } else if self.pending.is_some() {
            ProviderState::Pending
        } else {
            ProviderState::Empty
        }
    }
}

struct Shared<T> {
    factory: FactoryFn<T>,
    slot: Mutex<Slot<T>>,
    /// Signalled whenever a pending construction ends or the provider resets
    settled: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identity of this provider in the waits-for graph
    fn key(&self) -> usize {
        self as *const Self as usize
    }
}

impl<T: Injectable> Resettable for Shared<T> {
    fn reset(&self) {
        let mut slot = self.lock();

        #[cfg(feature = "logging")]
        debug!(
            target: "lazy_provider",
            service = std::any::type_name::<T>(),
            state = ?slot.state(),
            "Resetting provider"
        );

        slot.mock = None;
        slot.instance = None;
        slot.pending = None;
        slot.failure = None;
        slot.completed = 0;
        slot.epoch = slot.epoch.wrapping_add(1);
        wait_graph::release(self.key());
        drop(slot);

        self.settled.notify_all();
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Clears the pending marker when the factory finishes, errors or panics,
/// publishing `instance` or `failure` to the slot.
///
/// Nothing is written if the provider was reset while the factory ran.
struct PendingGuard<'a, T> {
    shared: &'a Shared<T>,
    epoch: u64,
    instance: Option<Arc<T>>,
    failure: Option<DiError>,
}

impl<T> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        let mut slot = self.shared.lock();
        if slot.epoch == self.epoch {
            slot.pending = None;
            slot.instance = self.instance.take();
            slot.failure = self.failure.take();
            slot.completed = slot.completed.wrapping_add(1);
            wait_graph::release(self.shared.key());
        }
        drop(slot);

        self.shared.settled.notify_all();
    }
}

/// A lazily-constructed, memoized dependency of type `T`.
///
/// Cloning a `Provider` yields another handle to the same cached value.
///
/// # Examples
///
/// ```rust
/// use lazy_provider::Registry;
/// use std::sync::Arc;
///
/// struct Database {
///     url: String,
/// }
///
/// let registry = Registry::new();
/// let database = registry.provider(|| Database {
///     url: "postgres://localhost".into(),
/// });
///
/// let a = database.get().unwrap();
/// let b = database.get().unwrap();
/// assert_eq!(a.url, "postgres://localhost");
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct Provider<T: Injectable> {
    shared: Arc<Shared<T>>,
}

impl<T: Injectable> Provider<T> {
    /// Create a provider registered in the process-wide registry.
    ///
    /// The factory is not called until the first [`get`](Self::get).
    #[inline]
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Registry::global().provider(factory)
    }

    /// Create a provider whose factory may fail, registered in the
    /// process-wide registry.
    ///
    /// Errors returned by the factory are passed through `get` unchanged,
    /// so a factory can use `?` on the providers it depends on.
    #[inline]
    pub fn fallible<F>(factory: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Registry::global().fallible_provider(factory)
    }

    fn register_in(registry: &Registry, factory: FactoryFn<T>) -> Self {
        let shared = Arc::new(Shared {
            factory,
            slot: Mutex::new(Slot {
                instance: None,
                mock: None,
                pending: None,
                epoch: 0,
                completed: 0,
                failure: None,
            }),
            settled: Condvar::new(),
        });

        registry.register(Arc::clone(&shared) as Arc<dyn Resettable>);

        Self { shared }
    }

    /// Get the held value, running the factory on first use.
    ///
    /// A mock, if set, is returned without touching the factory. Re-entering
    /// `get` from inside this provider's own factory (directly or through
    /// other providers) fails with [`DiError::CircularDependency`]. A call
    /// from another thread while the factory runs waits for it to finish and
    /// shares its outcome, unless waiting would close a cycle between
    /// threads, which also fails with `CircularDependency`.
    pub fn get(&self) -> Result<Arc<T>> {
        let current = thread::current().id();
        let mut slot = self.shared.lock();
        // (epoch, completed) seen before blocking on another thread
        let mut waited_on = None;

        loop {
            if let Some(mock) = &slot.mock {
                #[cfg(feature = "logging")]
                trace!(
                    target: "lazy_provider",
                    service = self.type_name(),
                    "Returning mock"
                );
                return Ok(Arc::clone(mock));
            }

            if let Some(instance) = &slot.instance {
                #[cfg(feature = "logging")]
                trace!(
                    target: "lazy_provider",
                    service = self.type_name(),
                    "Provider already initialized, returning cached instance"
                );
                return Ok(Arc::clone(instance));
            }

            if let Some((epoch, completed)) = waited_on.take() {
                if slot.epoch == epoch && slot.completed != completed {
                    if let Some(err) = &slot.failure {
                        return Err(err.clone());
                    }
                }
            }

            let pending = slot.pending;
            match pending {
                Some(owner) if owner == current => {
                    #[cfg(feature = "logging")]
                    warn!(
                        target: "lazy_provider",
                        service = self.type_name(),
                        "Circular dependency detected"
                    );
                    return Err(DiError::circular::<T>());
                }
                Some(owner) => {
                    if !wait_graph::begin_wait(current, self.shared.key(), owner) {
                        #[cfg(feature = "logging")]
                        warn!(
                            target: "lazy_provider",
                            service = self.type_name(),
                            "Circular dependency detected across threads"
                        );
                        return Err(DiError::circular::<T>());
                    }

                    waited_on = Some((slot.epoch, slot.completed));
                    slot = self
                        .shared
                        .settled
                        .wait(slot)
                        .unwrap_or_else(PoisonError::into_inner);
                    wait_graph::end_wait(current);
                }
                None => break,
            }
        }

        slot.pending = Some(current);
        let mut guard = PendingGuard {
            shared: &self.shared,
            epoch: slot.epoch,
            instance: None,
            failure: None,
        };
        drop(slot);

        #[cfg(feature = "logging")]
        debug!(
            target: "lazy_provider",
            service = self.type_name(),
            "Provider initializing on first use"
        );

        let value = match (self.shared.factory)() {
            Ok(value) => Arc::new(value),
            Err(err) => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "lazy_provider",
                    service = self.type_name(),
                    error = %err,
                    "Provider factory failed"
                );
                guard.failure = Some(err.clone());
                return Err(err);
            }
        };

        guard.instance = Some(Arc::clone(&value));
        drop(guard);

        Ok(value)
    }

    /// Get the held value, returning None on any error.
    #[inline]
    pub fn try_get(&self) -> Option<Arc<T>> {
        self.get().ok()
    }

    /// Override the provider with `value`.
    ///
    /// Must happen before first real use; once the factory has produced an
    /// instance this fails with [`DiError::AlreadyInitialized`] and the
    /// instance is left untouched. Mocking again before that replaces the
    /// previous mock.
    #[inline]
    pub fn mock(&self, value: T) -> Result<()> {
        self.mock_arc(Arc::new(value))
    }

    /// Override the provider with an existing `Arc`.
    pub fn mock_arc(&self, value: Arc<T>) -> Result<()> {
        let mut slot = self.shared.lock();

        if slot.instance.is_some() {
            #[cfg(feature = "logging")]
            warn!(
                target: "lazy_provider",
                service = self.type_name(),
                "Rejected mock, provider already initialized"
            );
            return Err(DiError::already_initialized::<T>());
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "lazy_provider",
            service = self.type_name(),
            replaces_mock = slot.mock.is_some(),
            "Mocking provider"
        );

        slot.mock = Some(value);
        Ok(())
    }

    /// Clear mock, cached instance and pending state.
    ///
    /// The next `get` runs the factory again.
    #[inline]
    pub fn reset(&self) {
        self.shared.reset();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProviderState {
        self.shared.lock().state()
    }

    /// Check if the factory has produced a cached instance.
    #[inline]
    pub fn is_instantiated(&self) -> bool {
        self.shared.lock().instance.is_some()
    }

    /// Check if a mock is set.
    #[inline]
    pub fn is_mocked(&self) -> bool {
        self.shared.lock().mock.is_some()
    }

    /// Name of the provided type
    #[inline]
    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: Injectable> Clone for Provider<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Injectable> std::fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("type_name", &self.type_name())
            .field("state", &self.state())
            .finish()
    }
}

impl Registry {
    /// Create a provider registered in this registry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_provider::Registry;
    ///
    /// let registry = Registry::new();
    /// let greeting = registry.provider(|| String::from("hello"));
    ///
    /// greeting.mock(String::from("mocked")).unwrap();
    /// assert_eq!(*greeting.get().unwrap(), "mocked");
    /// ```
    #[inline]
    pub fn provider<T, F>(&self, factory: F) -> Provider<T>
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Provider::register_in(self, Box::new(move || Ok(factory())))
    }

    /// Create a provider with a fallible factory registered in this registry.
    #[inline]
    pub fn fallible_provider<T, F>(&self, factory: F) -> Provider<T>
    where
        T: Injectable,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Provider::register_in(self, Box::new(factory))
    }
}

/// Declare process-wide providers as statics.
///
/// Each static is registered in the global registry on first access.
///
/// ```rust
/// use lazy_provider::provider;
///
/// struct Config {
///     debug: bool,
/// }
///
/// provider! {
///     static CONFIG: Config = || Config { debug: true };
/// }
///
/// assert!(CONFIG.get().unwrap().debug);
/// ```
#[macro_export]
macro_rules! provider {
    ($($(#[$attr:meta])* $vis:vis static $name:ident : $ty:ty = $factory:expr;)+) => {
        $(
            $(#[$attr])*
            $vis static $name: $crate::__private::Lazy<$crate::Provider<$ty>> =
                $crate::__private::Lazy::new(|| $crate::Provider::new($factory));
        )+
    };
}
