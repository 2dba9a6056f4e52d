//! # Lazy Provider - Mockable Lazy Singletons for Rust
//!
//! A minimal service locator: each dependency is a [`Provider`] wrapping a
//! zero-argument factory. The factory runs on first use and its result is
//! shared from then on.
//!
//! ## Features
//!
//! - 🏭 **Lazy** - Factories run on first [`get`](Provider::get), never before
//! - 🧪 **Mockable** - Substitute any provider in tests before first use
//! - ♻️ **Resettable** - Reset one provider, or every provider of a [`Registry`]
//! - 🔁 **Cycle detection** - Re-entrant construction fails with an error instead of recursing
//! - 🧵 **Thread-safe** - Concurrent first use runs the factory exactly once
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use lazy_provider::Registry;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db_url: String,
//! }
//!
//! let registry = Registry::new();
//!
//! let database = registry.provider(|| Database {
//!     url: "postgres://localhost".into(),
//! });
//!
//! let users = {
//!     let database = database.clone();
//!     registry.fallible_provider(move || {
//!         Ok(UserService {
//!             db_url: database.get()?.url.clone(),
//!         })
//!     })
//! };
//!
//! assert_eq!(users.get().unwrap().db_url, "postgres://localhost");
//! ```
//!
//! ## Testing With Mocks
//!
//! ```rust
//! use lazy_provider::Registry;
//!
//! let registry = Registry::new();
//! let clock = registry.provider(|| 1_700_000_000u64);
//!
//! clock.mock(0).unwrap();
//! assert_eq!(*clock.get().unwrap(), 0);
//!
//! // Back to the real factory
//! registry.reset_all();
//! assert_eq!(*clock.get().unwrap(), 1_700_000_000);
//!
//! // Mocking an initialized provider is rejected
//! assert!(clock.mock(0).is_err());
//! ```
//!
//! ## Process-Wide Providers
//!
//! ```rust
//! use lazy_provider::{provider, reset_all};
//!
//! struct Config {
//!     name: String,
//! }
//!
//! provider! {
//!     static CONFIG: Config = || Config { name: "app".into() };
//! }
//!
//! assert_eq!(CONFIG.get().unwrap().name, "app");
//! reset_all();
//! assert!(!CONFIG.is_instantiated());
//! ```

mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registry;
mod wait_graph;

pub use error::*;
pub use provider::*;
pub use registry::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DiError, Injectable, Provider, ProviderState, Registry, Resettable, Result, reset_all,
    };
    pub use std::sync::Arc;
}
