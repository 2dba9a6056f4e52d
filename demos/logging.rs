//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use lazy_provider::{DiError, Provider, Registry};
use once_cell::sync::OnceCell;
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: Arc<Database>,
}

#[allow(dead_code)]
#[derive(Debug)]
struct Cyclic;

fn main() {
    lazy_provider::logging::builder().trace().provider_only().init();

    println!("=== Lazy Provider Logging Demo ===\n");

    let registry = Registry::new();

    // Registration (logs: "Registering provider")
    let database = registry.provider(|| {
        println!("  [App] Connecting to database...");
        Database {
            url: "postgres://localhost/mydb".into(),
        }
    });

    let users = {
        let database = database.clone();
        registry.fallible_provider(move || {
            Ok(UserService {
                db: database.get()?,
            })
        })
    };

    // First use (logs: "Provider initializing on first use" twice)
    let _users = users.get().unwrap();

    // Cached (logs at trace: "returning cached instance")
    let _db = database.get().unwrap();

    // Rejected mock (logs: "Rejected mock, provider already initialized")
    let rejected = database.mock(Database {
        url: "sqlite::memory:".into(),
    });
    assert!(matches!(rejected, Err(DiError::AlreadyInitialized { .. })));

    // Reset then mock (logs: "Resetting all providers", "Mocking provider")
    registry.reset_all();
    database
        .mock(Database {
            url: "sqlite::memory:".into(),
        })
        .unwrap();
    let _mocked = users.get().unwrap();

    // Cycle (logs: "Circular dependency detected")
    let cell: Arc<OnceCell<Provider<Cyclic>>> = Arc::new(OnceCell::new());
    let cyclic = {
        let cell = Arc::clone(&cell);
        registry.fallible_provider(move || {
            if let Some(me) = cell.get() {
                me.get()?;
            }
            Ok(Cyclic)
        })
    };
    let _ = cell.set(cyclic.clone());
    let err = cyclic.get().unwrap_err();
    println!("  [App] {err}");

    println!("\n=== Demo Complete ===");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
