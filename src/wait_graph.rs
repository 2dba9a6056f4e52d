//! Cross-thread cycle detection
//!
//! A thread that blocks on another thread's pending construction records a
//! waits-for edge here. Blocking is refused when the new edge would close a
//! cycle, which is what two providers depending on each other look like when
//! they are first used from two threads at once.
//!
//! Edges are added and released while the provider's slot lock is held, so
//! the graph always matches the pending markers it mirrors.

use ahash::RandomState;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;

#[derive(Debug, Clone, Copy)]
struct WaitEdge {
    /// Address of the provider's shared state
    provider: usize,
    /// Thread holding that provider's pending marker
    owner: ThreadId,
}

type Edges = HashMap<ThreadId, WaitEdge, RandomState>;

static WAITING: Lazy<Mutex<Edges>> =
    Lazy::new(|| Mutex::new(HashMap::with_hasher(RandomState::new())));

fn lock() -> MutexGuard<'static, Edges> {
    WAITING.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record that `waiter` blocks on `provider`, pending on `owner`.
///
/// Returns false, recording nothing, if `owner` is already (transitively)
/// waiting on `waiter`.
pub(crate) fn begin_wait(waiter: ThreadId, provider: usize, owner: ThreadId) -> bool {
    let mut edges = lock();

    // The graph is acyclic, so the walk terminates
    let mut cursor = owner;
    loop {
        if cursor == waiter {
            return false;
        }
        match edges.get(&cursor) {
            Some(edge) => cursor = edge.owner,
            None => break,
        }
    }

    edges.insert(waiter, WaitEdge { provider, owner });
    true
}

/// Drop the edge of a thread that woke up.
pub(crate) fn end_wait(waiter: ThreadId) {
    lock().remove(&waiter);
}

/// Drop every edge into `provider` once its pending marker is cleared.
pub(crate) fn release(provider: usize) {
    lock().retain(|_, edge| edge.provider != provider);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn spawn_id() -> ThreadId {
        thread::spawn(|| thread::current().id()).join().unwrap()
    }

    #[test]
    fn test_two_thread_cycle_is_refused() {
        let (a, b) = (spawn_id(), spawn_id());

        assert!(begin_wait(a, 1, b));
        assert!(!begin_wait(b, 2, a));

        end_wait(a);
        assert!(begin_wait(b, 2, a));
        end_wait(b);
    }

    #[test]
    fn test_transitive_cycle_is_refused() {
        let (a, b, c) = (spawn_id(), spawn_id(), spawn_id());

        assert!(begin_wait(a, 10, b));
        assert!(begin_wait(b, 11, c));
        assert!(!begin_wait(c, 12, a));

        release(11);
        assert!(begin_wait(c, 12, a));

        end_wait(a);
        end_wait(c);
    }
}
