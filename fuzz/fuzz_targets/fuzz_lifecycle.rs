#![no_main]

//! Fuzz target for provider lifecycle operations
//!
//! Drives get/mock/reset/reset_all on a few providers and checks each
//! result against a simple model of the expected state.

use arbitrary::Arbitrary;
use lazy_provider::{DiError, Provider, ProviderState, Registry};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const PROVIDERS: usize = 3;

#[derive(Debug, Arbitrary)]
enum LifecycleOp {
    Get(u8),
    Mock(u8, u64),
    Reset(u8),
    ResetAll,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Model {
    Empty,
    Mocked(u64),
    Instantiated(u64),
}

fuzz_target!(|ops: Vec<LifecycleOp>| {
    let registry = Registry::new();
    let calls: Vec<Arc<AtomicU64>> = (0..PROVIDERS).map(|_| Arc::new(AtomicU64::new(0))).collect();
    let providers: Vec<Provider<u64>> = calls
        .iter()
        .map(|counter| {
            let counter = Arc::clone(counter);
            // Factory values are odd so they never collide with the model's mocks
            registry.provider(move || counter.fetch_add(1, Ordering::SeqCst) * 2 + 1)
        })
        .collect();
    let mut model = [Model::Empty; PROVIDERS];

    for op in ops.into_iter().take(200) {
        match op {
            LifecycleOp::Get(i) => {
                let i = i as usize % PROVIDERS;
                let value = *providers[i].get().expect("no cycles here");
                match model[i] {
                    Model::Empty => {
                        let expected = (calls[i].load(Ordering::SeqCst) - 1) * 2 + 1;
                        assert_eq!(value, expected);
                        model[i] = Model::Instantiated(value);
                    }
                    Model::Mocked(v) | Model::Instantiated(v) => assert_eq!(value, v),
                }
            }
            LifecycleOp::Mock(i, v) => {
                let i = i as usize % PROVIDERS;
                let v = v & !1;
                match (providers[i].mock(v), model[i]) {
                    (Err(DiError::AlreadyInitialized { .. }), Model::Instantiated(_)) => {}
                    (Ok(()), Model::Empty | Model::Mocked(_)) => model[i] = Model::Mocked(v),
                    (result, state) => panic!("unexpected {result:?} in {state:?}"),
                }
            }
            LifecycleOp::Reset(i) => {
                let i = i as usize % PROVIDERS;
                providers[i].reset();
                model[i] = Model::Empty;
            }
            LifecycleOp::ResetAll => {
                registry.reset_all();
                model = [Model::Empty; PROVIDERS];
            }
        }
    }

    for (provider, state) in providers.iter().zip(model) {
        let expected = match state {
            Model::Empty => ProviderState::Empty,
            Model::Mocked(_) => ProviderState::Mocked,
            Model::Instantiated(_) => ProviderState::Instantiated,
        };
        assert_eq!(provider.state(), expected);
    }
});
