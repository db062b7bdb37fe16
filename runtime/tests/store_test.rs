//! Integration tests for the Store runtime
//!
//! A small stock-counter reducer exercises the feedback loop, effect
//! ordering and per-store serialization.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use petal_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use petal_runtime::{Store, StoreConfig, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Clone, Debug, Default)]
struct CounterState {
    reserved: u32,
    confirmations: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq)]
enum CounterAction {
    Reserve(u32),
    Reserved(u32),
    Confirmed(u32),
    Both,
    Loop,
}

#[derive(Clone)]
struct CounterEnv {
    calls: Arc<AtomicU32>,
}

struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Environment = CounterEnv;

    fn reduce(
        &self,
        state: &mut CounterState,
        action: CounterAction,
        env: &CounterEnv,
    ) -> SmallVec<[Effect<CounterAction>; 4]> {
        match action {
            CounterAction::Reserve(n) => {
                let calls = Arc::clone(&env.calls);
                smallvec![Effect::future(async move {
                    // Yield so concurrent senders get a chance to interleave
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some(CounterAction::Reserved(n))
                })]
            },
            CounterAction::Reserved(n) => {
                state.reserved += n;
                smallvec![Effect::emit(CounterAction::Confirmed(state.reserved))]
            },
            CounterAction::Confirmed(total) => {
                state.confirmations.push(total);
                smallvec![Effect::None]
            },
            CounterAction::Both => smallvec![Effect::chain(vec![
                Effect::emit(CounterAction::Confirmed(1)),
                Effect::None,
                Effect::emit(CounterAction::Confirmed(2)),
            ])],
            CounterAction::Loop => smallvec![Effect::emit(CounterAction::Loop)],
        }
    }
}

fn store() -> Store<CounterState, CounterAction, CounterEnv, CounterReducer> {
    Store::new(
        CounterState::default(),
        CounterReducer,
        CounterEnv {
            calls: Arc::new(AtomicU32::new(0)),
        },
    )
}

#[tokio::test]
async fn send_runs_feedback_to_completion() {
    let store = store();

    let produced = store.send(CounterAction::Reserve(3)).await.unwrap();

    assert_eq!(
        produced,
        vec![CounterAction::Reserved(3), CounterAction::Confirmed(3)]
    );
    let state = store.state(Clone::clone).await;
    assert_eq!(state.reserved, 3);
    assert_eq!(state.confirmations, vec![3]);
}

#[tokio::test]
async fn sequential_effects_keep_their_order() {
    let store = store();

    let produced = store.send(CounterAction::Both).await.unwrap();

    assert_eq!(
        produced,
        vec![CounterAction::Confirmed(1), CounterAction::Confirmed(2)]
    );
}

#[tokio::test]
async fn concurrent_sends_are_serialized() {
    let store = Arc::new(store());

    let handles: Vec<_> = (1..=5)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.send(CounterAction::Reserve(n)).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = store.state(Clone::clone).await;
    assert_eq!(state.reserved, 15);
    // Each confirmation observes a strictly larger running total
    let mut sorted = state.confirmations.clone();
    sorted.sort_unstable();
    assert_eq!(state.confirmations, sorted);
    assert_eq!(state.confirmations.len(), 5);
}

#[tokio::test]
async fn runaway_feedback_is_bounded() {
    let store = Store::with_config(
        CounterState::default(),
        CounterReducer,
        CounterEnv {
            calls: Arc::new(AtomicU32::new(0)),
        },
        StoreConfig::default().with_max_feedback_rounds(3),
    );

    let result = store.send(CounterAction::Loop).await;

    assert_eq!(result, Err(StoreError::FeedbackLimit(3)));
}
