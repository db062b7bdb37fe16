//! # Petal Runtime
//!
//! The [`Store`] runtime that drives `petal-core` reducers.
//!
//! A store owns one piece of state, the reducer that evolves it and the
//! environment the reducer's effects run against. Every call to
//! [`Store::send`] holds the state lock for the whole cycle:
//!
//! 1. reduce the action
//! 2. execute the returned effects
//! 3. reduce every action those effects produced, executing any new effects
//! 4. repeat until no effects remain
//!
//! Concurrent `send` calls on one store are therefore strictly serialized,
//! including their side effects. Give each independently consistent entity
//! its own store to get per-entity serialization without a global lock.

use futures::future::{join_all, BoxFuture};
use petal_core::effect::Effect;
use petal_core::reducer::Reducer;
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub use error::StoreError;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Effects kept producing actions past the configured bound.
        ///
        /// State changes made by the rounds that did run are kept.
        #[error("Feedback loop exceeded {0} rounds")]
        FeedbackLimit(usize),
    }
}

/// Configuration for Store instances
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of reduce → execute rounds a single `send` may take
    pub max_feedback_rounds: usize,
}

impl StoreConfig {
    /// Create a new configuration
    #[must_use]
    pub const fn new(max_feedback_rounds: usize) -> Self {
        Self { max_feedback_rounds }
    }

    /// Set the feedback round limit
    #[must_use]
    pub const fn with_max_feedback_rounds(mut self, rounds: usize) -> Self {
        self.max_feedback_rounds = rounds;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_feedback_rounds: 16,
        }
    }
}

/// The Store - runtime coordinator for a reducer
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Mutex<S>,
    reducer: R,
    environment: E,
    config: StoreConfig,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync,
    A: Clone + Send + 'static,
    S: Send + Sync,
    E: Send + Sync,
{
    /// Create a new store with the default configuration
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_config(initial_state, reducer, environment, StoreConfig::default())
    }

    /// Create a new store with an explicit configuration
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
        Self {
            state: Mutex::new(initial_state),
            reducer,
            environment,
            config,
        }
    }

    /// Send an action through the reducer and run its effects to completion.
    ///
    /// Returns every action the effects produced, in the order they were fed
    /// back. The initial action is not included.
    ///
    /// Effects of one round run before any of their feedback actions are
    /// reduced; within a round, [`Effect::Sequential`] preserves order and
    /// [`Effect::Parallel`] runs its children concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FeedbackLimit`] if effects are still pending
    /// after `max_feedback_rounds` rounds.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<Vec<A>, StoreError> {
        let mut state = self.state.lock().await;
        tracing::trace!("Acquired state lock");
        metrics::counter!("store.actions.total").increment(1);

        let mut pending: VecDeque<Effect<A>> = self.reduce(&mut state, action);
        let mut produced = Vec::new();
        let mut rounds = 0_usize;

        while pending.iter().any(|effect| !effect.is_noop()) {
            rounds += 1;
            if rounds > self.config.max_feedback_rounds {
                tracing::error!(rounds, "Effect feedback loop did not settle");
                return Err(StoreError::FeedbackLimit(self.config.max_feedback_rounds));
            }

            let mut feedback = Vec::new();
            for effect in pending.drain(..) {
                feedback.extend(execute(effect).await);
            }
            tracing::trace!(round = rounds, actions = feedback.len(), "Effects completed");

            for action in feedback {
                produced.push(action.clone());
                let effects = self.reduce(&mut state, action);
                pending.extend(effects);
            }
        }

        Ok(produced)
    }

    /// Read current state via a closure
    ///
    /// Waits for any in-flight `send` to finish first.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.lock().await;
        f(&state)
    }

    fn reduce(&self, state: &mut S, action: A) -> VecDeque<Effect<A>> {
        let start = std::time::Instant::now();
        let effects = self.reducer.reduce(state, action, &self.environment);
        metrics::histogram!("store.reducer.duration_seconds").record(start.elapsed().as_secs_f64());
        effects.into_iter().collect()
    }
}

/// Execute one effect tree and collect the actions it yields.
fn execute<A>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>>
where
    A: Send + 'static,
{
    Box::pin(async move {
        match effect {
            Effect::None => Vec::new(),
            Effect::Future(future) => future.await.into_iter().collect(),
            Effect::Sequential(effects) => {
                let mut actions = Vec::new();
                for effect in effects {
                    actions.extend(execute(effect).await);
                }
                actions
            },
            Effect::Parallel(effects) => join_all(effects.into_iter().map(execute))
                .await
                .into_iter()
                .flatten()
                .collect(),
        }
    })
}
