//! # Petal Testing
//!
//! Testing utilities for Petal reducers:
//!
//! - [`mocks::FixedClock`] and [`test_clock`] for deterministic timestamps
//! - [`ReducerTest`], a Given-When-Then harness for a single reduction
//! - [`effects::collect_actions`] to run returned effects without a store
//! - [`assertions`] for effect shapes

use chrono::{DateTime, Utc};
use petal_core::environment::Clock;


pub use reducer_test::{assertions, effects, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// ```
    /// use petal_testing::mocks::FixedClock;
    /// use petal_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-02-14 09:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        // 2025-02-14T09:00:00Z
        let time = DateTime::<Utc>::from_timestamp(1_739_523_600, 0).unwrap_or_default();
        FixedClock::new(time)
    }
}

pub use mocks::{test_clock, FixedClock};
