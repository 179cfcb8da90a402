//! # Cartwheel Testing
//!
//! Testing utilities and helpers for Cartwheel reducers and stores.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits (clock, ids)
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for effects
//! - proptest strategies for collection payloads
//!
//! ## Example
//!
//! ```ignore
//! use cartwheel_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(CartReducer)
//!     .with_env(())
//!     .given_state(CartState::new())
//!     .when_action(CartAction::add_or_increment(&laptop, &test_clock()))
//!     .then_state(|state| assert_eq!(state.item_count(), 1))
//!     .run();
//! ```

use cartwheel_core::environment::{Clock, IdGenerator};
use chrono::{DateTime, Duration, Utc};


/// Mock implementations of Environment traits
///
/// Deterministic clocks and id generators so reducer payloads are
/// reproducible across test runs.
pub mod mocks {
    use super::{Clock, DateTime, Duration, IdGenerator, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use cartwheel_testing::mocks::FixedClock;
    /// use cartwheel_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
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

    /// Clock that advances by a fixed step on every read
    ///
    /// Useful when a test needs distinct, ordered creation timestamps.
    #[derive(Debug)]
    pub struct StepClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl StepClock {
        /// Create a clock starting at `start` and advancing by `step`
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for StepClock {
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in tests
        fn now(&self) -> DateTime<Utc> {
            let mut next = self.next.lock().unwrap();
            let current = *next;
            *next = current + self.step;
            current
        }
    }

    /// Scripted id generator
    ///
    /// Hands out the scripted ids first (duplicates allowed, to exercise
    /// collision handling), then counts upward from one past the largest id
    /// seen so far.
    ///
    /// # Example
    ///
    /// ```
    /// use cartwheel_testing::mocks::TestIds;
    /// use cartwheel_core::environment::IdGenerator;
    ///
    /// let ids = TestIds::scripted([7, 7]);
    /// assert_eq!(ids.next_id(), 7);
    /// assert_eq!(ids.next_id(), 7);
    /// assert_eq!(ids.next_id(), 8);
    /// ```
    #[derive(Debug, Default)]
    pub struct TestIds {
        inner: Mutex<TestIdsInner>,
    }

    #[derive(Debug, Default)]
    struct TestIdsInner {
        scripted: VecDeque<u64>,
        high_water: u64,
    }

    impl TestIds {
        /// Sequential ids starting at 1
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Ids taken from `script` before falling back to counting
        #[must_use]
        pub fn scripted(script: impl IntoIterator<Item = u64>) -> Self {
            Self {
                inner: Mutex::new(TestIdsInner {
                    scripted: script.into_iter().collect(),
                    high_water: 0,
                }),
            }
        }
    }

    impl IdGenerator for TestIds {
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in tests
        fn next_id(&self) -> u64 {
            let mut inner = self.inner.lock().unwrap();
            let id = inner
                .scripted
                .pop_front()
                .unwrap_or(inner.high_water + 1);
            inner.high_water = inner.high_water.max(id);
            id
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing utilities
///
/// proptest strategies for the primitive payloads of collection actions.
/// Domain crates wrap these into their own item types.
pub mod properties {
    use proptest::prelude::*;

    /// Positive prices in cents, from one cent up to 100 000.00
    pub fn positive_cents() -> impl Strategy<Value = i64> {
        1_i64..=10_000_000
    }

    /// Discount rates in basis points within `[0, 10000)`
    pub fn discount_basis_points() -> impl Strategy<Value = u32> {
        0_u32..10_000
    }

    /// Names that are non-empty after trimming
    pub fn item_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,23}"
    }

    /// Signed quantity deltas, biased toward small steps
    pub fn qty_delta() -> impl Strategy<Value = i64> {
        prop_oneof![
            4 => -3_i64..=3,
            1 => -50_i64..=50,
        ]
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, StepClock, TestIds};
pub use reducer_test::{assertions, ReducerTest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn test_step_clock_advances() {
        let start = test_clock().now();
        let clock = StepClock::new(start, Duration::seconds(1));
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + Duration::seconds(1));
    }

    #[test]
    fn test_ids_continue_past_script() {
        let ids = TestIds::scripted([5, 3]);
        assert_eq!(ids.next_id(), 5);
        assert_eq!(ids.next_id(), 3);
        assert_eq!(ids.next_id(), 6);
        assert_eq!(ids.next_id(), 7);
    }

    #[test]
    fn test_ids_default_sequence() {
        let ids = TestIds::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
    }
}
