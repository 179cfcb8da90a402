//! # Cartwheel Core
//!
//! Core traits and types for Cartwheel state containers.
//!
//! This crate provides the abstractions shared by every demo feature:
//! a pure `Reducer`, `Effect` descriptions the runtime executes on the
//! reducer's behalf, and the injected `Environment` dependencies (clock and
//! id generator) that keep reducers deterministic.
//!
//! ## Core Concepts
//!
//! - **State**: Owned domain state for one feature (a collection, a form)
//! - **Action**: Every requested transition, carrying its request-time context
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```
//! use cartwheel_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct TallyState {
//!     total: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum TallyAction {
//!     Add(u32),
//!     Clear,
//! }
//!
//! struct TallyReducer;
//!
//! impl Reducer for TallyReducer {
//!     type State = TallyState;
//!     type Action = TallyAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TallyState,
//!         action: TallyAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<TallyAction>; 4]> {
//!         match action {
//!             TallyAction::Add(n) => state.total += n,
//!             TallyAction::Clear => state.total = 0,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = TallyState::default();
//! TallyReducer.reduce(&mut state, TallyAction::Add(3), &());
//! assert_eq!(state.total, 3);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities
pub mod composition;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all state-transition logic and are deterministic and testable.
/// Anything time- or identity-dependent arrives inside the action.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for CartReducer {
    ///     type State = CartState;
    ///     type Action = CartAction;
    ///     type Environment = ();
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut CartState,
    ///         action: CartAction,
    ///         _env: &(),
    ///     ) -> SmallVec<[Effect<CartAction>; 4]> {
    ///         match action {
    ///             CartAction::Clear => {
    ///                 state.items.clear();
    ///                 smallvec![Effect::None]
    ///             }
    ///             _ => smallvec![Effect::None],
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// Actions that do not apply to the current state (unknown ids,
        /// variants the reducer does not handle) leave the state unchanged.
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Identifier for a cancellable effect
    ///
    /// Scheduling a new cancellable effect under an id that is still running
    /// replaces (and aborts) the previous one.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EffectId(String);

    impl EffectId {
        /// Creates an effect id from any string-like value
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        /// Returns the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (timers, auto-dismiss)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run an effect that can later be aborted with [`Effect::Cancel`]
        Cancellable {
            /// Identifier used to cancel the effect
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort a running cancellable effect (no-op if none is running)
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap this effect so it can be aborted with `Effect::Cancel(id)`
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// Returns `true` for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Transform the actions this effect produces
        ///
        /// Used to lift a feature's effects into a parent action type when
        /// the feature reducer is embedded in a larger state.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Send + Sync + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            self.map_shared(&Arc::new(f))
        }

        fn map_shared<B, F>(self, f: &Arc<F>) -> Effect<B>
        where
            F: Fn(Action) -> B + Send + Sync + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects.into_iter().map(|e| e.map_shared(f)).collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects.into_iter().map(|e| e.map_shared(f)).collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    let f = Arc::clone(f);
                    Effect::Future(Box::pin(async move { fut.await.map(|a| f(a)) }))
                },
                Effect::Cancellable { id, effect } => Effect::Cancellable {
                    id,
                    effect: Box::new(effect.map_shared(f)),
                },
                Effect::Cancel(id) => Effect::Cancel(id),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All non-deterministic inputs (current time, fresh ids) are abstracted
/// behind traits. Callers read them when building an action; reducers only
/// ever see the values inside the action payload.
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use cartwheel_core::environment::{Clock, SystemClock};
    ///
    /// let now = SystemClock.now();
    /// assert!(now.timestamp() > 0);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of fresh collection ids
    ///
    /// Implementations must never hand out the same id twice.
    pub trait IdGenerator: Send + Sync {
        /// Returns the next unused id
        fn next_id(&self) -> u64;
    }

    /// Monotonic in-process id counter
    ///
    /// # Example
    ///
    /// ```
    /// use cartwheel_core::environment::{IdGenerator, SequentialIds};
    ///
    /// let ids = SequentialIds::starting_at(10);
    /// assert_eq!(ids.next_id(), 10);
    /// assert_eq!(ids.next_id(), 11);
    /// ```
    #[derive(Debug)]
    pub struct SequentialIds {
        next: AtomicU64,
    }

    impl SequentialIds {
        /// Counter starting at 1
        #[must_use]
        pub const fn new() -> Self {
            Self::starting_at(1)
        }

        /// Counter starting at `first`
        ///
        /// Use this when a collection is seeded with records whose ids must
        /// not be reissued.
        #[must_use]
        pub const fn starting_at(first: u64) -> Self {
            Self {
                next: AtomicU64::new(first),
            }
        }
    }

    impl Default for SequentialIds {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> u64 {
            self.next.fetch_add(1, Ordering::Relaxed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, EffectId};
    use super::environment::{IdGenerator, SequentialIds};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Inner {
        Ping,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Outer {
        Wrapped(Inner),
    }

    #[test]
    fn sequential_ids_are_unique_and_increasing() {
        let ids = SequentialIds::new();
        let drawn: Vec<u64> = (0..5).map(|_| ids.next_id()).collect();
        assert_eq!(drawn, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn map_lifts_delayed_action() {
        let effect = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(Inner::Ping),
        };

        match effect.map(Outer::Wrapped) {
            Effect::Delay { duration, action } => {
                assert_eq!(duration, Duration::from_millis(5));
                assert_eq!(*action, Outer::Wrapped(Inner::Ping));
            },
            other => unreachable!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn map_preserves_cancellation_ids() {
        let id = EffectId::new("toast");
        let effect: Effect<Inner> = Effect::Delay {
            duration: Duration::from_secs(1),
            action: Box::new(Inner::Ping),
        }
        .cancellable(id.clone());

        let Effect::Cancellable { id: mapped, effect } = effect.map(Outer::Wrapped) else {
            unreachable!("cancellable wrapper dropped");
        };
        assert_eq!(mapped, id);
        assert!(matches!(*effect, Effect::Delay { .. }));

        let cancel: Effect<Outer> = Effect::<Inner>::Cancel(id.clone()).map(Outer::Wrapped);
        assert!(matches!(cancel, Effect::Cancel(ref c) if *c == id));
    }

    #[test]
    fn map_lifts_future_output() {
        let effect: Effect<Inner> = Effect::Future(Box::pin(async { Some(Inner::Ping) }));
        let Effect::Future(fut) = effect.map(Outer::Wrapped) else {
            unreachable!("future effect changed shape");
        };
        let produced = tokio_test::block_on(fut);
        assert_eq!(produced, Some(Outer::Wrapped(Inner::Ping)));
    }
}
