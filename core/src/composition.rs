//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Embed a feature reducer inside a larger application
//!   state and action type
//!
//! Together they build the single application reducer behind a global store
//! out of independent feature reducers.
//!
//! # Examples
//!
//! ```
//! use cartwheel_core::composition::{combine_reducers, scope_reducer};
//! use cartwheel_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct Tally {
//!     count: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! struct Bump;
//!
//! struct TallyReducer;
//!
//! impl Reducer for TallyReducer {
//!     type State = Tally;
//!     type Action = Bump;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Tally, _action: Bump, _env: &()) -> SmallVec<[Effect<Bump>; 4]> {
//!         state.count += 1;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Clone, Debug, Default)]
//! struct App {
//!     left: Tally,
//!     right: Tally,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Left(Bump),
//!     Right(Bump),
//! }
//!
//! let app = combine_reducers(vec![
//!     Box::new(scope_reducer(
//!         TallyReducer,
//!         |s: &mut App| &mut s.left,
//!         |a: AppAction| match a {
//!             AppAction::Left(b) => Some(b),
//!             AppAction::Right(_) => None,
//!         },
//!         AppAction::Left,
//!         |_: &()| &(),
//!     )),
//!     Box::new(scope_reducer(
//!         TallyReducer,
//!         |s: &mut App| &mut s.right,
//!         |a: AppAction| match a {
//!             AppAction::Right(b) => Some(b),
//!             AppAction::Left(_) => None,
//!         },
//!         AppAction::Right,
//!         |_: &()| &(),
//!     )),
//! ]);
//!
//! let mut state = App::default();
//! let _ = app.reduce(&mut state, AppAction::Right(Bump), &());
//! assert_eq!(state.left.count, 0);
//! assert_eq!(state.right.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// A boxed reducer that can be shared with the runtime's worker tasks
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers in the combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Returns `true` if no reducers were combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|e| !e.is_none()));
        }

        all_effects
    }
}

/// Scopes a feature reducer into a parent state, action and environment.
///
/// - `state` focuses the parent state on the feature's slice
/// - `extract` picks the feature action out of a parent action (or `None`
///   when the parent action belongs to another feature, making it a no-op)
/// - `embed` lifts actions produced by the feature's effects back into the
///   parent action type
/// - `env` projects the parent environment onto the feature's dependencies
pub fn scope_reducer<S, SubS, A, SubA, E, SubE, R>(
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    env: fn(&E) -> &SubE,
) -> ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
        env,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    env: fn(&E) -> &SubE,
}

impl<S, SubS, A, SubA, E, SubE, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
    A: Send + 'static,
    SubA: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(sub_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let effects = self
            .reducer
            .reduce((self.state)(state), sub_action, (self.env)(env));

        effects.into_iter().map(|e| e.map(self.embed)).collect()
    }
}
