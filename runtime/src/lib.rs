//! # Cartwheel Runtime
//!
//! Runtime implementation for Cartwheel state containers.
//!
//! This crate provides the [`Store`]: the one component that owns an
//! application state, applies actions to it through a reducer, and executes
//! the effects the reducer describes.
//!
//! ## Core Components
//!
//! - **Store**: Owns state behind a lock; every `send` runs the reducer to
//!   completion before the next one is observed
//! - **Effect Executor**: Runs effect descriptions (futures, delays,
//!   cancellable timers) and feeds produced actions back into the store
//! - **Action Broadcast**: Every reduced action is published so views can
//!   re-read state after each dispatch
//!
//! ## Example
//!
//! ```ignore
//! use cartwheel_runtime::Store;
//!
//! let store = Store::new(CartState::new(), CartReducer::new(), ());
//!
//! // Dispatch
//! store.send(CartAction::Clear).await?;
//!
//! // Read state
//! let lines = store.state(|s| s.items.len()).await;
//! ```

use cartwheel_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Metric names recorded by the runtime
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;

/// Boxed effect future executed on the tokio runtime
type EffectFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use cartwheel_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects spawned by
/// that action. A cancelled effect counts as complete.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle and its internal tracking context
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // All trackers dropped: nothing left to wait for
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Runs on completion, panic, and abort alike.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect, EffectFuture,
        EffectHandle, EffectId, EffectTracking, Ordering, Reducer, StoreConfig, StoreError,
    };
    use crate::metrics::{
        counter, histogram, register_metrics, ACTIONS_REJECTED, ACTIONS_TOTAL, EFFECTS_CANCELLED,
        EFFECTS_COUNT, EFFECTS_EXECUTED, REDUCER_DURATION,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64};
    use std::sync::Mutex;
    use tokio::sync::{broadcast, RwLock};
    use tokio::task::{AbortHandle, JoinHandle, JoinSet};

    /// A running cancellable effect
    struct Registration {
        generation: u64,
        abort: AbortHandle,
    }

    struct Shared<S, A, E, R> {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        action_broadcast: broadcast::Sender<A>,
        cancellables: Mutex<HashMap<EffectId, Registration>>,
        next_generation: AtomicU64,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (transition logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Cloning a store clones the handle, not the state: every clone
    /// dispatches into and reads from the same state.
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
        shared: Arc<Shared<S, A, E, R>>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                shared: Arc::clone(&self.shared),
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("config", &self.shared.config)
                .field(
                    "pending_effects",
                    &self.shared.pending_effects.load(Ordering::SeqCst),
                )
                .finish_non_exhaustive()
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            register_metrics();
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                shared: Arc::new(Shared {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    config,
                    shutdown: AtomicBool::new(false),
                    pending_effects: Arc::new(AtomicUsize::new(0)),
                    action_broadcast,
                    cancellables: Mutex::new(HashMap::new()),
                    next_generation: AtomicU64::new(0),
                }),
            }
        }

        /// The configuration this store was built with
        #[must_use]
        pub fn config(&self) -> &StoreConfig {
            &self.shared.config
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Publishes the action to observers
        /// 4. Starts the returned effects; actions they produce are sent back
        ///
        /// Concurrent `send()` calls serialize at the reducer: each one runs
        /// to completion before the next acquires the lock. `send()` returns
        /// after starting effects, not after they finish.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shared.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                counter!(ACTIONS_REJECTED).increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            counter!(ACTIONS_TOTAL).increment(1);

            let (handle, tracking) = EffectHandle::new();
            let observed = action.clone();

            let effects = {
                let mut state = self.shared.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects =
                    self.shared
                        .reducer
                        .reduce(&mut *state, action, &self.shared.environment);
                histogram!(REDUCER_DURATION).record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                // Note: Precision loss acceptable for metrics (effect counts < 2^52)
                #[allow(clippy::cast_precision_loss)]
                histogram!(EFFECTS_COUNT).record(effects.len() as f64);

                effects
            };

            // No receivers is fine: nobody is watching yet
            let _ = self.shared.action_broadcast.send(observed);

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }

            Ok(handle)
        }

        /// Send an action and wait until every effect it started is finished
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
        /// - [`StoreError::Timeout`] if the effects outlive `timeout`
        pub async fn send_and_settle(&self, action: A, timeout: Duration) -> Result<(), StoreError> {
            let mut handle = self.send(action).await?;
            handle.wait_with_timeout(timeout).await
        }

        /// Subscribe to every action this store reduces
        ///
        /// The receiver gets a clone of each action after its state change is
        /// visible, including actions fed back by effects. Lagging receivers
        /// skip old actions and observe `RecvError::Lagged`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.shared.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let lines = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.shared.state.read().await;
            f(&*state)
        }

        /// Clone the whole current state
        pub async fn snapshot(&self) -> S
        where
            S: Clone,
        {
            self.state(S::clone).await
        }

        /// Returns `true` while a cancellable effect is registered under `id`
        ///
        /// # Panics
        ///
        /// Panics if the cancellation registry mutex is poisoned.
        #[must_use]
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
        pub fn is_running(&self, id: &EffectId) -> bool {
            self.shared.cancellables.lock().unwrap().contains_key(id)
        }

        /// Initiate graceful shutdown
        ///
        /// New actions are rejected, running cancellable effects are aborted,
        /// and the call waits for the remaining effects to drain.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        ///
        /// # Panics
        ///
        /// Panics if the cancellation registry mutex is poisoned.
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shared.shutdown.store(true, Ordering::Release);

            let aborted: Vec<Registration> = self
                .shared
                .cancellables
                .lock()
                .unwrap()
                .drain()
                .map(|(_, registration)| registration)
                .collect();
            for registration in aborted {
                registration.abort.abort();
                counter!(EFFECTS_CANCELLED).increment(1);
            }

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.shared.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running",
                        pending
                    );
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Start a top-level effect returned by the reducer
        ///
        /// `Cancel` and `Cancellable` registration happen synchronously so
        /// that a reducer returning `[Cancel(id), Cancellable { id, .. }]`
        /// replaces the old effect and keeps the new one.
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    counter!(EFFECTS_EXECUTED, "type" => "none").increment(1);
                },
                Effect::Cancel(id) => self.cancel(&id),
                Effect::Cancellable { id, effect } => {
                    let _ = self.spawn_cancellable(id, *effect, Some(tracking));
                },
                other => {
                    let fut = self.run_effect(other);
                    let _ = self.spawn_tracked(fut, Some(tracking));
                },
            }
        }

        /// Spawn an effect future, keeping the per-action and global counters
        fn spawn_tracked(&self, fut: EffectFuture, tracking: Option<&EffectTracking>) -> JoinHandle<()> {
            let tracking_guard = tracking.map(|t| {
                t.increment();
                DecrementGuard(t.clone())
            });

            self.shared.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.shared.pending_effects));

            tokio::spawn(async move {
                let _guard = tracking_guard;
                let _pending_guard = pending_guard;
                fut.await;
            })
        }

        /// Register and spawn a cancellable effect, aborting any previous
        /// effect running under the same id
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
        fn spawn_cancellable(
            &self,
            id: EffectId,
            effect: Effect<A>,
            tracking: Option<&EffectTracking>,
        ) -> JoinHandle<()> {
            let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
            let inner = self.run_effect(effect);
            let store = self.clone();
            let finished_id = id.clone();

            let fut: EffectFuture = Box::pin(async move {
                inner.await;
                store.unregister(&finished_id, generation);
            });

            // Hold the registry while spawning so the task cannot unregister
            // before its own registration exists
            let mut registry = self.shared.cancellables.lock().unwrap();
            let join = self.spawn_tracked(fut, tracking);
            let previous = registry.insert(
                id.clone(),
                Registration {
                    generation,
                    abort: join.abort_handle(),
                },
            );
            drop(registry);

            if let Some(previous) = previous {
                tracing::debug!(effect_id = %id, "Replacing running cancellable effect");
                previous.abort.abort();
                counter!(EFFECTS_CANCELLED).increment(1);
            }

            join
        }

        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
        fn cancel(&self, id: &EffectId) {
            let removed = self.shared.cancellables.lock().unwrap().remove(id);
            if let Some(registration) = removed {
                tracing::debug!(effect_id = %id, "Cancelling effect");
                registration.abort.abort();
                counter!(EFFECTS_CANCELLED).increment(1);
            } else {
                tracing::trace!(effect_id = %id, "Cancel for effect that is not running");
            }
        }

        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
        fn unregister(&self, id: &EffectId, generation: u64) {
            let mut registry = self.shared.cancellables.lock().unwrap();
            if registry.get(id).is_some_and(|r| r.generation == generation) {
                registry.remove(id);
            }
        }

        /// Feed an action produced by an effect back into the store
        async fn feed_back(&self, action: A) {
            if let Err(error) = self.send(action).await {
                tracing::debug!(%error, "Dropped action produced by effect");
            }
        }

        /// Build the future that executes an effect to completion
        fn run_effect(&self, effect: Effect<A>) -> EffectFuture {
            let store = self.clone();

            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        tracing::trace!("Executing Effect::Future");
                        counter!(EFFECTS_EXECUTED, "type" => "future").increment(1);
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.feed_back(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                        counter!(EFFECTS_EXECUTED, "type" => "delay").increment(1);
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    },
                    Effect::Parallel(effects) => {
                        tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                        counter!(EFFECTS_EXECUTED, "type" => "parallel").increment(1);
                        let mut set = JoinSet::new();
                        for effect in effects {
                            set.spawn(store.run_effect(effect));
                        }
                        while let Some(result) = set.join_next().await {
                            if let Err(error) = result {
                                if !error.is_cancelled() {
                                    tracing::error!(%error, "Parallel effect task failed");
                                }
                            }
                        }
                    },
                    Effect::Sequential(effects) => {
                        tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                        counter!(EFFECTS_EXECUTED, "type" => "sequential").increment(1);
                        for effect in effects {
                            store.run_effect(effect).await;
                        }
                    },
                    Effect::Cancellable { id, effect } => {
                        let join = store.spawn_cancellable(id, *effect, None);
                        if let Err(error) = join.await {
                            if !error.is_cancelled() {
                                tracing::error!(%error, "Cancellable effect task failed");
                            }
                        }
                    },
                    Effect::Cancel(id) => store.cancel(&id),
                }
            })
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use cartwheel_core::{smallvec, SmallVec};
    use tokio::sync::broadcast::error::TryRecvError;

    #[derive(Debug, Clone)]
    struct TestState {
        value: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        NoOp,
        ProduceEffect,
        ProduceDelayedAction,
        ProduceParallelEffects,
        ProduceSequentialEffects,
        ScheduleTimer,
        CancelTimer,
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    fn timer_id() -> EffectId {
        EffectId::new("timer")
    }

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.value -= 1;
                    smallvec![Effect::None]
                },
                TestAction::NoOp => smallvec![Effect::None],
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async { Some(TestAction::Increment) }))]
                },
                TestAction::ProduceDelayedAction => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(TestAction::Increment),
                }],
                TestAction::ProduceParallelEffects => smallvec![Effect::Parallel(vec![
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                ])],
                TestAction::ProduceSequentialEffects => smallvec![Effect::Sequential(vec![
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Decrement) })),
                ])],
                TestAction::ScheduleTimer => smallvec![
                    Effect::Cancel(timer_id()),
                    Effect::Delay {
                        duration: Duration::from_secs(3),
                        action: Box::new(TestAction::Increment),
                    }
                    .cancellable(timer_id()),
                ],
                TestAction::CancelTimer => smallvec![Effect::Cancel(timer_id())],
            }
        }
    }

    fn store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState { value: 0 }, TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_store_creation() {
        let store = store();
        let value = store.state(|s| s.value).await;
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn test_send_action() {
        let store = store();
        let _ = store.send(TestAction::Increment).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_multiple_actions() {
        let store = store();

        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Decrement).await;

        assert_eq!(store.snapshot().await.value, 1);
    }

    #[tokio::test]
    async fn test_effect_none() {
        let store = store();
        let handle = store.send(TestAction::NoOp).await;
        assert!(matches!(handle, Ok(ref h) if h.pending() == 0));
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test]
    async fn test_future_effect_feeds_back() {
        let store = store();
        let result = store
            .send_and_settle(TestAction::ProduceEffect, Duration::from_secs(1))
            .await;
        assert_eq!(result, Ok(()));
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_effect() {
        let store = store();
        let result = store
            .send_and_settle(TestAction::ProduceDelayedAction, Duration::from_secs(1))
            .await;
        assert_eq!(result, Ok(()));
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_parallel_effects() {
        let store = store();
        let result = store
            .send_and_settle(TestAction::ProduceParallelEffects, Duration::from_secs(1))
            .await;
        assert_eq!(result, Ok(()));
        assert_eq!(store.state(|s| s.value).await, 3);
    }

    #[tokio::test]
    async fn test_sequential_effects() {
        let store = store();
        let result = store
            .send_and_settle(TestAction::ProduceSequentialEffects, Duration::from_secs(1))
            .await;
        assert_eq!(result, Ok(()));
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_timer() {
        let store = store();

        let mut first = store.send(TestAction::ScheduleTimer).await.ok();
        tokio::time::sleep(Duration::from_secs(2)).await;
        let mut second = store.send(TestAction::ScheduleTimer).await.ok();
        assert!(store.is_running(&timer_id()));

        // The first timer was aborted, so its handle settles without firing
        if let Some(handle) = first.as_mut() {
            handle.wait().await;
        }
        assert_eq!(store.state(|s| s.value).await, 0);

        if let Some(handle) = second.as_mut() {
            handle.wait().await;
        }
        assert_eq!(store.state(|s| s.value).await, 1);
        assert!(!store.is_running(&timer_id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_timer() {
        let store = store();

        let mut handle = store.send(TestAction::ScheduleTimer).await.ok();
        let _ = store.send(TestAction::CancelTimer).await;
        assert!(!store.is_running(&timer_id()));

        if let Some(handle) = handle.as_mut() {
            handle.wait().await;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test]
    async fn test_subscribers_observe_every_action() {
        let store = store();
        let mut rx = store.subscribe_actions();

        let _ = store
            .send_and_settle(TestAction::ProduceEffect, Duration::from_secs(1))
            .await;

        assert_eq!(rx.try_recv(), Ok(TestAction::ProduceEffect));
        assert_eq!(rx.try_recv(), Ok(TestAction::Increment));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = store();
        let other = store.clone();

        let _ = other.send(TestAction::Increment).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_sends_serialize() {
        let store = store();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let _ = store.send(TestAction::Increment).await;
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.is_ok());
        }

        assert_eq!(store.state(|s| s.value).await, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_rejects_and_aborts_timers() {
        let store = store();
        let _ = store.send(TestAction::ScheduleTimer).await;

        let result = store.shutdown(Duration::from_secs(1)).await;
        assert_eq!(result, Ok(()));
        assert!(!store.is_running(&timer_id()));

        let rejected = store.send(TestAction::Increment).await;
        assert!(matches!(rejected, Err(StoreError::ShutdownInProgress)));
        assert_eq!(store.state(|s| s.value).await, 0);
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        assert_eq!(
            handle.wait_with_timeout(Duration::from_millis(10)).await,
            Ok(())
        );
    }
}
