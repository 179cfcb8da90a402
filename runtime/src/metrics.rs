//! Metric names and descriptions for the Store runtime.
//!
//! The runtime records through the `metrics` facade; nothing is exported
//! unless the host application installs a recorder. Descriptions are
//! registered once per process, the first time a store is created.

use metrics::{describe_counter, describe_histogram};
use std::sync::Once;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Total actions accepted by `Store::send`
pub const ACTIONS_TOTAL: &str = "store.actions.total";
/// Actions rejected because the store is shutting down
pub const ACTIONS_REJECTED: &str = "store.actions.rejected";
/// Reducer execution time
pub const REDUCER_DURATION: &str = "store.reducer.duration_seconds";
/// Effects returned per action
pub const EFFECTS_COUNT: &str = "store.effects.count";
/// Effects executed, labelled by `type`
pub const EFFECTS_EXECUTED: &str = "store.effects.executed";
/// Cancellable effects aborted before completion
pub const EFFECTS_CANCELLED: &str = "store.effects.cancelled";

static REGISTER: Once = Once::new();

/// Register metric descriptions (idempotent)
pub fn register_metrics() {
    REGISTER.call_once(|| {
        describe_counter!(ACTIONS_TOTAL, "Total number of actions dispatched to stores");
        describe_counter!(
            ACTIONS_REJECTED,
            "Actions rejected because the store was shutting down"
        );
        describe_histogram!(REDUCER_DURATION, "Time taken to execute reducers");
        describe_histogram!(EFFECTS_COUNT, "Number of effects returned per action");
        describe_counter!(EFFECTS_EXECUTED, "Total number of effects executed");
        describe_counter!(
            EFFECTS_CANCELLED,
            "Cancellable effects aborted before they completed"
        );
    });
}
