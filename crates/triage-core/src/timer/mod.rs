//! Focus timer state machine.
//!
//! Tasks carry their own timer: `time_spent` holds the folded seconds and
//! `last_started_at` marks the open stretch while the task is active. The
//! functions here are pure transitions over in-memory records and take a
//! single `now` snapshot from the caller; enforcing one active task per
//! user across storage is the job of [`crate::service::TaskService`].
//!
//! ## Transitions
//!
//! ```text
//! start     pending | paused | active ──> active      (preempts the user's other active task)
//! pause     active ──> paused                        (no-op otherwise)
//! complete  pending | active | paused ──> completed  (no-op once completed)
//! ```

mod accrual;
mod machine;

pub use accrual::{accrue, elapsed_seconds};
pub use machine::{complete, pause, start};
