//! Task scoring and timer engine.
//!
//! Scores tasks with a Temporal Motivation Theory utility, keeps at most one
//! running timer per user, turns focused time into XP and levels, and
//! suggests an easier task when the current one stalls.

pub mod collaborators;
pub mod error;
pub mod events;
pub mod progress;
pub mod recommend;
pub mod scoring;
pub mod service;
pub mod storage;
pub mod task;
pub mod timer;
pub mod user;

pub use error::{CoreError, Result};
pub use events::Event;
pub use progress::{award_completion, level_for_xp, xp_for_completion, LevelProgress};
pub use recommend::{recommend_switch, SwitchSuggestion};
pub use scoring::{compose_priority, resolve_difficulty, tmt_utility, Sliders};
pub use service::{
    CompleteOutcome, PauseOutcome, Prediction, ServiceSettings, StartOutcome, SubtaskView, TaskService, TaskView,
    ToggleOutcome, UserLocks,
};
pub use storage::{Config, Database};
pub use task::{Subtask, SubtaskOrigin, SubtaskStatus, Task, TaskAnalysis, TaskStatus};
pub use user::User;
