//! Task records.
//!
//! A [`Task`] carries the focus-timer fields; its one-to-one [`TaskAnalysis`]
//! holds the readings it was scored from; [`Subtask`]s are the generated
//! breakdown steps.

mod subtask;

pub use subtask::{Subtask, SubtaskOrigin, SubtaskStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task lifecycle status.
///
/// ```text
///   pending ──start──> active ──pause──> paused
///                        ^                 │
///                        └─────start───────┘
///
///   pending | active | paused ──complete──> completed (terminal)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, never started
    #[default]
    Pending,
    /// Timer running
    Active,
    /// Timer stopped, can be resumed
    Paused,
    /// Finished (terminal)
    Completed,
}

impl TaskStatus {
    /// Check if a transition is valid.
    ///
    /// `Active → Active` is the re-start that only re-stamps the timer. The
    /// timer state machine refuses every transition this table rejects.
    pub fn can_transition_to(&self, to: &TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => matches!(to, TaskStatus::Active | TaskStatus::Completed),
            TaskStatus::Active => matches!(
                to,
                TaskStatus::Active | TaskStatus::Paused | TaskStatus::Completed
            ),
            TaskStatus::Paused => matches!(to, TaskStatus::Active | TaskStatus::Completed),
            TaskStatus::Completed => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Statuses a task may have and still be suggested as a switch target.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Paused => "paused",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "active" => Ok(TaskStatus::Active),
            "paused" => Ok(TaskStatus::Paused),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// A unit of work owned by one user.
///
/// Invariant: `last_started_at.is_some()` exactly when `status == Active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub status: TaskStatus,
    /// Computed once at creation by `compose_priority`.
    pub priority_score: f64,
    /// Accumulated focused seconds. Never decreases.
    pub time_spent: u64,
    /// When the current focus stretch began (set only while active).
    pub last_started_at: Option<DateTime<Utc>>,
    /// XP granted on completion.
    pub xp_earned: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// New pending task; `id` is assigned by storage.
    pub fn new(user_id: i64, title: impl Into<String>, priority_score: f64, now: DateTime<Utc>) -> Self {
        Task {
            id: 0,
            user_id,
            title: title.into(),
            status: TaskStatus::Pending,
            priority_score,
            time_spent: 0,
            last_started_at: None,
            xp_earned: None,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    /// Whether the active/start-stamp invariant holds.
    pub fn timer_consistent(&self) -> bool {
        self.is_active() == self.last_started_at.is_some()
    }
}

/// Readings a task was scored from. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub task_id: i64,
    pub urgency_score: f64,
    pub fear_score: f64,
    pub interest_score: f64,
    /// 1–10 (0 only when the fear slider itself was 0)
    pub difficulty_score: u8,
    pub confidence: f64,
    pub model_version: String,
}
