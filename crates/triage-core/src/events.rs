use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{SubtaskStatus, TaskStatus};

/// Something that happened to a task or user.
///
/// Returned alongside operation outcomes so callers can log or forward them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TaskStarted {
        task_id: i64,
        /// Status the task had before starting
        from: TaskStatus,
        at: DateTime<Utc>,
    },
    TaskPaused {
        task_id: i64,
        /// Seconds added by this pause
        accrued_secs: u64,
        time_spent: u64,
        /// True when the pause was forced by starting another task
        preempted: bool,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: i64,
        accrued_secs: u64,
        time_spent: u64,
        at: DateTime<Utc>,
    },
    XpAwarded {
        task_id: i64,
        user_id: i64,
        xp_gained: u64,
        total_xp: u64,
        at: DateTime<Utc>,
    },
    LevelUp {
        user_id: i64,
        old_level: u32,
        new_level: u32,
        at: DateTime<Utc>,
    },
    SubtaskToggled {
        subtask_id: i64,
        task_id: i64,
        status: SubtaskStatus,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TaskStarted { at, .. }
            | Event::TaskPaused { at, .. }
            | Event::TaskCompleted { at, .. }
            | Event::XpAwarded { at, .. }
            | Event::LevelUp { at, .. }
            | Event::SubtaskToggled { at, .. } => *at,
        }
    }
}
