use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskStatus {
    #[default]
    Pending,
    Completed,
}

impl SubtaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtaskStatus::Pending => "pending",
            SubtaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for SubtaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubtaskStatus::Pending),
            "completed" => Ok(SubtaskStatus::Completed),
            other => Err(format!("unknown subtask status: {other}")),
        }
    }
}

/// Who produced a subtask.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskOrigin {
    /// The external breakdown generator
    #[default]
    Generator,
    /// Added by hand
    User,
}

impl SubtaskOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtaskOrigin::Generator => "generator",
            SubtaskOrigin::User => "user",
        }
    }
}

impl FromStr for SubtaskOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generator" => Ok(SubtaskOrigin::Generator),
            "user" => Ok(SubtaskOrigin::User),
            other => Err(format!("unknown subtask origin: {other}")),
        }
    }
}

/// One step of a task's breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    /// 0-based position in the breakdown list
    pub order_index: u32,
    pub status: SubtaskStatus,
    pub created_by: SubtaskOrigin,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Subtask {
    pub fn generated(task_id: i64, order_index: u32, title: impl Into<String>) -> Self {
        Subtask {
            id: 0,
            task_id,
            title: title.into(),
            order_index,
            status: SubtaskStatus::Pending,
            created_by: SubtaskOrigin::Generator,
            completed_at: None,
        }
    }

    /// Flip between pending and completed, stamping or clearing `completed_at`.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> SubtaskStatus {
        match self.status {
            SubtaskStatus::Completed => {
                self.status = SubtaskStatus::Pending;
                self.completed_at = None;
            }
            SubtaskStatus::Pending => {
                self.status = SubtaskStatus::Completed;
                self.completed_at = Some(now);
            }
        }
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_stamps_and_clears() {
        let now = Utc::now();
        let mut sub = Subtask::generated(1, 0, "Outline sections");

        assert_eq!(sub.toggle(now), SubtaskStatus::Completed);
        assert_eq!(sub.completed_at, Some(now));

        assert_eq!(sub.toggle(now), SubtaskStatus::Pending);
        assert_eq!(sub.completed_at, None);
    }

    #[test]
    fn origin_parses() {
        assert_eq!("generator".parse::<SubtaskOrigin>().unwrap(), SubtaskOrigin::Generator);
        assert!("gemini".parse::<SubtaskOrigin>().is_err());
    }
}
