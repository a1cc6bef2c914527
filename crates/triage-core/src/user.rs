use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task owner and their accumulated progress.
///
/// `total_xp` and `level` only ever grow, and only on task completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub total_xp: u64,
    /// Always `>= 1`.
    pub level: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        User {
            id: 0,
            username: username.into(),
            total_xp: 0,
            level: 1,
            created_at: now,
        }
    }
}
