//! Experience and levels.
//!
//! Each completed task grants XP for the focused minutes it accumulated,
//! scaled by its priority, plus a flat bonus for finishing:
//!
//! ```text
//! xp_gained = floor((time_spent / 60) · 10 · (1 + priority / 100)) + 50
//! level     = floor(1 + total_xp / 1000)
//! ```

use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::user::User;

/// Flat XP for finishing any task.
pub const COMPLETION_BONUS_XP: u64 = 50;
/// XP per focused minute before the priority multiplier.
pub const XP_PER_FOCUS_MINUTE: f64 = 10.0;
/// XP needed per level.
pub const XP_PER_LEVEL: u64 = 1000;

/// Result of crediting one completion to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub xp_gained: u64,
    pub total_xp: u64,
    pub old_level: u32,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// XP earned by a task with `time_spent` seconds and the given priority.
///
/// Never less than [`COMPLETION_BONUS_XP`]; the priority is not clamped, but a
/// product that comes out negative or non-finite counts as zero.
pub fn xp_for_completion(time_spent: u64, priority_score: f64) -> u64 {
    let minutes_focused = time_spent as f64 / 60.0;
    let base_xp = minutes_focused * XP_PER_FOCUS_MINUTE;
    let multiplier = 1.0 + priority_score / 100.0;
    let scaled = base_xp * multiplier;
    let scaled = if scaled.is_finite() && scaled > 0.0 {
        scaled.floor() as u64
    } else {
        0
    };
    scaled.saturating_add(COMPLETION_BONUS_XP)
}

/// Level reached with `total_xp`.
pub fn level_for_xp(total_xp: u64) -> u32 {
    u32::try_from(1 + total_xp / XP_PER_LEVEL).unwrap_or(u32::MAX)
}

/// Credit a just-completed task to its owner.
///
/// Stores the grant on the task as `xp_earned` and updates the user's
/// total and level. The caller guarantees this runs once per completion.
pub fn award_completion(user: &mut User, task: &mut Task) -> LevelProgress {
    let xp_gained = xp_for_completion(task.time_spent, task.priority_score);
    let old_level = user.level.max(1);

    user.total_xp = user.total_xp.saturating_add(xp_gained);
    let new_level = level_for_xp(user.total_xp);
    user.level = new_level.max(old_level);
    task.xp_earned = Some(xp_gained);

    let progress = LevelProgress {
        xp_gained,
        total_xp: user.total_xp,
        old_level,
        new_level,
        leveled_up: new_level > old_level,
    };
    if progress.leveled_up {
        tracing::info!(user_id = user.id, new_level, "level up");
    }
    progress
}
