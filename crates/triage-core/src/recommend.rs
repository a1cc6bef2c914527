//! Switch recommender.
//!
//! When the user wants to bail out of the current task, suggest an easier
//! open task they are likely to enjoy: the highest-interest candidate whose
//! difficulty is at most the configured ceiling.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskAnalysis};

/// Highest difficulty a switch target may have.
pub const DEFAULT_MAX_SWITCH_DIFFICULTY: u8 = 6;

const NOTHING_SUITABLE: &str = "No suitable tasks found. Time for a break?";

/// Outcome of a switch query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchSuggestion {
    pub found: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
}

impl SwitchSuggestion {
    pub fn none() -> Self {
        SwitchSuggestion {
            found: false,
            message: NOTHING_SUITABLE.to_string(),
            task_id: None,
            title: None,
            difficulty: None,
        }
    }

    fn suggest(task: &Task, analysis: &TaskAnalysis) -> Self {
        SwitchSuggestion {
            found: true,
            message: format!(
                "How about '{}'? It's fairly easy (Diff: {}) and might help you reset.",
                task.title, analysis.difficulty_score
            ),
            task_id: Some(task.id),
            title: Some(task.title.clone()),
            difficulty: Some(analysis.difficulty_score),
        }
    }
}

/// Pick a switch target from `pool`.
///
/// Candidates must be open, must not be `current_task_id`, and must have a
/// difficulty of at most `max_difficulty`. Among those the highest interest
/// wins; on a tie the earliest candidate in `pool` is kept.
pub fn recommend_switch(
    current_task_id: i64,
    pool: &[(Task, TaskAnalysis)],
    max_difficulty: u8,
) -> SwitchSuggestion {
    let mut best: Option<&(Task, TaskAnalysis)> = None;
    for candidate in pool {
        let (task, analysis) = candidate;
        if task.id == current_task_id
            || !task.status.is_open()
            || analysis.difficulty_score > max_difficulty
        {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, top)) => analysis.interest_score > top.interest_score,
        };
        if better {
            best = Some(candidate);
        }
    }

    match best {
        Some((task, analysis)) => SwitchSuggestion::suggest(task, analysis),
        None => SwitchSuggestion::none(),
    }
}
