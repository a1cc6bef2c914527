use chrono::{DateTime, Utc};

use super::accrual::accrue;
use crate::events::Event;
use crate::task::{Task, TaskStatus};

/// Start (or resume) `task`, first pausing `active` if it is the same user's
/// other running task.
///
/// Starting an already-active task only re-stamps `last_started_at`; the
/// open stretch is not folded in. Starting a completed task does nothing.
pub fn start(task: &mut Task, active: Option<&mut Task>, now: DateTime<Utc>) -> Vec<Event> {
    let mut events = Vec::new();
    if !task.status.can_transition_to(&TaskStatus::Active) {
        tracing::debug!(task_id = task.id, status = %task.status, "start ignored");
        return events;
    }

    if let Some(other) = active.filter(|other| {
        other.id != task.id && other.status.can_transition_to(&TaskStatus::Paused)
    }) {
        let accrued_secs = accrue(other, now);
        other.status = TaskStatus::Paused;
        tracing::debug!(task_id = other.id, accrued_secs, "preempted by task {}", task.id);
        events.push(Event::TaskPaused {
            task_id: other.id,
            accrued_secs,
            time_spent: other.time_spent,
            preempted: true,
            at: now,
        });
    }

    let from = task.status;
    task.status = TaskStatus::Active;
    task.last_started_at = Some(now);
    events.push(Event::TaskStarted {
        task_id: task.id,
        from,
        at: now,
    });
    events
}

/// Pause an active task, folding its open stretch into `time_spent`.
///
/// Any other status is left as it is and `None` is returned.
pub fn pause(task: &mut Task, now: DateTime<Utc>) -> Option<Event> {
    if !task.status.can_transition_to(&TaskStatus::Paused) {
        return None;
    }
    let accrued_secs = accrue(task, now);
    task.status = TaskStatus::Paused;
    Some(Event::TaskPaused {
        task_id: task.id,
        accrued_secs,
        time_spent: task.time_spent,
        preempted: false,
        at: now,
    })
}

/// Complete a task, folding in the open stretch if it was active.
///
/// Returns `None` when the task was already completed; nothing is re-accrued.
pub fn complete(task: &mut Task, now: DateTime<Utc>) -> Option<Event> {
    if !task.status.can_transition_to(&TaskStatus::Completed) {
        return None;
    }
    let accrued_secs = accrue(task, now);
    task.status = TaskStatus::Completed;
    task.completed_at = Some(now);
    task.last_started_at = None;
    Some(Event::TaskCompleted {
        task_id: task.id,
        accrued_secs,
        time_spent: task.time_spent,
        at: now,
    })
}
