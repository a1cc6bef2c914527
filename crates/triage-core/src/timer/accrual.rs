use chrono::{DateTime, Utc};

use crate::task::Task;

/// Whole seconds from `since` to `now`, truncated toward zero.
///
/// A negative span (clock skew between writer and reader) counts as zero.
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let secs = (now - since).num_seconds();
    if secs < 0 {
        tracing::warn!(%since, %now, "start stamp is in the future, accruing 0s");
        0
    } else {
        secs as u64
    }
}

/// Stop accrual: fold the running stretch of an active task into
/// `time_spent` and clear its start stamp.
///
/// Returns the seconds added. Tasks that are not active are untouched.
/// The status is left for the caller to set.
pub fn accrue(task: &mut Task, now: DateTime<Utc>) -> u64 {
    if !task.is_active() {
        return 0;
    }
    let Some(started) = task.last_started_at.take() else {
        return 0;
    };
    let secs = elapsed_seconds(started, now);
    task.time_spent = task.time_spent.saturating_add(secs);
    secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use chrono::Duration;

    fn active_task(started: DateTime<Utc>) -> Task {
        let mut task = Task::new(1, "Focus", 10.0, started);
        task.status = TaskStatus::Active;
        task.last_started_at = Some(started);
        task
    }

    #[test]
    fn truncates_partial_seconds() {
        let t0 = Utc::now();
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(2999)), 2);
    }

    #[test]
    fn negative_span_is_zero() {
        let t0 = Utc::now();
        assert_eq!(elapsed_seconds(t0, t0 - Duration::seconds(30)), 0);
    }

    #[test]
    fn accrue_adds_and_clears_stamp() {
        let t0 = Utc::now();
        let mut task = active_task(t0);
        task.time_spent = 100;

        assert_eq!(accrue(&mut task, t0 + Duration::seconds(45)), 45);
        assert_eq!(task.time_spent, 145);
        assert!(task.last_started_at.is_none());
    }

    #[test]
    fn accrue_ignores_inactive_tasks() {
        let t0 = Utc::now();
        let mut task = active_task(t0);
        task.status = TaskStatus::Paused;

        assert_eq!(accrue(&mut task, t0 + Duration::seconds(45)), 0);
        assert_eq!(task.time_spent, 0);
    }

    #[test]
    fn skewed_clock_never_decreases_time() {
        let t0 = Utc::now();
        let mut task = active_task(t0);
        task.time_spent = 10;

        accrue(&mut task, t0 - Duration::minutes(5));
        assert_eq!(task.time_spent, 10);
    }
}
