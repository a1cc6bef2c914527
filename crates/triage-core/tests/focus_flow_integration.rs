//! Integration tests for the focus timer, XP and switch suggestions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use triage_core::collaborators::{FixedEstimator, NoBreakdown, StaticBreakdown};
use triage_core::storage::records;
use triage_core::{CoreError, Database, Event, Sliders, SubtaskStatus, TaskService, TaskStatus};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn service() -> TaskService {
    TaskService::new(
        Database::open_memory().unwrap(),
        Box::new(NoBreakdown),
        Box::new(FixedEstimator::default()),
    )
}

fn neutral() -> Sliders {
    Sliders::new(5.0, 5.0, 5.0)
}

#[tokio::test]
async fn test_start_preempts_active_task() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let a = svc.create_task(user.id, "Write report", neutral(), t0()).await.unwrap();
    let b = svc.create_task(user.id, "Reply to email", neutral(), t0()).await.unwrap();

    let started = svc.start(a.id, user.id, t0()).unwrap();
    assert_eq!(started.status, TaskStatus::Active);
    assert_eq!(started.paused_task_id, None);

    // Switching after 5 minutes pauses A with exactly 300s banked
    let switched = svc.start(b.id, user.id, t0() + Duration::seconds(300)).unwrap();
    assert_eq!(switched.paused_task_id, Some(a.id));
    assert!(matches!(
        switched.events.first(),
        Some(Event::TaskPaused { preempted: true, accrued_secs: 300, .. })
    ));

    let a_now = svc.get_task(a.id).unwrap();
    assert_eq!(a_now.status, TaskStatus::Paused);
    assert_eq!(a_now.time_spent, 300);
    assert_eq!(a_now.last_started_at, None);

    let b_now = svc.get_task(b.id).unwrap();
    assert_eq!(b_now.status, TaskStatus::Active);
    assert_eq!(b_now.last_started_at, Some(t0() + Duration::seconds(300)));
}

#[tokio::test]
async fn test_at_most_one_active_task_per_user() {
    let svc = service();
    let ada = svc.register_user("ada", t0()).unwrap();
    let bob = svc.register_user("bob", t0()).unwrap();
    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        ids.push(svc.create_task(ada.id, title, neutral(), t0()).await.unwrap().id);
    }
    let bobs = svc.create_task(bob.id, "bob's", neutral(), t0()).await.unwrap();

    for (i, id) in ids.iter().enumerate() {
        svc.start(*id, ada.id, t0() + Duration::seconds(i as i64 * 10)).unwrap();
    }
    svc.start(bobs.id, bob.id, t0()).unwrap();

    let active: Vec<_> = svc
        .list_tasks(ada.id)
        .unwrap()
        .into_iter()
        .filter(|t| t.status == TaskStatus::Active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, ids[2]);

    // Another user's timer is untouched
    assert_eq!(svc.get_task(bobs.id).unwrap().status, TaskStatus::Active);
}

#[tokio::test]
async fn test_concurrent_starts_keep_one_active_task() {
    let svc = Arc::new(service());
    let user = svc.register_user("ada", t0()).unwrap();
    let mut ids = Vec::new();
    for i in 0..4 {
        let view = svc.create_task(user.id, &format!("task {i}"), neutral(), t0()).await.unwrap();
        ids.push(view.id);
    }
    let clock = Arc::new(AtomicI64::new(1));

    let workers: Vec<_> = (0..8usize)
        .map(|worker| {
            let svc = Arc::clone(&svc);
            let clock = Arc::clone(&clock);
            let ids = ids.clone();
            let user_id = user.id;
            thread::spawn(move || {
                let mut seen: HashMap<i64, u64> = HashMap::new();
                for round in 0..25usize {
                    let id = ids[(worker + round) % ids.len()];
                    let now = t0() + Duration::seconds(clock.fetch_add(7, Ordering::SeqCst));
                    svc.start(id, user_id, now).unwrap();

                    let tasks = svc.list_tasks(user_id).unwrap();
                    let active = tasks.iter().filter(|t| t.status == TaskStatus::Active).count();
                    assert_eq!(active, 1, "worker {worker} round {round}");
                    for t in &tasks {
                        let before = seen.insert(t.id, t.accumulated).unwrap_or(0);
                        assert!(t.accumulated >= before, "time_spent of task {} went back", t.id);
                    }
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let tasks = svc.list_tasks(user.id).unwrap();
    assert_eq!(tasks.iter().filter(|t| t.status == TaskStatus::Active).count(), 1);
    for t in &tasks {
        let stored = svc.get_task(t.id).unwrap();
        assert!(stored.timer_consistent(), "task {} timer fields disagree", t.id);
    }
}

#[tokio::test]
async fn test_pause_is_idempotent() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let task = svc.create_task(user.id, "Read paper", neutral(), t0()).await.unwrap();

    svc.start(task.id, user.id, t0()).unwrap();
    let first = svc.pause(task.id, t0() + Duration::seconds(90)).unwrap();
    assert_eq!(first.status, TaskStatus::Paused);
    assert_eq!(first.time_spent, 90);
    assert_eq!(first.events.len(), 1);

    let second = svc.pause(task.id, t0() + Duration::seconds(500)).unwrap();
    assert_eq!(second.time_spent, 90);
    assert!(second.events.is_empty());
}

#[tokio::test]
async fn test_pause_pending_task_leaves_it_pending() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let task = svc.create_task(user.id, "Later", neutral(), t0()).await.unwrap();

    let out = svc.pause(task.id, t0()).unwrap();
    assert_eq!(out.status, TaskStatus::Pending);
    assert_eq!(out.time_spent, 0);
}

#[tokio::test]
async fn test_time_accumulates_across_sessions() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let task = svc.create_task(user.id, "Study", neutral(), t0()).await.unwrap();

    svc.start(task.id, user.id, t0()).unwrap();
    svc.pause(task.id, t0() + Duration::seconds(120)).unwrap();
    svc.start(task.id, user.id, t0() + Duration::seconds(1000)).unwrap();
    let done = svc.complete(task.id, t0() + Duration::seconds(1060)).unwrap();

    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.time_spent, 180);
}

#[tokio::test]
async fn test_complete_awards_xp_once() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    // priority 26.124
    let task = svc
        .create_task(user.id, "Tax return", Sliders::new(8.0, 6.0, 7.0), t0())
        .await
        .unwrap();

    svc.start(task.id, user.id, t0()).unwrap();
    let done = svc.complete(task.id, t0() + Duration::seconds(600)).unwrap();

    // floor(10 · 10 · 1.26124) + 50
    assert_eq!(done.xp_gained, 176);
    assert_eq!(done.total_xp, 176);
    assert!(!done.leveled_up);
    assert_eq!(done.new_level, 1);
    assert!(done
        .events
        .iter()
        .any(|e| matches!(e, Event::XpAwarded { xp_gained: 176, .. })));

    let stored = svc.get_task(task.id).unwrap();
    assert_eq!(stored.xp_earned, Some(176));
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.last_started_at, None);

    let again = svc.complete(task.id, t0() + Duration::seconds(900)).unwrap();
    assert_eq!(again.xp_gained, 0);
    assert_eq!(again.total_xp, 176);
    assert_eq!(again.time_spent, 600);
    assert_eq!(svc.get_user(user.id).unwrap().total_xp, 176);
}

#[tokio::test]
async fn test_complete_never_started_grants_bonus_only() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let task = svc.create_task(user.id, "Quick one", neutral(), t0()).await.unwrap();

    let done = svc.complete(task.id, t0()).unwrap();
    assert_eq!(done.xp_gained, 50);
    assert_eq!(done.time_spent, 0);
}

#[tokio::test]
async fn test_completed_task_cannot_restart() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let done = svc.create_task(user.id, "Done", neutral(), t0()).await.unwrap();
    let open = svc.create_task(user.id, "Open", neutral(), t0()).await.unwrap();
    svc.complete(done.id, t0()).unwrap();

    svc.start(open.id, user.id, t0()).unwrap();
    let out = svc.start(done.id, user.id, t0() + Duration::seconds(60)).unwrap();

    assert_eq!(out.status, TaskStatus::Completed);
    assert_eq!(out.paused_task_id, None);
    assert_eq!(svc.get_task(open.id).unwrap().status, TaskStatus::Active);
}

#[tokio::test]
async fn test_level_up_after_long_focus() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let task = svc
        .create_task(user.id, "Thesis chapter", Sliders::new(8.0, 6.0, 7.0), t0())
        .await
        .unwrap();

    svc.start(task.id, user.id, t0()).unwrap();
    let done = svc.complete(task.id, t0() + Duration::hours(2)).unwrap();

    // floor(120 · 10 · 1.26124) + 50
    assert_eq!(done.xp_gained, 1563);
    assert!(done.leveled_up);
    assert_eq!(done.new_level, 2);
    assert!(done
        .events
        .iter()
        .any(|e| matches!(e, Event::LevelUp { old_level: 1, new_level: 2, .. })));

    let stored = svc.get_user(user.id).unwrap();
    assert_eq!(stored.level, 2);
    assert_eq!(stored.total_xp, 1563);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();

    assert!(svc.start(999, user.id, t0()).unwrap_err().is_not_found());
    assert!(svc.pause(999, t0()).unwrap_err().is_not_found());
    assert!(svc.complete(999, t0()).unwrap_err().is_not_found());
    assert!(svc.toggle_subtask(999, t0()).unwrap_err().is_not_found());
    assert!(svc.get_user(999).unwrap_err().is_not_found());
    assert!(svc
        .create_task(999, "orphan", neutral(), t0())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_start_other_users_task_is_not_found() {
    let svc = service();
    let ada = svc.register_user("ada", t0()).unwrap();
    let bob = svc.register_user("bob", t0()).unwrap();
    let task = svc.create_task(ada.id, "Ada's", neutral(), t0()).await.unwrap();

    let err = svc.start(task.id, bob.id, t0()).unwrap_err();
    assert!(matches!(err, CoreError::NotFound { entity: "task", .. }));
    assert_eq!(svc.get_task(task.id).unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_create_task_with_breakdown() {
    let svc = TaskService::new(
        Database::open_memory().unwrap(),
        Box::new(StaticBreakdown::new(
            vec!["Outline sections".into(), "  ".into(), "Draft intro".into()],
            7,
        )),
        Box::new(FixedEstimator::default()),
    );
    let user = svc.register_user("ada", t0()).unwrap();
    let view = svc
        .create_task(user.id, "  Write report  ", Sliders::new(8.0, 6.0, 7.0), t0())
        .await
        .unwrap();

    assert_eq!(view.title, "Write report");
    assert_eq!(view.status, TaskStatus::Pending);
    assert_eq!(view.difficulty, 7);
    assert!((view.priority - 26.124).abs() < 1e-9);
    let titles: Vec<_> = view.subtasks.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Outline sections", "Draft intro"]);

    // Toggling flips the status both ways
    let sub = view.subtasks[0].id;
    assert_eq!(svc.toggle_subtask(sub, t0()).unwrap().status, SubtaskStatus::Completed);
    assert_eq!(svc.toggle_subtask(sub, t0()).unwrap().status, SubtaskStatus::Pending);
}

#[tokio::test]
async fn test_create_task_without_breakdown_uses_fear() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let view = svc
        .create_task(user.id, "Call landlord", Sliders::new(3.0, 7.6, 2.0), t0())
        .await
        .unwrap();

    assert!(view.subtasks.is_empty());
    assert_eq!(view.difficulty, 8);
}

#[tokio::test]
async fn test_create_task_with_non_finite_sliders_reads_neutral() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let view = svc
        .create_task(user.id, "Mystery chore", Sliders::new(f64::NAN, 5.0, 5.0), t0())
        .await
        .unwrap();

    assert_eq!(view.priority, svc.calculate_score(Sliders::neutral()));
    assert_eq!(view.difficulty, 5);

    let inf = svc
        .create_task(user.id, "Endless", Sliders::new(3.0, f64::INFINITY, 2.0), t0())
        .await
        .unwrap();
    assert!(inf.priority.is_finite());
    assert_eq!(inf.difficulty, 5);
}

#[tokio::test]
async fn test_create_task_rejects_blank_title() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let err = svc.create_task(user.id, "   ", neutral(), t0()).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_recommend_switch_picks_easy_interesting_task() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    // NoBreakdown: difficulty comes from fear
    let stuck = svc
        .create_task(user.id, "Hard proof", Sliders::new(8.0, 9.0, 3.0), t0())
        .await
        .unwrap();
    svc.create_task(user.id, "Scary but fun", Sliders::new(5.0, 8.0, 10.0), t0())
        .await
        .unwrap();
    let easy = svc
        .create_task(user.id, "Tidy desk", Sliders::new(2.0, 2.0, 6.0), t0())
        .await
        .unwrap();
    svc.create_task(user.id, "Dull form", Sliders::new(2.0, 1.0, 4.0), t0())
        .await
        .unwrap();

    let pick = svc.recommend_switch(stuck.id, user.id).unwrap();
    assert!(pick.found);
    assert_eq!(pick.task_id, Some(easy.id));
    assert_eq!(pick.difficulty, Some(2));
    assert_eq!(
        pick.message,
        "How about 'Tidy desk'? It's fairly easy (Diff: 2) and might help you reset."
    );

    // Completed tasks drop out of the pool
    svc.complete(easy.id, t0()).unwrap();
    let next = svc.recommend_switch(stuck.id, user.id).unwrap();
    assert_eq!(next.title.as_deref(), Some("Dull form"));
}

#[tokio::test]
async fn test_recommend_switch_with_nothing_suitable() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let only = svc.create_task(user.id, "Only task", neutral(), t0()).await.unwrap();

    let pick = svc.recommend_switch(only.id, user.id).unwrap();
    assert!(!pick.found);
    assert_eq!(pick.message, "No suitable tasks found. Time for a break?");
    assert_eq!(pick.task_id, None);
}

#[tokio::test]
async fn test_recommend_switch_for_unknown_user_is_not_found() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    let task = svc.create_task(user.id, "Only task", neutral(), t0()).await.unwrap();

    let err = svc.recommend_switch(task.id, 999).unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_tasks_orders_by_priority() {
    let svc = service();
    let user = svc.register_user("ada", t0()).unwrap();
    svc.create_task(user.id, "low", Sliders::new(1.0, 1.0, 1.0), t0()).await.unwrap();
    svc.create_task(user.id, "high", Sliders::new(9.0, 8.0, 8.0), t0()).await.unwrap();

    let titles: Vec<_> = svc.list_tasks(user.id).unwrap().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, ["high", "low"]);
}

#[tokio::test]
async fn test_predict_uses_estimator_and_configured_impulsiveness() {
    let svc = TaskService::new(
        Database::open_memory().unwrap(),
        Box::new(NoBreakdown),
        Box::new(FixedEstimator::new(Sliders::new(8.0, 6.0, 7.0))),
    );

    let p = svc.predict("finish the tax return tonight").await.unwrap();
    assert_eq!((p.urgency, p.fear, p.interest), (8.0, 6.0, 7.0));
    assert_eq!(p.priority_score, 32.31);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triage.db");

    let user_id = {
        let db = Database::open_at(&path).unwrap();
        let user = triage_core::User::new("ada", t0());
        records::insert_user(db.conn(), &user).unwrap()
    };

    let db = Database::open_at(&path).unwrap();
    let user = records::get_user(db.conn(), user_id).unwrap().unwrap();
    assert_eq!(user.username, "ada");
    assert_eq!(user.level, 1);
}
