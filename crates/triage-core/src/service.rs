//! Task service.
//!
//! Wires scoring, the timer state machine, XP and the switch recommender to
//! storage and the external collaborators. Every state-changing operation:
//!
//! 1. takes the owning user's lock from [`UserLocks`],
//! 2. runs inside one immediate SQLite transaction,
//! 3. uses the single `now` the caller passed in.
//!
//! Holding the per-user lock across "read the active task, pause it,
//! activate the new one" makes `start` one guarded step per user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collaborators::{breakdown_or_fallback, estimate_or_neutral, BreakdownGenerator, UrgencyEstimator};
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::events::Event;
use crate::progress::award_completion;
use crate::recommend::{recommend_switch, SwitchSuggestion, DEFAULT_MAX_SWITCH_DIFFICULTY};
use crate::scoring::{compose_priority, resolve_difficulty, tmt_utility, Sliders, DEFAULT_IMPULSIVENESS};
use crate::storage::{records, Config, Database};
use crate::task::{Subtask, SubtaskStatus, Task, TaskAnalysis, TaskStatus};
use crate::timer;
use crate::user::User;

/// Difficulty shown for a task that has no analysis.
const DEFAULT_VIEW_DIFFICULTY: u8 = 5;

/// Per-user serialization handles.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// The lock handle for `user_id`, created on first use.
    ///
    /// Entries nobody else holds are dropped first, so the map only
    /// grows with concurrently busy users.
    pub fn handle(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
        Arc::clone(map.entry(user_id).or_default())
    }
}

/// Tunables the service reads from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    /// Impulsiveness for `predict`.
    pub impulsiveness: f64,
    pub max_switch_difficulty: u8,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            impulsiveness: DEFAULT_IMPULSIVENESS,
            max_switch_difficulty: DEFAULT_MAX_SWITCH_DIFFICULTY,
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            impulsiveness: config.scoring.impulsiveness,
            max_switch_difficulty: config.switch.max_difficulty,
        }
    }
}

// ── Outcomes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub task_id: i64,
    pub status: TaskStatus,
    /// Task that was paused to make room, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_task_id: Option<i64>,
    #[serde(skip)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseOutcome {
    pub task_id: i64,
    pub status: TaskStatus,
    pub time_spent: u64,
    #[serde(skip)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteOutcome {
    pub task_id: i64,
    pub status: TaskStatus,
    pub time_spent: u64,
    /// 0 when the task had already been completed
    pub xp_gained: u64,
    pub total_xp: u64,
    pub leveled_up: bool,
    pub new_level: u32,
    #[serde(skip)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub subtask_id: i64,
    pub status: SubtaskStatus,
    #[serde(skip)]
    pub events: Vec<Event>,
}

/// Slider readings predicted from text, plus the raw TMT utility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub urgency: f64,
    pub fear: f64,
    pub interest: f64,
    pub priority_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskView {
    pub id: i64,
    pub title: String,
    pub status: SubtaskStatus,
}

/// A task as shown in a list or focus view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub priority: f64,
    pub status: TaskStatus,
    pub difficulty: u8,
    pub subtasks: Vec<SubtaskView>,
    /// Start of the running stretch, for a live client-side clock
    pub started_at: Option<DateTime<Utc>>,
    /// Seconds already folded into `time_spent`
    pub accumulated: u64,
}

// ── Service ───────────────────────────────────────────────────────

/// Entry point for every task operation.
pub struct TaskService {
    db: Mutex<Database>,
    locks: UserLocks,
    breakdown: Box<dyn BreakdownGenerator>,
    estimator: Box<dyn UrgencyEstimator>,
    settings: ServiceSettings,
}

impl TaskService {
    pub fn new(
        db: Database,
        breakdown: Box<dyn BreakdownGenerator>,
        estimator: Box<dyn UrgencyEstimator>,
    ) -> Self {
        Self {
            db: Mutex::new(db),
            locks: UserLocks::default(),
            breakdown,
            estimator,
            settings: ServiceSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| CoreError::Database(DatabaseError::Poisoned))
    }

    /// Run `f` in a transaction while holding `user_id`'s lock.
    fn for_user<T>(
        &self,
        user_id: i64,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let handle = self.locks.handle(user_id);
        let _held = handle.lock().unwrap_or_else(PoisonError::into_inner);
        self.db()?.immediate(f)
    }

    fn owner_of_task(&self, task_id: i64) -> Result<i64> {
        records::get_task(self.db()?.conn(), task_id)?
            .map(|t| t.user_id)
            .ok_or_else(|| CoreError::task_not_found(task_id))
    }

    // ── Users ────────────────────────────────────────────────────

    /// Create a user with no XP at level 1.
    pub fn register_user(&self, username: &str, now: DateTime<Utc>) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::Empty("username").into());
        }
        self.db()?.immediate(|tx| {
            if records::find_user_by_name(tx, username)?.is_some() {
                return Err(CoreError::Conflict(format!("username '{username}' is taken")));
            }
            let mut user = User::new(username, now);
            user.id = records::insert_user(tx, &user)?;
            tracing::info!(user_id = user.id, "registered user");
            Ok(user)
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<User> {
        records::get_user(self.db()?.conn(), user_id)?.ok_or_else(|| CoreError::user_not_found(user_id))
    }

    pub fn find_user(&self, username: &str) -> Result<Option<User>> {
        records::find_user_by_name(self.db()?.conn(), username.trim())
    }

    // ── Scoring ──────────────────────────────────────────────────

    /// Priority for the given readings; same function task creation uses.
    pub fn calculate_score(&self, sliders: Sliders) -> f64 {
        compose_priority(sliders.urgency, sliders.fear, sliders.interest)
    }

    /// Estimate slider readings from text and the raw TMT utility for them.
    ///
    /// Never fails: a degraded estimator yields neutral readings.
    pub async fn predict(&self, text: &str) -> Result<Prediction> {
        if text.trim().is_empty() {
            return Err(ValidationError::Empty("text").into());
        }
        let s = estimate_or_neutral(self.estimator.as_ref(), text).await;
        Ok(Prediction {
            urgency: s.urgency,
            fear: s.fear,
            interest: s.interest,
            priority_score: tmt_utility(s.urgency, s.fear, s.interest, Some(self.settings.impulsiveness)),
        })
    }

    // ── Tasks ────────────────────────────────────────────────────

    /// Create a scored task with its breakdown and analysis.
    ///
    /// The breakdown generator is consulted before any lock is taken; its
    /// failure only means no subtasks and a fear-based difficulty. Readings
    /// with a NaN or infinite value are stored as neutral.
    pub async fn create_task(
        &self,
        user_id: i64,
        title: &str,
        sliders: Sliders,
        now: DateTime<Utc>,
    ) -> Result<TaskView> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title").into());
        }
        // Fail fast before calling out.
        self.get_user(user_id)?;

        // Stored readings and the priority must agree, so neutralize once here.
        let sliders = sliders.finite_or_neutral();
        let priority_score = self.calculate_score(sliders);
        let breakdown = breakdown_or_fallback(self.breakdown.as_ref(), title).await;
        let difficulty = resolve_difficulty(breakdown.difficulty, sliders.fear);
        let model_version = self.breakdown.name().to_string();

        let task_id = self.for_user(user_id, |tx| {
            if records::get_user(tx, user_id)?.is_none() {
                return Err(CoreError::user_not_found(user_id));
            }
            let task = Task::new(user_id, title, priority_score, now);
            let task_id = records::insert_task(tx, &task)?;

            for (index, step) in breakdown.steps.iter().enumerate() {
                let order_index = u32::try_from(index).unwrap_or(u32::MAX);
                records::insert_subtask(tx, &Subtask::generated(task_id, order_index, step.as_str()))?;
            }

            records::insert_analysis(
                tx,
                &TaskAnalysis {
                    task_id,
                    urgency_score: sliders.urgency,
                    fear_score: sliders.fear,
                    interest_score: sliders.interest,
                    difficulty_score: difficulty,
                    confidence: 1.0,
                    model_version,
                },
            )?;
            Ok(task_id)
        })?;

        tracing::info!(task_id, priority_score, difficulty, steps = breakdown.steps.len(), "created task");
        self.task_view(task_id)
    }

    pub fn get_task(&self, task_id: i64) -> Result<Task> {
        records::get_task(self.db()?.conn(), task_id)?.ok_or_else(|| CoreError::task_not_found(task_id))
    }

    /// Single-task view.
    pub fn task_view(&self, task_id: i64) -> Result<TaskView> {
        let db = self.db()?;
        let task = records::get_task(db.conn(), task_id)?.ok_or_else(|| CoreError::task_not_found(task_id))?;
        view(db.conn(), task)
    }

    /// All of a user's tasks, highest priority first.
    pub fn list_tasks(&self, user_id: i64) -> Result<Vec<TaskView>> {
        let db = self.db()?;
        if records::get_user(db.conn(), user_id)?.is_none() {
            return Err(CoreError::user_not_found(user_id));
        }
        records::list_tasks(db.conn(), user_id)?
            .into_iter()
            .map(|task| view(db.conn(), task))
            .collect()
    }

    // ── Timer ────────────────────────────────────────────────────

    /// Make `task_id` the user's active task, pausing whichever task was
    /// active before.
    pub fn start(&self, task_id: i64, user_id: i64, now: DateTime<Utc>) -> Result<StartOutcome> {
        self.for_user(user_id, |tx| {
            let mut task = records::get_task(tx, task_id)?
                .filter(|t| t.user_id == user_id)
                .ok_or_else(|| CoreError::task_not_found(task_id))?;
            let mut active = records::active_task(tx, user_id)?.filter(|t| t.id != task_id);

            let events = timer::start(&mut task, active.as_mut(), now);

            let mut paused_task_id = None;
            if let Some(prev) = active.as_ref().filter(|p| p.status == TaskStatus::Paused) {
                records::save_task_timer(tx, prev)?;
                paused_task_id = Some(prev.id);
            }
            records::save_task_timer(tx, &task)?;

            tracing::debug!(task_id, ?paused_task_id, status = %task.status, "start");
            Ok(StartOutcome {
                task_id,
                status: task.status,
                paused_task_id,
                events,
            })
        })
    }

    /// Pause a task, folding its running time into `time_spent`.
    pub fn pause(&self, task_id: i64, now: DateTime<Utc>) -> Result<PauseOutcome> {
        let user_id = self.owner_of_task(task_id)?;
        self.for_user(user_id, |tx| {
            let mut task = records::get_task(tx, task_id)?.ok_or_else(|| CoreError::task_not_found(task_id))?;
            let events: Vec<Event> = timer::pause(&mut task, now).into_iter().collect();
            if !events.is_empty() {
                records::save_task_timer(tx, &task)?;
            }
            tracing::debug!(task_id, time_spent = task.time_spent, "pause");
            Ok(PauseOutcome {
                task_id,
                status: task.status,
                time_spent: task.time_spent,
                events,
            })
        })
    }

    /// Complete a task and credit XP to its owner, once.
    pub fn complete(&self, task_id: i64, now: DateTime<Utc>) -> Result<CompleteOutcome> {
        let user_id = self.owner_of_task(task_id)?;
        self.for_user(user_id, |tx| {
            let mut task = records::get_task(tx, task_id)?.ok_or_else(|| CoreError::task_not_found(task_id))?;
            let mut user = records::get_user(tx, task.user_id)?
                .ok_or_else(|| CoreError::user_not_found(task.user_id))?;

            let Some(completed) = timer::complete(&mut task, now) else {
                return Ok(CompleteOutcome {
                    task_id,
                    status: task.status,
                    time_spent: task.time_spent,
                    xp_gained: 0,
                    total_xp: user.total_xp,
                    leveled_up: false,
                    new_level: user.level,
                    events: Vec::new(),
                });
            };

            let progress = award_completion(&mut user, &mut task);
            records::save_task_timer(tx, &task)?;
            records::save_user_progress(tx, &user)?;

            let mut events = vec![
                completed,
                Event::XpAwarded {
                    task_id,
                    user_id: user.id,
                    xp_gained: progress.xp_gained,
                    total_xp: progress.total_xp,
                    at: now,
                },
            ];
            if progress.leveled_up {
                events.push(Event::LevelUp {
                    user_id: user.id,
                    old_level: progress.old_level,
                    new_level: progress.new_level,
                    at: now,
                });
            }

            tracing::info!(task_id, xp_gained = progress.xp_gained, total_xp = progress.total_xp, "completed task");
            Ok(CompleteOutcome {
                task_id,
                status: task.status,
                time_spent: task.time_spent,
                xp_gained: progress.xp_gained,
                total_xp: progress.total_xp,
                leveled_up: progress.leveled_up,
                new_level: progress.new_level,
                events,
            })
        })
    }

    /// Flip a subtask between pending and completed.
    pub fn toggle_subtask(&self, subtask_id: i64, now: DateTime<Utc>) -> Result<ToggleOutcome> {
        self.db()?.immediate(|tx| {
            let mut sub = records::get_subtask(tx, subtask_id)?
                .ok_or_else(|| CoreError::subtask_not_found(subtask_id))?;
            let status = sub.toggle(now);
            records::save_subtask_status(tx, &sub)?;
            Ok(ToggleOutcome {
                subtask_id,
                status,
                events: vec![Event::SubtaskToggled {
                    subtask_id,
                    task_id: sub.task_id,
                    status,
                    at: now,
                }],
            })
        })
    }

    // ── Switching ────────────────────────────────────────────────

    /// Suggest an easier, more interesting task than `current_task_id`.
    pub fn recommend_switch(&self, current_task_id: i64, user_id: i64) -> Result<SwitchSuggestion> {
        let db = self.db()?;
        if records::get_user(db.conn(), user_id)?.is_none() {
            return Err(CoreError::user_not_found(user_id));
        }
        let pool = records::switch_pool(db.conn(), user_id, current_task_id)?;
        Ok(recommend_switch(
            current_task_id,
            &pool,
            self.settings.max_switch_difficulty,
        ))
    }
}

fn view(conn: &rusqlite::Connection, task: Task) -> Result<TaskView> {
    let difficulty = records::get_analysis(conn, task.id)?
        .map(|a| a.difficulty_score)
        .unwrap_or(DEFAULT_VIEW_DIFFICULTY);
    let subtasks = records::list_subtasks(conn, task.id)?
        .into_iter()
        .map(|s| SubtaskView {
            id: s.id,
            title: s.title,
            status: s.status,
        })
        .collect();
    Ok(TaskView {
        id: task.id,
        title: task.title,
        priority: task.priority_score,
        status: task.status,
        difficulty,
        subtasks,
        started_at: task.last_started_at,
        accumulated: task.time_spent,
    })
}
