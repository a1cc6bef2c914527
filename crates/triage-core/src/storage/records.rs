//! Row mapping for users, tasks, analyses and subtasks.
//!
//! Every function takes a plain `&Connection`, so the same code runs against
//! the database handle or inside a transaction (which derefs to one).

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

use crate::error::Result;
use crate::task::{Subtask, Task, TaskAnalysis};
use crate::user::User;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a stored timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| conversion_error(idx, format!("bad timestamp: {raw}")))
}

fn opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("bad timestamp: {raw}"))),
    }
}

fn enum_col<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

fn to_text(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ── Users ─────────────────────────────────────────────────────────

const USER_COLUMNS: &str = "id, username, total_xp, level, created_at";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        total_xp: row.get(2)?,
        level: row.get(3)?,
        created_at: ts(row, 4)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, total_xp, level, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user.username, user.total_xp, user.level, to_text(&user.created_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_user).optional()?)
}

pub fn find_user_by_name(conn: &Connection, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    Ok(conn.query_row(&sql, params![username], row_to_user).optional()?)
}

/// Persist `total_xp` and `level`.
pub fn save_user_progress(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "UPDATE users SET total_xp = ?2, level = ?3 WHERE id = ?1",
        params![user.id, user.total_xp, user.level],
    )?;
    Ok(())
}

// ── Tasks ─────────────────────────────────────────────────────────

const TASK_COLUMNS: &str = "t.id, t.user_id, t.title, t.status, t.priority_score, t.time_spent, \
                            t.last_started_at, t.xp_earned, t.created_at, t.completed_at";

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        status: enum_col(row, 3)?,
        priority_score: row.get(4)?,
        time_spent: row.get(5)?,
        last_started_at: opt_ts(row, 6)?,
        xp_earned: row.get(7)?,
        created_at: ts(row, 8)?,
        completed_at: opt_ts(row, 9)?,
    })
}

pub fn insert_task(conn: &Connection, task: &Task) -> Result<i64> {
    conn.execute(
        "INSERT INTO tasks (user_id, title, status, priority_score, time_spent,
                            last_started_at, xp_earned, created_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            task.user_id,
            task.title,
            task.status.as_str(),
            task.priority_score,
            task.time_spent,
            task.last_started_at.as_ref().map(to_text),
            task.xp_earned,
            to_text(&task.created_at),
            task.completed_at.as_ref().map(to_text),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_task).optional()?)
}

/// The user's currently active task, if any.
pub fn active_task(conn: &Connection, user_id: i64) -> Result<Option<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.user_id = ?1 AND t.status = 'active' LIMIT 1"
    );
    Ok(conn.query_row(&sql, params![user_id], row_to_task).optional()?)
}

/// All of a user's tasks, highest priority first.
pub fn list_tasks(conn: &Connection, user_id: i64) -> Result<Vec<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.user_id = ?1
         ORDER BY t.priority_score DESC, t.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], row_to_task)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Persist the timer-owned fields of a task.
pub fn save_task_timer(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "UPDATE tasks
            SET status = ?2, time_spent = ?3, last_started_at = ?4,
                xp_earned = ?5, completed_at = ?6
          WHERE id = ?1",
        params![
            task.id,
            task.status.as_str(),
            task.time_spent,
            task.last_started_at.as_ref().map(to_text),
            task.xp_earned,
            task.completed_at.as_ref().map(to_text),
        ],
    )?;
    Ok(())
}

// ── Analyses ──────────────────────────────────────────────────────

const ANALYSIS_COLUMNS: &str = "a.task_id, a.urgency_score, a.fear_score, a.interest_score, \
                                a.difficulty_score, a.confidence, a.model_version";

fn row_to_analysis(row: &Row<'_>, offset: usize) -> rusqlite::Result<TaskAnalysis> {
    Ok(TaskAnalysis {
        task_id: row.get(offset)?,
        urgency_score: row.get(offset + 1)?,
        fear_score: row.get(offset + 2)?,
        interest_score: row.get(offset + 3)?,
        difficulty_score: row.get(offset + 4)?,
        confidence: row.get(offset + 5)?,
        model_version: row.get(offset + 6)?,
    })
}

pub fn insert_analysis(conn: &Connection, analysis: &TaskAnalysis) -> Result<()> {
    conn.execute(
        "INSERT INTO task_analysis (task_id, urgency_score, fear_score, interest_score,
                                    difficulty_score, confidence, model_version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            analysis.task_id,
            analysis.urgency_score,
            analysis.fear_score,
            analysis.interest_score,
            analysis.difficulty_score,
            analysis.confidence,
            analysis.model_version,
        ],
    )?;
    Ok(())
}

pub fn get_analysis(conn: &Connection, task_id: i64) -> Result<Option<TaskAnalysis>> {
    let sql = format!("SELECT {ANALYSIS_COLUMNS} FROM task_analysis a WHERE a.task_id = ?1");
    Ok(conn
        .query_row(&sql, params![task_id], |row| row_to_analysis(row, 0))
        .optional()?)
}

/// Open tasks of `user_id` other than `exclude_task_id`, joined to their
/// analyses, most interesting first (ties by id).
pub fn switch_pool(
    conn: &Connection,
    user_id: i64,
    exclude_task_id: i64,
) -> Result<Vec<(Task, TaskAnalysis)>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS}, {ANALYSIS_COLUMNS}
           FROM tasks t
           JOIN task_analysis a ON a.task_id = t.id
          WHERE t.user_id = ?1
            AND t.id != ?2
            AND t.status IN ('pending', 'paused', 'active')
          ORDER BY a.interest_score DESC, t.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, exclude_task_id], |row| {
        Ok((row_to_task(row)?, row_to_analysis(row, 10)?))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ── Subtasks ──────────────────────────────────────────────────────

const SUBTASK_COLUMNS: &str = "id, task_id, title, order_index, status, created_by, completed_at";

fn row_to_subtask(row: &Row<'_>) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get(0)?,
        task_id: row.get(1)?,
        title: row.get(2)?,
        order_index: row.get(3)?,
        status: enum_col(row, 4)?,
        created_by: enum_col(row, 5)?,
        completed_at: opt_ts(row, 6)?,
    })
}

pub fn insert_subtask(conn: &Connection, subtask: &Subtask) -> Result<i64> {
    conn.execute(
        "INSERT INTO subtasks (task_id, title, order_index, status, created_by, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            subtask.task_id,
            subtask.title,
            subtask.order_index,
            subtask.status.as_str(),
            subtask.created_by.as_str(),
            subtask.completed_at.as_ref().map(to_text),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_subtask(conn: &Connection, id: i64) -> Result<Option<Subtask>> {
    let sql = format!("SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_subtask).optional()?)
}

/// A task's subtasks in breakdown order.
pub fn list_subtasks(conn: &Connection, task_id: i64) -> Result<Vec<Subtask>> {
    let sql = format!(
        "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE task_id = ?1 ORDER BY order_index, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![task_id], row_to_subtask)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn save_subtask_status(conn: &Connection, subtask: &Subtask) -> Result<()> {
    conn.execute(
        "UPDATE subtasks SET status = ?2, completed_at = ?3 WHERE id = ?1",
        params![
            subtask.id,
            subtask.status.as_str(),
            subtask.completed_at.as_ref().map(to_text),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::task::{SubtaskStatus, TaskStatus};
    use chrono::{Duration, TimeZone};

    fn seeded() -> (Database, User) {
        let db = Database::open_memory().unwrap();
        let mut user = User::new("ada", Utc::now());
        user.id = insert_user(db.conn(), &user).unwrap();
        (db, user)
    }

    fn add_task(db: &Database, user_id: i64, title: &str, priority: f64) -> Task {
        let mut task = Task::new(user_id, title, priority, Utc::now());
        task.id = insert_task(db.conn(), &task).unwrap();
        task
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_and_naive() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01T09:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T10:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01 09:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn corrupt_columns_surface_as_corrupt_value() {
        use crate::error::{CoreError, DatabaseError};

        let (db, user) = seeded();
        db.conn()
            .execute(
                "INSERT INTO tasks (user_id, title, status, priority_score, created_at)
                 VALUES (?1, 'odd', 'running', 1.0, '2026-01-01T00:00:00Z')",
                params![user.id],
            )
            .unwrap();
        let bad_status = db.conn().last_insert_rowid();
        let err = get_task(db.conn(), bad_status).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::CorruptValue { column: 3, .. })
        ));

        db.conn()
            .execute(
                "INSERT INTO tasks (user_id, title, status, priority_score, created_at)
                 VALUES (?1, 'odd', 'pending', 1.0, 'last tuesday')",
                params![user.id],
            )
            .unwrap();
        let bad_stamp = db.conn().last_insert_rowid();
        let err = get_task(db.conn(), bad_stamp).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::CorruptValue { column: 8, .. })
        ));
    }

    #[test]
    fn task_round_trip() {
        let (db, user) = seeded();
        let mut task = add_task(&db, user.id, "Write report", 26.124);
        let started = Utc::now() - Duration::seconds(30);
        task.status = TaskStatus::Active;
        task.last_started_at = Some(started);
        task.time_spent = 120;
        save_task_timer(db.conn(), &task).unwrap();

        let loaded = get_task(db.conn(), task.id).unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Active);
        assert_eq!(loaded.time_spent, 120);
        assert_eq!(loaded.priority_score, 26.124);
        assert_eq!(
            loaded.last_started_at.map(|t| t.timestamp_micros()),
            Some(started.timestamp_micros())
        );
        assert_eq!(active_task(db.conn(), user.id).unwrap().map(|t| t.id), Some(task.id));
    }

    #[test]
    fn naive_start_stamp_reads_as_utc() {
        let (db, user) = seeded();
        let task = add_task(&db, user.id, "Legacy", 1.0);
        db.conn()
            .execute(
                "UPDATE tasks SET status = 'active', last_started_at = '2026-03-01 09:30:00' WHERE id = ?1",
                params![task.id],
            )
            .unwrap();

        let loaded = get_task(db.conn(), task.id).unwrap().unwrap();
        assert_eq!(
            loaded.last_started_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn list_orders_by_priority() {
        let (db, user) = seeded();
        add_task(&db, user.id, "low", 3.0);
        add_task(&db, user.id, "high", 30.0);
        add_task(&db, user.id, "mid", 12.0);

        let titles: Vec<_> = list_tasks(db.conn(), user.id)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["high", "mid", "low"]);
    }

    #[test]
    fn subtasks_keep_breakdown_order() {
        let (db, user) = seeded();
        let task = add_task(&db, user.id, "Essay", 10.0);
        for (i, step) in ["Outline", "Draft", "Edit"].iter().enumerate() {
            insert_subtask(db.conn(), &Subtask::generated(task.id, i as u32, *step)).unwrap();
        }

        let subs = list_subtasks(db.conn(), task.id).unwrap();
        let titles: Vec<_> = subs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Outline", "Draft", "Edit"]);
        assert_eq!(subs[2].order_index, 2);

        let mut first = subs[0].clone();
        first.toggle(Utc::now());
        save_subtask_status(db.conn(), &first).unwrap();
        let reloaded = get_subtask(db.conn(), first.id).unwrap().unwrap();
        assert_eq!(reloaded.status, SubtaskStatus::Completed);
        assert!(reloaded.completed_at.is_some());
    }

    #[test]
    fn switch_pool_is_scoped_to_user_and_open_tasks() {
        let (db, user) = seeded();
        let mut other = User::new("bob", Utc::now());
        other.id = insert_user(db.conn(), &other).unwrap();

        let analysis = |task_id: i64, interest: f64| TaskAnalysis {
            task_id,
            urgency_score: 5.0,
            fear_score: 5.0,
            interest_score: interest,
            difficulty_score: 3,
            confidence: 1.0,
            model_version: "test".into(),
        };

        let current = add_task(&db, user.id, "current", 1.0);
        let open = add_task(&db, user.id, "open", 1.0);
        let mut done = add_task(&db, user.id, "done", 1.0);
        let foreign = add_task(&db, other.id, "foreign", 1.0);
        done.status = TaskStatus::Completed;
        save_task_timer(db.conn(), &done).unwrap();
        for (id, interest) in [(current.id, 9.0), (open.id, 4.0), (done.id, 10.0), (foreign.id, 10.0)] {
            insert_analysis(db.conn(), &analysis(id, interest)).unwrap();
        }

        let pool = switch_pool(db.conn(), user.id, current.id).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].0.id, open.id);
        assert_eq!(pool[0].1.interest_score, 4.0);
    }

    #[test]
    fn missing_rows_are_none() {
        let (db, _) = seeded();
        assert!(get_task(db.conn(), 99).unwrap().is_none());
        assert!(get_subtask(db.conn(), 99).unwrap().is_none());
        assert!(get_user(db.conn(), 99).unwrap().is_none());
        assert!(get_analysis(db.conn(), 99).unwrap().is_none());
    }
}
