use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::dashboard::DailyStat;
use crate::models::{DailyLog, Note, Priority, Task, TaskStatus};
use crate::store::{DailyLogStore, TaskStore};

const STANDUP_TIME_KEY: &str = "standup_time";

fn default_standup_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap()
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new() -> Result<Self> {
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let db_path = PathBuf::from(home_dir).join(".taskverse.db");
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL DEFAULT 1,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                priority INTEGER NOT NULL DEFAULT 1,
                status TEXT NOT NULL DEFAULT 'pending',
                category TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS daily_logs (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL DEFAULT 1,
                log_date TEXT NOT NULL,
                content TEXT NOT NULL,
                hours_spent REAL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, log_date)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL DEFAULT 1,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                pinned INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS config (
                user_id INTEGER NOT NULL,
                key_name TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, key_name)
            )",
            [],
        )?;

        log::debug!("database ready");
        Ok(Database { conn })
    }

    pub fn create_task(
        &self,
        user_id: i64,
        title: &str,
        description: &str,
        priority: Priority,
        category: &str,
    ) -> Result<Task> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO tasks (user_id, title, description, priority, status, category, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user_id,
                title,
                description,
                priority.rank(),
                TaskStatus::Pending.as_str(),
                category,
                now,
                now
            ],
        )?;

        Ok(Task {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            description: description.to_string(),
            priority,
            status: TaskStatus::Pending,
            category: category.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn list_tasks(&self, user_id: i64, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, priority, status, category, created_at, updated_at
             FROM tasks
             WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY priority DESC, created_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id, status.map(|s| s.as_str())], task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Returns false when the task does not exist for this user.
    pub fn set_task_status(&self, user_id: i64, task_id: i64, status: TaskStatus) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![status.as_str(), Utc::now(), task_id, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn set_task_priority(&self, user_id: i64, task_id: i64, priority: Priority) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE tasks SET priority = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            params![priority.rank(), Utc::now(), task_id, user_id],
        )?;
        Ok(rows > 0)
    }

    pub fn remove_task(&self, user_id: i64, task_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![task_id, user_id],
        )?;
        Ok(rows > 0)
    }

    /// Id/title pairs for fuzzy title resolution in the CLI.
    pub fn task_titles(&self, user_id: i64) -> Result<Vec<(i64, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title FROM tasks WHERE user_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut titles = Vec::new();
        for row in rows {
            titles.push(row?);
        }
        Ok(titles)
    }

    /// Insert or replace the log for a local calendar date.
    pub fn upsert_log(
        &self,
        user_id: i64,
        date: NaiveDate,
        content: &str,
        hours_spent: Option<f64>,
    ) -> Result<DailyLog> {
        self.conn.execute(
            "INSERT INTO daily_logs (user_id, log_date, content, hours_spent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, log_date)
             DO UPDATE SET content = excluded.content, hours_spent = excluded.hours_spent",
            params![user_id, date, content, hours_spent, Utc::now()],
        )?;

        let log = self
            .log_for_date(user_id, date)?
            .ok_or_else(|| anyhow::anyhow!("log for {} missing after upsert", date))?;
        Ok(log)
    }

    fn log_for_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<DailyLog>> {
        let log = self
            .conn
            .query_row(
                "SELECT id, log_date, content, hours_spent FROM daily_logs
                 WHERE user_id = ?1 AND log_date = ?2",
                params![user_id, date],
                |row| {
                    Ok(DailyLog {
                        id: row.get(0)?,
                        log_date: row.get(1)?,
                        content: row.get(2)?,
                        hours_spent: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(log)
    }

    /// Logs with `from <= log_date < to`, ordered by date.
    pub fn logs_in_range(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, log_date, content, hours_spent FROM daily_logs
             WHERE user_id = ?1 AND log_date >= ?2 AND log_date < ?3
             ORDER BY log_date",
        )?;
        let rows = stmt.query_map(params![user_id, from, to], |row| {
            Ok(DailyLog {
                id: row.get(0)?,
                log_date: row.get(1)?,
                content: row.get(2)?,
                hours_spent: row.get(3)?,
            })
        })?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }

    pub fn create_note(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        pinned: bool,
    ) -> Result<Note> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO notes (user_id, title, content, pinned, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, title, content, pinned, now, now],
        )?;

        Ok(Note {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            content: content.to_string(),
            pinned,
            created_at: now,
            updated_at: now,
        })
    }

    /// Notes for a user, pinned ones first, then most recently updated.
    pub fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, pinned, created_at, updated_at
             FROM notes WHERE user_id = ?1
             ORDER BY pinned DESC, updated_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Note {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                pinned: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    pub fn remove_note(&self, user_id: i64, note_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
            params![note_id, user_id],
        )?;
        Ok(rows > 0)
    }

    /// Id/title pairs for fuzzy note-title resolution in the CLI.
    pub fn note_titles(&self, user_id: i64) -> Result<Vec<(i64, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title FROM notes WHERE user_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut titles = Vec::new();
        for row in rows {
            titles.push(row?);
        }
        Ok(titles)
    }

    pub fn set_config(&self, user_id: i64, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (user_id, key_name, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, key_name)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![user_id, key, value, Utc::now()],
        )?;
        Ok(())
    }

    pub fn get_config(&self, user_id: i64, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE user_id = ?1 AND key_name = ?2",
                params![user_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// The user's standup trigger time. Defaults to 10:00 when unset; an
    /// unparseable stored value also falls back to the default.
    pub fn standup_time(&self, user_id: i64) -> Result<NaiveTime> {
        match self.get_config(user_id, STANDUP_TIME_KEY)? {
            Some(raw) => match NaiveTime::parse_from_str(&raw, "%H:%M") {
                Ok(time) => Ok(time),
                Err(_) => {
                    log::warn!("stored standup time '{}' is invalid, using default", raw);
                    Ok(default_standup_time())
                }
            },
            None => Ok(default_standup_time()),
        }
    }

    pub fn set_standup_time(&self, user_id: i64, time: NaiveTime) -> Result<()> {
        self.set_config(
            user_id,
            STANDUP_TIME_KEY,
            &time.format("%H:%M").to_string(),
        )
    }

    pub fn status_distribution(&self, user_id: i64) -> Result<HashMap<TaskStatus, i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM tasks WHERE user_id = ?1 GROUP BY status")?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut distribution = HashMap::new();
        for row in rows {
            let (status, count) = row?;
            if let Ok(status) = status.parse::<TaskStatus>() {
                distribution.insert(status, count);
            }
        }
        Ok(distribution)
    }

    /// The most recently updated tasks, for the dashboard activity feed.
    pub fn recent_tasks(&self, user_id: i64, limit: i64) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, priority, status, category, created_at, updated_at
             FROM tasks WHERE user_id = ?1
             ORDER BY updated_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Per-day created/completed counts for tasks created in
    /// `[from, to)`, grouped by the UTC date of creation.
    pub fn daily_stats(&self, user_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyStat>> {
        let mut stmt = self.conn.prepare(
            "SELECT date(created_at) AS day,
                    SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END),
                    COUNT(*)
             FROM tasks
             WHERE user_id = ?1 AND date(created_at) >= ?2 AND date(created_at) < ?3
             GROUP BY day
             ORDER BY day",
        )?;
        let rows = stmt.query_map(params![user_id, from, to], |row| {
            Ok(DailyStat {
                date: row.get(0)?,
                completed: row.get(1)?,
                total: row.get(2)?,
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}

/// Parse a user-supplied standup time. Malformed or out-of-range input
/// is rejected here, at the configuration boundary; the report engine
/// assumes a valid time.
pub fn parse_standup_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| anyhow::anyhow!("invalid standup time '{}': expected HH:MM", raw))
}

impl TaskStore for Database {
    fn active_tasks(&self, user_id: i64) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, priority, status, category, created_at, updated_at
             FROM tasks
             WHERE user_id = ?1 AND status IN ('pending', 'in_progress')
             ORDER BY priority DESC, created_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id], task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    fn tasks_updated_in_range(
        &self,
        user_id: i64,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, priority, status, category, created_at, updated_at
             FROM tasks
             WHERE user_id = ?1 AND updated_at >= ?2 AND updated_at < ?3
             ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id, start_utc, end_utc], task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}

impl DailyLogStore for Database {
    fn log_by_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<DailyLog>> {
        self.log_for_date(user_id, date)
    }
}

/// Map a task row in column order: [id, title, description, priority,
/// status, category, created_at, updated_at].
fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get(4)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: Priority::from_rank(row.get(3)?),
        status: status.parse().unwrap_or(TaskStatus::Pending),
        category: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
