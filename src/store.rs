use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{DailyLog, Task};

/// Task queries the standup engine needs. Implemented by the SQLite layer
/// and by in-memory fakes in tests. Errors propagate to the caller as-is;
/// the engine applies no retry or recovery of its own.
pub trait TaskStore {
    /// Tasks with status pending or in_progress, ordered by priority
    /// descending, then creation time descending.
    fn active_tasks(&self, user_id: i64) -> Result<Vec<Task>>;

    /// Tasks whose `updated_at` falls in the half-open interval
    /// `[start_utc, end_utc)`, ordered by `updated_at` descending.
    fn tasks_updated_in_range(
        &self,
        user_id: i64,
        start_utc: DateTime<Utc>,
        end_utc: DateTime<Utc>,
    ) -> Result<Vec<Task>>;
}

/// Daily-log lookup by exact local calendar date.
pub trait DailyLogStore {
    fn log_by_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<DailyLog>>;
}
