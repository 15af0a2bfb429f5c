use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::{Priority, Task, TaskStatus};
use crate::store::{DailyLogStore, TaskStore};

/// Keywords that flag a task as an impediment. Order matters: the first
/// keyword found in a task's text wins, even if several are present.
pub const IMPEDIMENT_KEYWORDS: [&str; 10] = [
    "blocked",
    "waiting",
    "dependency",
    "issue",
    "error",
    "access required",
    "pending approval",
    "blocker",
    "stuck",
    "unable",
];

/// Fixed +05:30 offset applied by hand to UTC instants. This is an offset,
/// not an IANA zone: no DST rules, no tz database lookup.
const LOCAL_OFFSET_MINUTES: i64 = 5 * 60 + 30;

fn local_offset() -> Duration {
    Duration::minutes(LOCAL_OFFSET_MINUTES)
}

/// One standup cycle: a 24h half-open `[start, end)` interval in UTC.
/// `local_date` is the local calendar date of the window start, used to
/// look up the daily log belonging to the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub local_date: NaiveDate,
}

/// The two contiguous windows a standup report covers.
/// Invariant: `previous.end == current.start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandupWindows {
    pub current: ReportingWindow,
    pub previous: ReportingWindow,
}

/// Derive the current and previous reporting windows from the clock and
/// the user's standup time-of-day.
///
/// The standup instant on the local date of "now" splits the day: at or
/// after it, the current window starts there; before it, the current
/// window started at yesterday's standup instant. Both windows are always
/// exactly 24 hours.
pub fn compute_windows(now_utc: DateTime<Utc>, standup_time: NaiveTime) -> StandupWindows {
    let now_local = now_utc.naive_utc() + local_offset();
    let today_standup = now_local.date().and_time(standup_time);

    let current_start_local = if now_local >= today_standup {
        today_standup
    } else {
        today_standup - Duration::days(1)
    };
    let previous_start_local = current_start_local - Duration::days(1);

    StandupWindows {
        current: window_from_local_start(current_start_local),
        previous: window_from_local_start(previous_start_local),
    }
}

fn window_from_local_start(start_local: NaiveDateTime) -> ReportingWindow {
    ReportingWindow {
        start: local_to_utc(start_local),
        end: local_to_utc(start_local + Duration::days(1)),
        local_date: start_local.date(),
    }
}

fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - local_offset()))
}

/// Local calendar date of a UTC instant under the fixed offset.
pub fn local_date_of(now_utc: DateTime<Utc>) -> NaiveDate {
    (now_utc.naive_utc() + local_offset()).date()
}

/// A task enriched with its impediment classification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandupTask {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub category: String,
    pub is_impediment: bool,
    pub impediment_keyword: Option<&'static str>,
}

/// Classify a task against the keyword list: lower-cased title plus
/// description, plain substring containment, first listed keyword wins.
pub fn classify(task: &Task) -> StandupTask {
    let text = format!("{} {}", task.title, task.description).to_lowercase();
    let keyword = IMPEDIMENT_KEYWORDS
        .iter()
        .copied()
        .find(|k| text.contains(k));

    StandupTask {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        priority: task.priority,
        status: task.status,
        category: task.category.clone(),
        is_impediment: keyword.is_some(),
        impediment_keyword: keyword,
    }
}

/// Union of active tasks and tasks updated in the current window,
/// deduplicated by id. Active tasks come first and their instance wins
/// when the same id shows up in both lists.
pub fn merge_today_tasks(active: Vec<Task>, updated_in_window: Vec<Task>) -> Vec<Task> {
    let mut seen: HashSet<i64> = active.iter().map(|t| t.id).collect();
    let mut merged = active;
    for task in updated_in_window {
        if seen.insert(task.id) {
            merged.push(task);
        }
    }
    merged
}

/// Deduplicated impediments from both sections, in first-appearance order
/// (yesterday's instance wins over today's for the same id).
pub fn collect_impediments(yesterday: &[StandupTask], today: &[StandupTask]) -> Vec<StandupTask> {
    let mut seen = HashSet::new();
    yesterday
        .iter()
        .chain(today.iter())
        .filter(|t| t.is_impediment && seen.insert(t.id))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandupReport {
    pub standup_time: String,
    pub previous_window_start: DateTime<Utc>,
    pub previous_window_end: DateTime<Utc>,
    pub reporting_window_start: DateTime<Utc>,
    pub reporting_window_end: DateTime<Utc>,
    pub yesterday_tasks: Vec<StandupTask>,
    pub yesterday_log: Option<String>,
    pub yesterday_hours: Option<f64>,
    pub today_tasks: Vec<StandupTask>,
    pub today_log: Option<String>,
    pub today_hours: Option<f64>,
    pub impediments: Vec<StandupTask>,
}

/// Assemble the full standup report for one user: windows, yesterday and
/// today task lists, impediments, and the two daily logs. Pure derivation
/// over the injected stores, computed fresh on every call.
pub fn compute_standup_report(
    tasks: &impl TaskStore,
    logs: &impl DailyLogStore,
    user_id: i64,
    standup_time: NaiveTime,
    now_utc: DateTime<Utc>,
) -> Result<StandupReport> {
    let windows = compute_windows(now_utc, standup_time);

    let yesterday_tasks =
        tasks.tasks_updated_in_range(user_id, windows.previous.start, windows.previous.end)?;
    let active = tasks.active_tasks(user_id)?;
    let today_updated =
        tasks.tasks_updated_in_range(user_id, windows.current.start, windows.current.end)?;
    let today_tasks = merge_today_tasks(active, today_updated);

    let yesterday_log = logs.log_by_date(user_id, windows.previous.local_date)?;
    let today_log = logs.log_by_date(user_id, windows.current.local_date)?;

    let yesterday_dtos: Vec<StandupTask> = yesterday_tasks.iter().map(classify).collect();
    let today_dtos: Vec<StandupTask> = today_tasks.iter().map(classify).collect();
    let impediments = collect_impediments(&yesterday_dtos, &today_dtos);

    Ok(StandupReport {
        standup_time: standup_time.format("%H:%M").to_string(),
        previous_window_start: windows.previous.start,
        previous_window_end: windows.previous.end,
        reporting_window_start: windows.current.start,
        reporting_window_end: windows.current.end,
        yesterday_tasks: yesterday_dtos,
        yesterday_log: yesterday_log.as_ref().map(|l| l.content.clone()),
        yesterday_hours: yesterday_log.as_ref().and_then(|l| l.hours_spent),
        today_tasks: today_dtos,
        today_log: today_log.as_ref().map(|l| l.content.clone()),
        today_hours: today_log.as_ref().and_then(|l| l.hours_spent),
        impediments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyLog;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn task(id: i64, title: &str, description: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: description.to_string(),
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            category: String::new(),
            created_at: utc(2024, 1, 10, 8, 0, 0),
            updated_at: utc(2024, 1, 10, 8, 0, 0),
        }
    }

    struct FakeTasks {
        tasks: Vec<Task>,
    }

    impl TaskStore for FakeTasks {
        fn active_tasks(&self, _user_id: i64) -> Result<Vec<Task>> {
            let mut active: Vec<Task> = self
                .tasks
                .iter()
                .filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::InProgress))
                .cloned()
                .collect();
            active.sort_by(|a, b| {
                b.priority
                    .rank()
                    .cmp(&a.priority.rank())
                    .then(b.created_at.cmp(&a.created_at))
            });
            Ok(active)
        }

        fn tasks_updated_in_range(
            &self,
            _user_id: i64,
            start_utc: DateTime<Utc>,
            end_utc: DateTime<Utc>,
        ) -> Result<Vec<Task>> {
            let mut hits: Vec<Task> = self
                .tasks
                .iter()
                .filter(|t| t.updated_at >= start_utc && t.updated_at < end_utc)
                .cloned()
                .collect();
            hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(hits)
        }
    }

    struct FakeLogs {
        logs: Vec<DailyLog>,
    }

    impl DailyLogStore for FakeLogs {
        fn log_by_date(&self, _user_id: i64, date: NaiveDate) -> Result<Option<DailyLog>> {
            Ok(self.logs.iter().find(|l| l.log_date == date).cloned())
        }
    }

    #[test]
    fn windows_are_contiguous_and_24h() {
        let times = [t(0, 0), t(9, 30), t(10, 0), t(23, 59)];
        let nows = [
            utc(2024, 1, 15, 3, 30, 0),
            utc(2024, 1, 15, 4, 30, 0),
            utc(2024, 1, 15, 18, 29, 0),
            utc(2024, 2, 29, 23, 0, 0),
        ];
        for standup in times {
            for now in nows {
                let w = compute_windows(now, standup);
                assert_eq!(w.previous.end, w.current.start);
                assert_eq!(w.current.end - w.current.start, Duration::days(1));
                assert_eq!(w.previous.end - w.previous.start, Duration::days(1));
            }
        }
    }

    #[test]
    fn before_standup_uses_yesterdays_cycle() {
        // 2024-01-15T09:00+05:30 is 03:30 UTC, one hour before a 10:00
        // standup: the current window began at yesterday's standup.
        let w = compute_windows(utc(2024, 1, 15, 3, 30, 0), t(10, 0));
        assert_eq!(w.current.start, utc(2024, 1, 14, 4, 30, 0));
        assert_eq!(w.current.end, utc(2024, 1, 15, 4, 30, 0));
        assert_eq!(w.previous.start, utc(2024, 1, 13, 4, 30, 0));
        assert_eq!(w.previous.end, utc(2024, 1, 14, 4, 30, 0));
        assert_eq!(w.current.local_date, NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
        assert_eq!(w.previous.local_date, NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
    }

    #[test]
    fn after_standup_uses_todays_cycle() {
        // 11:00 local, one hour past standup.
        let w = compute_windows(utc(2024, 1, 15, 5, 30, 0), t(10, 0));
        assert_eq!(w.current.start, utc(2024, 1, 15, 4, 30, 0));
        assert_eq!(w.previous.start, utc(2024, 1, 14, 4, 30, 0));
    }

    #[test]
    fn now_exactly_at_standup_belongs_to_new_cycle() {
        // 10:00 local sharp counts as "at or after".
        let w = compute_windows(utc(2024, 1, 15, 4, 30, 0), t(10, 0));
        assert_eq!(w.current.start, utc(2024, 1, 15, 4, 30, 0));
    }

    #[test]
    fn midnight_standup_always_starts_today() {
        // Local midnight standup: every local instant is >= it, so the
        // current window always starts at today's local midnight.
        let w = compute_windows(utc(2024, 1, 14, 18, 30, 0), t(0, 0));
        assert_eq!(w.current.start, utc(2024, 1, 14, 18, 30, 0));
        assert_eq!(w.current.local_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn merge_keeps_active_instance_and_dedups() {
        let mut active_one = task(1, "Ship release", "");
        active_one.status = TaskStatus::InProgress;
        let active = vec![active_one, task(2, "Write docs", "")];

        let mut updated_one = task(1, "Ship release", "");
        updated_one.status = TaskStatus::Completed;
        let updated = vec![updated_one, task(3, "Fix flaky test", "")];

        let merged = merge_today_tasks(active, updated);
        let ids: Vec<i64> = merged.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // The active-query instance of task 1 wins over the updated one.
        assert_eq!(merged[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn classification_is_case_insensitive() {
        let c = classify(&task(1, "BLOCKED on infra", ""));
        assert!(c.is_impediment);
        assert_eq!(c.impediment_keyword, Some("blocked"));
    }

    #[test]
    fn first_keyword_in_list_order_wins() {
        let c = classify(&task(
            1,
            "Fix login",
            "blocked by access required from infra",
        ));
        assert_eq!(c.impediment_keyword, Some("blocked"));
    }

    #[test]
    fn keyword_order_is_list_order_not_text_order() {
        // "waiting" comes first in the text, but "blocked" is earlier in
        // the keyword list and wins.
        let c = classify(&task(1, "waiting, also blocked", ""));
        assert_eq!(c.impediment_keyword, Some("blocked"));
    }

    #[test]
    fn substring_match_ignores_word_boundaries() {
        // Plain containment, preserved as-is: "unstuck" matches "stuck".
        let c = classify(&task(1, "Got unstuck today", ""));
        assert!(c.is_impediment);
        assert_eq!(c.impediment_keyword, Some("stuck"));
    }

    #[test]
    fn no_keyword_means_no_impediment() {
        let c = classify(&task(1, "Review design doc", "half done"));
        assert!(!c.is_impediment);
        assert_eq!(c.impediment_keyword, None);
    }

    #[test]
    fn impediments_dedup_prefers_yesterday_instance() {
        let mut y = classify(&task(1, "blocked on infra", ""));
        y.status = TaskStatus::Completed;
        let today = vec![
            classify(&task(1, "blocked on infra", "")),
            classify(&task(2, "waiting for review", "")),
        ];
        let imps = collect_impediments(&[y], &today);
        let ids: Vec<i64> = imps.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(imps[0].status, TaskStatus::Completed);
    }

    #[test]
    fn empty_stores_yield_empty_report() {
        let tasks = FakeTasks { tasks: vec![] };
        let logs = FakeLogs { logs: vec![] };
        let report =
            compute_standup_report(&tasks, &logs, 1, t(10, 0), utc(2024, 1, 15, 5, 0, 0)).unwrap();

        assert!(report.yesterday_tasks.is_empty());
        assert!(report.today_tasks.is_empty());
        assert!(report.impediments.is_empty());
        assert_eq!(report.today_log, None);
        assert_eq!(report.today_hours, None);
        assert_eq!(report.standup_time, "10:00");
    }

    #[test]
    fn report_sections_and_logs_line_up_with_windows() {
        // Standup 10:00, now 11:00 local on Jan 15. Current window is
        // [Jan 15 04:30Z, Jan 16 04:30Z), previous one day earlier.
        let now = utc(2024, 1, 15, 5, 30, 0);

        let mut yesterday_task = task(1, "Ship release", "blocked on approvals");
        yesterday_task.status = TaskStatus::Completed;
        yesterday_task.updated_at = utc(2024, 1, 14, 12, 0, 0);

        let mut today_done = task(2, "Fix login", "");
        today_done.status = TaskStatus::Completed;
        today_done.updated_at = utc(2024, 1, 15, 4, 30, 0); // inclusive start

        let mut excluded = task(3, "Old cleanup", "");
        excluded.status = TaskStatus::Completed;
        excluded.updated_at = utc(2024, 1, 16, 4, 30, 0); // exclusive end

        let mut active = task(4, "Write docs", "waiting on review");
        active.status = TaskStatus::InProgress;
        active.updated_at = utc(2024, 1, 15, 6, 0, 0);

        let tasks = FakeTasks {
            tasks: vec![yesterday_task, today_done, excluded, active],
        };
        let logs = FakeLogs {
            logs: vec![
                DailyLog {
                    id: 1,
                    log_date: NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
                    content: "wrapped up release".to_string(),
                    hours_spent: Some(7.5),
                },
                DailyLog {
                    id: 2,
                    log_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                    content: "docs day".to_string(),
                    hours_spent: None,
                },
            ],
        };

        let report = compute_standup_report(&tasks, &logs, 1, t(10, 0), now).unwrap();

        let yesterday_ids: Vec<i64> = report.yesterday_tasks.iter().map(|t| t.id).collect();
        assert_eq!(yesterday_ids, vec![1]);

        let today_ids: Vec<i64> = report.today_tasks.iter().map(|t| t.id).collect();
        // Active task first, then the completed-today task; task 3 falls
        // exactly on the exclusive end boundary and is left out.
        assert_eq!(today_ids, vec![4, 2]);

        let imp_ids: Vec<i64> = report.impediments.iter().map(|t| t.id).collect();
        assert_eq!(imp_ids, vec![1, 4]);

        assert_eq!(report.yesterday_log.as_deref(), Some("wrapped up release"));
        assert_eq!(report.yesterday_hours, Some(7.5));
        assert_eq!(report.today_log.as_deref(), Some("docs day"));
        assert_eq!(report.today_hours, None);

        assert_eq!(report.reporting_window_start, utc(2024, 1, 15, 4, 30, 0));
        assert_eq!(report.previous_window_end, report.reporting_window_start);
    }

    #[test]
    fn today_list_never_contains_duplicate_ids() {
        let mut twice = task(7, "Ship release", "");
        twice.status = TaskStatus::InProgress;
        twice.updated_at = utc(2024, 1, 15, 6, 0, 0);
        let tasks = FakeTasks { tasks: vec![twice] };
        let logs = FakeLogs { logs: vec![] };

        let report =
            compute_standup_report(&tasks, &logs, 1, t(10, 0), utc(2024, 1, 15, 7, 0, 0)).unwrap();
        assert_eq!(report.today_tasks.len(), 1);
    }
}
