use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{DailyLog, Task, TaskStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub productivity_percentage: f64,
    pub recent_activity: Vec<RecentActivity>,
}

/// Completed/total counts for one creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub completed: i64,
    pub total: i64,
}

pub fn build_summary(
    distribution: &HashMap<TaskStatus, i64>,
    recent: &[Task],
) -> DashboardSummary {
    let total: i64 = distribution.values().sum();
    let completed = distribution.get(&TaskStatus::Completed).copied().unwrap_or(0);
    let pending = distribution.get(&TaskStatus::Pending).copied().unwrap_or(0);
    let in_progress = distribution.get(&TaskStatus::InProgress).copied().unwrap_or(0);

    DashboardSummary {
        total_tasks: total,
        completed_tasks: completed,
        pending_tasks: pending,
        in_progress_tasks: in_progress,
        productivity_percentage: percentage(completed, total),
        recent_activity: recent
            .iter()
            .map(|t| RecentActivity {
                id: t.id,
                title: t.title.clone(),
                status: t.status,
                timestamp: t.updated_at,
            })
            .collect(),
    }
}

/// Share of completed tasks, rounded to one decimal; 0 when empty.
fn percentage(completed: i64, total: i64) -> f64 {
    if total > 0 {
        (completed as f64 / total as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub hours_spent: Option<f64>,
    pub log_content: Option<String>,
    pub tasks_completed: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timesheet {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_hours: f64,
    pub days: Vec<TimesheetDay>,
}

/// Seven day rows starting at `week_start`, each joining the day's log
/// with its completed-task count.
pub fn build_timesheet(week_start: NaiveDate, logs: &[DailyLog], stats: &[DailyStat]) -> Timesheet {
    let days: Vec<TimesheetDay> = (0..7)
        .map(|i| {
            let date = week_start + Duration::days(i);
            let log = logs.iter().find(|l| l.log_date == date);
            let stat = stats.iter().find(|s| s.date == date);
            TimesheetDay {
                date,
                day_name: date.format("%a").to_string(),
                hours_spent: log.and_then(|l| l.hours_spent),
                log_content: log
                    .map(|l| l.content.clone())
                    .filter(|c| !c.is_empty()),
                tasks_completed: stat.map_or(0, |s| s.completed),
            }
        })
        .collect();

    Timesheet {
        week_start,
        week_end: week_start + Duration::days(6),
        total_hours: days.iter().filter_map(|d| d.hours_spent).sum(),
        days,
    }
}

/// Monday of the week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `date`.
pub fn month_start_of(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// First day of the month after the one starting at `month_start`.
pub fn month_end_of(month_start: NaiveDate) -> NaiveDate {
    let (year, month) = if month_start.month() == 12 {
        (month_start.year() + 1, 1)
    } else {
        (month_start.year(), month_start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(month_start)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub completed: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<WeeklyDay>,
}

/// One row per day of the week starting at `week_start`; days without
/// created tasks report zero counts.
pub fn build_weekly_report(week_start: NaiveDate, stats: &[DailyStat]) -> WeeklyReport {
    let days = (0..7)
        .map(|i| {
            let date = week_start + Duration::days(i);
            let stat = stats.iter().find(|s| s.date == date);
            WeeklyDay {
                date,
                day_name: date.format("%a").to_string(),
                completed: stat.map_or(0, |s| s.completed),
                total: stat.map_or(0, |s| s.total),
            }
        })
        .collect();

    WeeklyReport {
        week_start,
        week_end: week_start + Duration::days(6),
        days,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRollup {
    pub week: String,
    pub completed: i64,
    pub total: i64,
    pub productivity_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub month_start: NaiveDate,
    pub weeks: Vec<WeeklyRollup>,
}

/// Roll the month up into consecutive 7-day chunks from its first day
/// (the last chunk may be shorter), each with summed counts and a
/// productivity percentage.
pub fn build_monthly_report(month_start: NaiveDate, stats: &[DailyStat]) -> MonthlyReport {
    let month_end = month_end_of(month_start);
    let mut weeks = Vec::new();
    let mut week_start = month_start;
    let mut week_num = 1;

    while week_start < month_end {
        let week_end = std::cmp::min(week_start + Duration::days(7), month_end);
        let in_week = stats
            .iter()
            .filter(|s| s.date >= week_start && s.date < week_end);
        let (completed, total) = in_week.fold((0, 0), |(c, t), s| (c + s.completed, t + s.total));

        weeks.push(WeeklyRollup {
            week: format!("Week {}", week_num),
            completed,
            total,
            productivity_percentage: percentage(completed, total),
        });

        week_start = week_end;
        week_num += 1;
    }

    MonthlyReport { month_start, weeks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log(day: NaiveDate, content: &str, hours: Option<f64>) -> DailyLog {
        DailyLog {
            id: 0,
            log_date: day,
            content: content.to_string(),
            hours_spent: hours,
        }
    }

    #[test]
    fn empty_distribution_has_zero_productivity() {
        let summary = build_summary(&HashMap::new(), &[]);
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.productivity_percentage, 0.0);
        assert!(summary.recent_activity.is_empty());
    }

    #[test]
    fn productivity_rounds_to_one_decimal() {
        let mut dist = HashMap::new();
        dist.insert(TaskStatus::Completed, 1);
        dist.insert(TaskStatus::Pending, 2);
        let summary = build_summary(&dist, &[]);
        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.productivity_percentage, 33.3);
    }

    #[test]
    fn summary_carries_recent_activity() {
        let task = Task {
            id: 9,
            title: "Ship release".to_string(),
            description: String::new(),
            priority: Priority::High,
            status: TaskStatus::InProgress,
            category: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        };
        let mut dist = HashMap::new();
        dist.insert(TaskStatus::InProgress, 1);
        let summary = build_summary(&dist, &[task]);
        assert_eq!(summary.recent_activity.len(), 1);
        assert_eq!(summary.recent_activity[0].id, 9);
    }

    #[test]
    fn timesheet_covers_exactly_seven_days() {
        let start = date(2024, 1, 15); // a Monday
        let sheet = build_timesheet(start, &[], &[]);
        assert_eq!(sheet.days.len(), 7);
        assert_eq!(sheet.week_end, date(2024, 1, 21));
        assert_eq!(sheet.days[0].day_name, "Mon");
        assert_eq!(sheet.days[6].day_name, "Sun");
        assert_eq!(sheet.total_hours, 0.0);
    }

    #[test]
    fn timesheet_sums_only_recorded_hours() {
        let start = date(2024, 1, 15);
        let logs = vec![
            log(date(2024, 1, 15), "kickoff", Some(6.5)),
            log(date(2024, 1, 16), "", None),
            log(date(2024, 1, 18), "reviews", Some(2.0)),
        ];
        let stats = vec![DailyStat {
            date: date(2024, 1, 15),
            completed: 3,
            total: 5,
        }];
        let sheet = build_timesheet(start, &logs, &stats);

        assert_eq!(sheet.total_hours, 8.5);
        assert_eq!(sheet.days[0].tasks_completed, 3);
        assert_eq!(sheet.days[0].log_content.as_deref(), Some("kickoff"));
        // empty content renders as no log text
        assert_eq!(sheet.days[1].log_content, None);
        assert_eq!(sheet.days[2].hours_spent, None);
    }

    #[test]
    fn weekly_report_fills_empty_days_with_zeroes() {
        let start = date(2024, 1, 15); // a Monday
        let stats = vec![
            DailyStat {
                date: date(2024, 1, 16),
                completed: 2,
                total: 3,
            },
            // outside the week, ignored
            DailyStat {
                date: date(2024, 1, 22),
                completed: 9,
                total: 9,
            },
        ];
        let report = build_weekly_report(start, &stats);

        assert_eq!(report.days.len(), 7);
        assert_eq!(report.week_end, date(2024, 1, 21));
        assert_eq!(report.days[0].total, 0);
        assert_eq!(report.days[1].day_name, "Tue");
        assert_eq!(report.days[1].completed, 2);
        assert_eq!(report.days[1].total, 3);
        assert!(report.days[2..].iter().all(|d| d.total == 0));
    }

    #[test]
    fn monthly_report_rolls_up_seven_day_chunks() {
        // January has 31 days: four full weeks plus a 3-day tail.
        let start = date(2024, 1, 1);
        let stats = vec![
            DailyStat {
                date: date(2024, 1, 3),
                completed: 1,
                total: 4,
            },
            DailyStat {
                date: date(2024, 1, 10),
                completed: 3,
                total: 3,
            },
            DailyStat {
                date: date(2024, 1, 30),
                completed: 0,
                total: 2,
            },
        ];
        let report = build_monthly_report(start, &stats);

        assert_eq!(report.weeks.len(), 5);
        assert_eq!(report.weeks[0].week, "Week 1");
        assert_eq!(report.weeks[0].completed, 1);
        assert_eq!(report.weeks[0].total, 4);
        assert_eq!(report.weeks[0].productivity_percentage, 25.0);
        assert_eq!(report.weeks[1].total, 3);
        assert_eq!(report.weeks[1].productivity_percentage, 100.0);
        // empty week reports zero productivity
        assert_eq!(report.weeks[2].total, 0);
        assert_eq!(report.weeks[2].productivity_percentage, 0.0);
        assert_eq!(report.weeks[4].total, 2);
    }

    #[test]
    fn month_bounds_handle_year_rollover() {
        assert_eq!(month_start_of(date(2024, 12, 25)), date(2024, 12, 1));
        assert_eq!(month_end_of(date(2024, 12, 1)), date(2025, 1, 1));
        assert_eq!(month_end_of(date(2024, 2, 1)), date(2024, 3, 1));
    }

    #[test]
    fn week_start_is_monday() {
        assert_eq!(week_start_of(date(2024, 1, 15)), date(2024, 1, 15)); // Mon
        assert_eq!(week_start_of(date(2024, 1, 18)), date(2024, 1, 15)); // Thu
        assert_eq!(week_start_of(date(2024, 1, 21)), date(2024, 1, 15)); // Sun
    }
}
