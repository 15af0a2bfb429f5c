mod cli;
mod dashboard;
mod database;
mod matcher;
mod models;
mod standup;
mod store;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};
use dashboard::{DashboardSummary, Timesheet};
use database::Database;
use models::{Priority, Task, TaskStatus};
use standup::StandupReport;
use store::DailyLogStore;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let db = Database::new()?;
    let user = cli.user;

    match cli.command {
        Commands::Add {
            title,
            description,
            priority,
            category,
        } => {
            let priority = match priority.as_deref() {
                Some(p) => p.parse()?,
                None => Priority::Medium,
            };
            let task = db.create_task(
                user,
                &title,
                description.as_deref().unwrap_or(""),
                priority,
                category.as_deref().unwrap_or(""),
            )?;
            println!("Task '{}' created (id {})", task.title, task.id);
        }
        Commands::List { status } => {
            let status: Option<TaskStatus> = status.as_deref().map(str::parse).transpose()?;
            print_tasks(&db.list_tasks(user, status)?);
        }
        Commands::Status { title, status } => {
            let status: TaskStatus = status.parse()?;
            match resolve(&db, user, &title)? {
                Some((id, name)) => {
                    db.set_task_status(user, id, status)?;
                    println!("Task '{}' status updated to '{}'", name, status);
                }
                None => println!("Task '{}' not found.", title),
            }
        }
        Commands::Priority { title, priority } => {
            let priority: Priority = priority.parse()?;
            match resolve(&db, user, &title)? {
                Some((id, name)) => {
                    db.set_task_priority(user, id, priority)?;
                    println!("Task '{}' priority updated to '{}'", name, priority);
                }
                None => println!("Task '{}' not found.", title),
            }
        }
        Commands::Remove { title } => match resolve(&db, user, &title)? {
            Some((id, name)) => {
                db.remove_task(user, id)?;
                println!("Task '{}' removed", name);
            }
            None => println!("Task '{}' not found.", title),
        },
        Commands::Log {
            content,
            hours,
            date,
        } => {
            let date = parse_date_or_today(date.as_deref())?;
            let log = db.upsert_log(user, date, &content, hours)?;
            println!("Log saved for {}", log.log_date);
        }
        Commands::LogShow { date } => {
            let date = parse_date_or_today(date.as_deref())?;
            match db.log_by_date(user, date)? {
                Some(log) => {
                    match log.hours_spent {
                        Some(h) => println!("{} ({}h)", log.log_date, h),
                        None => println!("{}", log.log_date),
                    }
                    println!("{}", log.content);
                }
                None => println!("No log for {}", date),
            }
        }
        Commands::Standup { json, now } => {
            let now_utc = match now {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("invalid --now value '{}'", raw))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let standup_time = db.standup_time(user)?;
            let report = standup::compute_standup_report(&db, &db, user, standup_time, now_utc)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_standup(&report);
            }
        }
        Commands::NoteAdd {
            title,
            content,
            pin,
        } => {
            let note = db.create_note(user, &title, content.as_deref().unwrap_or(""), pin)?;
            println!("Note '{}' created (id {})", note.title, note.id);
        }
        Commands::NoteList => {
            print_notes(&db.list_notes(user)?);
        }
        Commands::NoteRemove { title } => {
            let titles = db.note_titles(user)?;
            match matcher::resolve_title(&title, &titles) {
                Some((id, name)) => {
                    db.remove_note(user, id)?;
                    println!("Note '{}' removed", name);
                }
                None => println!("Note '{}' not found.", title),
            }
        }
        Commands::Dashboard => {
            let distribution = db.status_distribution(user)?;
            let recent = db.recent_tasks(user, 5)?;
            print_dashboard(&dashboard::build_summary(&distribution, &recent));
        }
        Commands::ReportWeek { week_start } => {
            let start = match week_start.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => dashboard::week_start_of(standup::local_date_of(Utc::now())),
            };
            let stats = db.daily_stats(user, start, start + chrono::Duration::days(7))?;
            print_weekly_report(&dashboard::build_weekly_report(start, &stats));
        }
        Commands::ReportMonth { month } => {
            let start = match month.as_deref() {
                Some(raw) => parse_month(raw)?,
                None => dashboard::month_start_of(standup::local_date_of(Utc::now())),
            };
            let stats = db.daily_stats(user, start, dashboard::month_end_of(start))?;
            print_monthly_report(&dashboard::build_monthly_report(start, &stats));
        }
        Commands::Timesheet { week_start } => {
            let start = match week_start.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => dashboard::week_start_of(standup::local_date_of(Utc::now())),
            };
            let end = start + chrono::Duration::days(7);
            let logs = db.logs_in_range(user, start, end)?;
            let stats = db.daily_stats(user, start, end)?;
            print_timesheet(&dashboard::build_timesheet(start, &logs, &stats));
        }
        Commands::StandupTime { time } => match time {
            Some(raw) => {
                let parsed = database::parse_standup_time(&raw)?;
                db.set_standup_time(user, parsed)?;
                println!("Standup time set to {}", parsed.format("%H:%M"));
            }
            None => println!("Standup time: {}", db.standup_time(user)?.format("%H:%M")),
        },
        Commands::Completions { shell } => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "taskverse", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn resolve(db: &Database, user: i64, input: &str) -> Result<Option<(i64, String)>> {
    let titles = db.task_titles(user)?;
    Ok(matcher::resolve_title(input, &titles))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}': expected YYYY-MM-DD", raw))
}

fn parse_month(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .with_context(|| format!("invalid month '{}': expected YYYY-MM", raw))
}

fn parse_date_or_today(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => parse_date(raw),
        None => Ok(standup::local_date_of(Utc::now())),
    }
}

fn print_tasks(tasks: &[Task]) {
    println!("Tasks:");
    println!("------");
    for task in tasks {
        let category = if task.category.is_empty() {
            String::new()
        } else {
            format!(" [{}]", task.category)
        };
        println!(
            "{} | {} | priority: {} | status: {}{}",
            task.id, task.title, task.priority, task.status, category
        );
    }
}

fn print_section(label: &str, tasks: &[standup::StandupTask]) {
    println!("{}:", label);
    if tasks.is_empty() {
        println!("  (none)");
    }
    for task in tasks {
        let flag = match task.impediment_keyword {
            Some(keyword) => format!("  !! {}", keyword),
            None => String::new(),
        };
        println!(
            "  [{}/{}] {}{}",
            task.priority, task.status, task.title, flag
        );
    }
}

fn print_log(label: &str, content: &Option<String>, hours: Option<f64>) {
    match (content, hours) {
        (Some(content), Some(hours)) => println!("{}: {} ({}h)", label, content, hours),
        (Some(content), None) => println!("{}: {}", label, content),
        (None, _) => println!("{}: (no log)", label),
    }
}

fn print_standup(report: &StandupReport) {
    println!("Standup report (standup time {})", report.standup_time);
    println!(
        "Yesterday window: {} .. {}",
        report.previous_window_start, report.previous_window_end
    );
    println!(
        "Today window:     {} .. {}",
        report.reporting_window_start, report.reporting_window_end
    );
    println!();
    print_section("Yesterday", &report.yesterday_tasks);
    print_log("Yesterday log", &report.yesterday_log, report.yesterday_hours);
    println!();
    print_section("Today", &report.today_tasks);
    print_log("Today log", &report.today_log, report.today_hours);
    println!();
    print_section("Impediments", &report.impediments);
}

fn print_dashboard(summary: &DashboardSummary) {
    println!("Dashboard:");
    println!("----------");
    println!(
        "Tasks: {} total | {} completed | {} in progress | {} pending",
        summary.total_tasks,
        summary.completed_tasks,
        summary.in_progress_tasks,
        summary.pending_tasks
    );
    println!("Productivity: {}%", summary.productivity_percentage);
    println!("Recent activity:");
    if summary.recent_activity.is_empty() {
        println!("  (none)");
    }
    for item in &summary.recent_activity {
        println!("  {} | {} | {}", item.timestamp, item.title, item.status);
    }
}

fn print_notes(notes: &[models::Note]) {
    println!("Notes:");
    println!("------");
    for note in notes {
        let pin = if note.pinned { " *" } else { "" };
        if note.content.is_empty() {
            println!("{} | {}{}", note.id, note.title, pin);
        } else {
            println!("{} | {}{} | {}", note.id, note.title, pin, note.content);
        }
    }
}

fn print_weekly_report(report: &dashboard::WeeklyReport) {
    println!("Weekly report {} .. {}", report.week_start, report.week_end);
    println!("--------------------------------");
    for day in &report.days {
        println!(
            "{} {} | {} done / {} total",
            day.day_name, day.date, day.completed, day.total
        );
    }
}

fn print_monthly_report(report: &dashboard::MonthlyReport) {
    println!("Monthly report from {}", report.month_start);
    println!("--------------------------------");
    for week in &report.weeks {
        println!(
            "{} | {} done / {} total | {}%",
            week.week, week.completed, week.total, week.productivity_percentage
        );
    }
}

fn print_timesheet(sheet: &Timesheet) {
    println!("Timesheet {} .. {}", sheet.week_start, sheet.week_end);
    println!("--------------------------------");
    for day in &sheet.days {
        let hours = day
            .hours_spent
            .map(|h| format!("{}h", h))
            .unwrap_or_else(|| "-".to_string());
        let content = day.log_content.as_deref().unwrap_or("");
        println!(
            "{} {} | {:>5} | {} done | {}",
            day.day_name, day.date, hours, day.tasks_completed, content
        );
    }
    println!("Total hours: {}", sheet.total_hours);
}
