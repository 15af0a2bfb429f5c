use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// User profile id
    #[arg(long, default_value_t = 1, global = true)]
    pub user: i64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    Add {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high (default medium)
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by status: pending, in_progress or completed
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Change task status
    Status {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(value_name = "STATUS")]
        status: String,
    },
    /// Change task priority
    Priority {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(value_name = "PRIORITY")]
        priority: String,
    },
    /// Remove a task
    Remove {
        #[arg(value_name = "TITLE")]
        title: String,
    },
    /// Record the daily log for a date (default: today)
    Log {
        #[arg(value_name = "CONTENT")]
        content: String,
        /// Hours spent on the day
        #[arg(long)]
        hours: Option<f64>,
        /// Calendar date, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the daily log for a date (default: today)
    LogShow {
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the standup report
    Standup {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
        /// Override the clock, RFC 3339 (for inspecting past windows)
        #[arg(long)]
        now: Option<String>,
    },
    /// Add a note
    NoteAdd {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(value_name = "CONTENT")]
        content: Option<String>,
        /// Keep the note at the top of the list
        #[arg(long)]
        pin: bool,
    },
    /// List notes, pinned first
    NoteList,
    /// Remove a note
    NoteRemove {
        #[arg(value_name = "TITLE")]
        title: String,
    },
    /// Show the dashboard summary
    Dashboard,
    /// Per-day completed/total counts for a week
    ReportWeek {
        /// First day of the week, YYYY-MM-DD (default: this Monday)
        #[arg(long)]
        week_start: Option<String>,
    },
    /// Weekly rollups with productivity for a month
    ReportMonth {
        /// Month, YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Print the weekly timesheet
    Timesheet {
        /// First day of the week, YYYY-MM-DD (default: this Monday)
        #[arg(long)]
        week_start: Option<String>,
    },
    /// Show or set the standup trigger time (HH:MM)
    StandupTime {
        #[arg(value_name = "TIME")]
        time: Option<String>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
