//! CLI command definitions for taskflow.
//!
//! The main entry point is the [`Cli`] struct. Subcommands other than
//! `serve` act on the persisted session, so `login` once and the read
//! commands work as that user until `logout`.

pub mod commands;

use crate::format::OutputFormat;
use crate::query::{SortDirection, SortKey};
use crate::types::{TaskPriority, TaskStatus};
use clap::{Args, Parser, Subcommand};

/// TaskFlow task board server and CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Fixture dataset to seed from (YAML, or JSON by extension)
    #[arg(short, long, global = true)]
    pub fixtures: Option<String>,

    /// Session record file (overrides config)
    #[arg(short, long, global = true)]
    pub session: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default if no subcommand given)
    Serve(ServeArgs),

    /// Sign in and persist the session
    Login(LoginArgs),

    /// Sign out and remove the persisted session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List projects visible to the signed-in user
    Projects(OutputArgs),

    /// List, filter and sort tasks of a project
    Tasks(TasksArgs),

    /// Show a project's tasks as kanban columns
    Board(BoardArgs),

    /// Show a month of due dates
    Calendar(CalendarArgs),

    /// Show productivity analytics for the signed-in user
    Metrics(ProjectArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config, default: 31995)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,

    #[arg(short, long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Project to use instead of the default selection
    #[arg(long)]
    pub project: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Case-insensitive text matched against title and description
    #[arg(long, default_value = "")]
    pub search: String,

    #[arg(long, value_parser = parse_status)]
    pub status: Option<TaskStatus>,

    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<TaskPriority>,

    /// Assignee user id
    #[arg(long)]
    pub assignee: Option<String>,

    /// Sort key: due_date, priority, status, created, updated
    #[arg(long, value_parser = parse_sort_key, default_value = "due_date")]
    pub sort: SortKey,

    /// Sort direction: asc or desc
    #[arg(long, value_parser = parse_direction, default_value = "asc")]
    pub direction: SortDirection,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct BoardArgs {
    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<TaskPriority>,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct CalendarArgs {
    /// Defaults to the current year
    #[arg(long)]
    pub year: Option<i32>,

    /// 1-12, defaults to the current month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[command(flatten)]
    pub project: ProjectArgs,
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_str(s)
        .ok_or_else(|| format!("unknown status '{}' (todo, in_progress, review, done)", s))
}

fn parse_priority(s: &str) -> Result<TaskPriority, String> {
    TaskPriority::from_str(s)
        .ok_or_else(|| format!("unknown priority '{}' (low, medium, high, urgent)", s))
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    SortKey::from_str(s).ok_or_else(|| format!("unknown sort key '{}'", s))
}

fn parse_direction(s: &str) -> Result<SortDirection, String> {
    SortDirection::from_str(s).ok_or_else(|| format!("unknown direction '{}' (asc, desc)", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["taskflow"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn tasks_parses_filters_and_sort() {
        let cli = Cli::parse_from([
            "taskflow",
            "tasks",
            "--status",
            "in_progress",
            "--sort",
            "priority",
            "--direction",
            "desc",
            "--format",
            "json",
        ]);
        let Some(Command::Tasks(args)) = cli.command else {
            panic!("expected tasks command");
        };
        assert_eq!(args.status, Some(TaskStatus::InProgress));
        assert_eq!(args.sort, SortKey::Priority);
        assert_eq!(args.direction, SortDirection::Desc);
        assert_eq!(args.project.output.format, OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["taskflow", "tasks", "--status", "blocked"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["taskflow", "whoami", "--session", "/tmp/s.json", "-v"]);
        assert_eq!(cli.session.as_deref(), Some("/tmp/s.json"));
        assert!(cli.verbose);
    }
}
