//! Subcommand runners.
//!
//! Each runner acts on a [`Workspace`] restored from the persisted session
//! and returns the text to print.

use super::{BoardArgs, CalendarArgs, LoginArgs, OutputArgs, ProjectArgs, TasksArgs};
use crate::auth::AuthGate;
use crate::config::Config;
use crate::fixtures::Fixtures;
use crate::format::{self, OutputFormat};
use crate::query::{BoardFilter, TaskFilter, TaskSort};
use crate::session::FileSessionStore;
use crate::store::RecordStore;
use crate::workspace::Workspace;
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Local};
use serde_json::json;
use tracing::info;

/// Seed a workspace and auth gate from config and restore the session.
pub fn open_workspace(config: &Config) -> Result<(Workspace, AuthGate)> {
    let fixtures = Fixtures::load(config.fixtures.path.as_deref())
        .context("Failed to load fixture dataset")?;
    let (store, credentials) = RecordStore::seeded(fixtures);
    info!(
        users = store.users().len(),
        tasks = store.tasks().len(),
        "Record store seeded"
    );

    let sessions = FileSessionStore::new(&config.session.path);
    let mut workspace = Workspace::new(store, Box::new(sessions))
        .with_week_start(config.analytics.week_start);
    workspace.restore_session();

    let gate = AuthGate::new(credentials).with_login_delay(config.auth.login_delay());
    Ok((workspace, gate))
}

pub async fn run_login(workspace: &mut Workspace, gate: &AuthGate, args: &LoginArgs) -> Result<String> {
    let users = workspace.store().users().to_vec();
    let user = gate.login(&users, &args.email, &args.password).await?;
    let message = format!("Signed in as {} <{}>\n", user.name, user.email);
    workspace.sign_in(user);
    Ok(message)
}

pub fn run_logout(workspace: &mut Workspace) -> String {
    match workspace.current_user().map(|u| u.email.clone()) {
        Some(email) => {
            workspace.logout();
            format!("Signed out {}\n", email)
        }
        None => {
            workspace.logout();
            "Not signed in\n".to_string()
        }
    }
}

pub fn run_whoami(workspace: &Workspace) -> String {
    match workspace.current_user() {
        Some(user) => format::format_user_markdown(user),
        None => "Not signed in\n".to_string(),
    }
}

pub fn run_projects(workspace: &Workspace, args: &OutputArgs) -> Result<String> {
    let projects = workspace.visible_projects()?;
    let selected = workspace.selected_project().map(|p| p.id.as_str());
    Ok(match args.format {
        OutputFormat::Json => format::to_json(&json!({
            "selected": selected,
            "projects": projects,
        })),
        OutputFormat::Markdown => format::format_projects_markdown(&projects, selected),
    })
}

pub fn run_tasks(workspace: &mut Workspace, args: &TasksArgs) -> Result<String> {
    select_project(workspace, &args.project)?;
    let filter = TaskFilter {
        search: args.search.clone(),
        status: args.status,
        priority: args.priority,
        assignee_id: args.assignee.clone(),
    };
    let tasks = workspace.visible_tasks(&filter, TaskSort::new(args.sort, args.direction))?;
    Ok(match args.project.output.format {
        OutputFormat::Json => format::to_json(&tasks),
        OutputFormat::Markdown => format::format_tasks_markdown(&tasks),
    })
}

pub fn run_board(workspace: &mut Workspace, args: &BoardArgs) -> Result<String> {
    select_project(workspace, &args.project)?;
    let columns = workspace.board(BoardFilter {
        assignee_id: args.assignee.clone(),
        priority: args.priority,
    })?;
    Ok(match args.project.output.format {
        OutputFormat::Json => format::to_json(&columns),
        OutputFormat::Markdown => format::format_board_markdown(&columns),
    })
}

pub fn run_calendar(workspace: &mut Workspace, args: &CalendarArgs) -> Result<String> {
    select_project(workspace, &args.project)?;
    let today = Local::now().date_naive();
    let year = args.year.unwrap_or(today.year());
    let month = args.month.unwrap_or(today.month());
    let days = workspace
        .calendar(year, month, &Local)?
        .ok_or_else(|| anyhow!("No calendar for {}-{:02}: date out of range", year, month))?;
    Ok(match args.project.output.format {
        OutputFormat::Json => format::to_json(&days),
        OutputFormat::Markdown => format::format_calendar_markdown(&days),
    })
}

pub fn run_metrics(workspace: &mut Workspace, args: &ProjectArgs) -> Result<String> {
    select_project(workspace, args)?;
    let report = workspace.analytics(&Local::now())?;
    Ok(match args.output.format {
        OutputFormat::Json => format::to_json(&report),
        OutputFormat::Markdown => format::format_metrics_markdown(&report),
    })
}

fn select_project(workspace: &mut Workspace, args: &ProjectArgs) -> Result<()> {
    if let Some(ref project) = args.project {
        workspace.set_selected_project(Some(project))?;
    }
    Ok(())
}
