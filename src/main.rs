//! TaskFlow
//!
//! Task board server and CLI: an in-memory record store seeded from a
//! fixture dataset, a session-gated HTTP API, and read commands for the
//! list, board, calendar and analytics views.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use taskflow::auth::AuthGate;
use taskflow::cli::commands;
use taskflow::cli::{Cli, Command, ServeArgs};
use taskflow::config::{Config, ConfigLoader, ConfigPaths};
use taskflow::logging::{self, LogTarget};
use taskflow::server::{self, AppState};
use taskflow::workspace::Workspace;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(ref config_path) = cli.config {
        paths = paths.with_explicit(config_path);
    }
    let loader = ConfigLoader::load_with_paths(paths)?;
    if let Some(path) = loader.config_path() {
        info!("Using config file {}", path.display());
    }
    let mut config = loader.into_config();

    // CLI flags override config
    if let Some(ref fixtures) = cli.fixtures {
        config.fixtures.path = Some(PathBuf::from(fixtures));
    }
    if let Some(ref session) = cli.session {
        config.session.path = PathBuf::from(session);
    }

    let (mut workspace, gate) = commands::open_workspace(&config)?;

    let output = match cli.command {
        Some(Command::Serve(args)) => return run_server(config, args, workspace, gate).await,
        None => return run_server(config, ServeArgs::default(), workspace, gate).await,
        Some(Command::Login(args)) => commands::run_login(&mut workspace, &gate, &args).await?,
        Some(Command::Logout) => commands::run_logout(&mut workspace),
        Some(Command::Whoami) => commands::run_whoami(&workspace),
        Some(Command::Projects(args)) => commands::run_projects(&workspace, &args)?,
        Some(Command::Tasks(args)) => commands::run_tasks(&mut workspace, &args)?,
        Some(Command::Board(args)) => commands::run_board(&mut workspace, &args)?,
        Some(Command::Calendar(args)) => commands::run_calendar(&mut workspace, &args)?,
        Some(Command::Metrics(args)) => commands::run_metrics(&mut workspace, &args)?,
    };
    print!("{}", output);
    Ok(())
}

async fn run_server(
    mut config: Config,
    args: ServeArgs,
    workspace: Workspace,
    gate: AuthGate,
) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let handle = server::start_server(AppState::new(workspace, gate), &config.bind_addr()).await?;
    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");
    handle.shutdown().await;
    Ok(())
}
