//! todo-web
//!
//! Sweeps old todos, prints the current list as a table, then serves the
//! web UI until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use todo_web::cli::{Cli, Command};
use todo_web::config::Config;
use todo_web::db::Database;
use todo_web::render::print_table;
use todo_web::service::TodoService;
use todo_web::web::{self, AppState, templates::Templates};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Install the global tracing subscriber selected by `--log`.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)
                .with_context(|| format!("failed to open log file {}", filename))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let (mut config, config_path) = Config::discover(cli.config.as_deref())?;
    if let Some(path) = &config_path {
        info!(path = %path.display(), "Loaded config file");
    }

    // Override from CLI arguments
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // No degraded mode: a database that cannot be opened ends the process.
    let db = Database::open(&config.server.db_path)
        .with_context(|| format!("opening {}", config.server.db_path.display()))?;
    let retention = config.server.retention()?;
    let service = TodoService::new(Arc::new(db)).with_retention(retention);

    match cli.command.unwrap_or(Command::Serve) {
        Command::List => {
            print_table(&service.list()?);
        }
        Command::Serve => {
            if let Err(e) = service.cleanup_old_todos() {
                error!(code = e.code(), error = %e, "Retention sweep failed");
            }
            print_table(&service.list()?);
            run_server(config, service).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Config, service: TodoService<Database>) -> Result<()> {
    let templates = Templates::load(&config.server.templates_dir)
        .context("failed to load index template")?;
    let state = AppState::new(service, templates);

    let (addr, server) = web::start_server(
        state,
        &config.server.static_dir,
        &config.bind_addr(),
        shutdown_signal(),
    )
    .await
    .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    println!("🌐 Server running at http://{}", addr);

    server.await?.context("server error")?;
    Ok(())
}
