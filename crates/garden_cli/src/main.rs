//! `garden` command-line entry point.
//!
//! # Responsibility
//! - Resolve flags and environment into a database path and logging setup.
//! - Dispatch subcommands to the core services.

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use log::info;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    info!(
        "event=cli_start module=cli status=ok version={} db={}",
        garden_core::core_version(),
        cli.db.display()
    );

    match cli.command {
        Command::Plant(command) => commands::plant(&cli.db, command, cli.json),
        Command::Care(command) => commands::care(&cli.db, command, cli.json),
        Command::Alerts(command) => commands::alerts(&cli.db, command, cli.json),
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let Some(dir) = cli.log_dir.as_deref() else {
        return Ok(());
    };
    let path = absolute(dir)?;
    let dir = path
        .to_str()
        .with_context(|| format!("log directory `{}` is not valid UTF-8", path.display()))?;
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| garden_core::default_log_level());
    garden_core::init_logging(level, dir)?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot resolve current directory")?;
    Ok(cwd.join(path))
}
