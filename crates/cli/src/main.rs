//! tmux-compose CLI - declarative tmux workspaces.
//!
//! Reads a compose file describing sessions, windows and panes and makes tmux
//! match it:
//!
//! - `up`: create every declared session that is not already running
//! - `down`: kill every declared session that is running
//! - `ls`: list running tmux sessions
//!
//! The reconciliation logic and the tmux driver live in `tmux-compose-core`.

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Command};
use colored::Colorize;
use tmux_compose_core::tmux::tmux_available;

use crate::commands::session::{do_down, do_list_sessions, do_up};

/// Entry point for the tmux-compose CLI.
///
/// Startup checks run before any tmux command is issued: the command must be
/// known, tmux must be installed, and `up`/`down` need the compose file to
/// exist. Any failed check, and any session that fails to reconcile, makes
/// the process exit with status 1.
fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.help {
        Cli::command().print_help()?;
        std::process::exit(1);
    }

    let command = match cli.command.as_deref().map(str::parse::<Command>) {
        Some(Ok(command)) => command,
        Some(Err(err)) => usage_error(&err.to_string()),
        None => usage_error("No command given"),
    };

    if !tmux_available() {
        eprintln!("{} tmux is not installed or not in PATH", "✘".red());
        std::process::exit(1);
    }

    if command.needs_config() && !cli.file.exists() {
        eprintln!(
            "{} No compose file found at {}. Use {} to point at one.",
            "✘".red(),
            cli.file.display(),
            "-f FILE".blue()
        );
        std::process::exit(1);
    }

    let failed = match command {
        Command::Up => do_up(&cli.file, cli.dry_run).map(|report| report.has_failures()),
        Command::Down => do_down(&cli.file, cli.dry_run).map(|report| report.has_failures()),
        Command::Ls => do_list_sessions(cli.json).map(|()| false),
    };

    match failed {
        Ok(false) => Ok(()),
        Ok(true) => std::process::exit(1),
        Err(err) => {
            eprintln!("{}", error_line(&err));
            std::process::exit(1);
        }
    }
}

/// Render an error with its full cause chain on one line
fn error_line(err: &anyhow::Error) -> String {
    format!("{} {:#}", "✘".red(), err)
}

/// Report a usage problem, print help and exit
fn usage_error(message: &str) -> ! {
    eprintln!("{} {}", "✘".red(), message);
    eprintln!();
    Cli::command().print_help().ok();
    std::process::exit(1);
}
