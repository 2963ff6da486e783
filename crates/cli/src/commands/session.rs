//! Session commands for tmux-compose.
//!
//! This module handles the tmux session lifecycle:
//! - Creating the sessions declared in a compose file (`up`)
//! - Killing them again (`down`)
//! - Listing running sessions (`ls`)

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tmux_compose_core::{
    ComposeConfig, DryRun, Engine, Multiplexer, Report, SessionInfo, SessionStatus, Tmux,
    config::load_config, report,
};

// =============================================================================
// Reconciliation
// =============================================================================

/// Driver for the current run: tmux itself, or a printer for `--dry-run`
fn driver(dry_run: bool) -> Box<dyn Multiplexer> {
    if dry_run {
        Box::new(DryRun::new(std::io::stdout()))
    } else {
        Box::new(Tmux)
    }
}

/// Create every session declared in the compose file.
pub fn do_up(config_path: &Path, dry_run: bool) -> Result<Report> {
    let config = load_config(config_path)?;
    warn_if_empty(&config);
    let mux = driver(dry_run);
    let report = Engine::new(mux.as_ref()).up(&config);
    print_summary(&report, "created", |s| matches!(s, SessionStatus::Created));
    Ok(report)
}

/// Kill every declared session that is running.
pub fn do_down(config_path: &Path, dry_run: bool) -> Result<Report> {
    let config = load_config(config_path)?;
    warn_if_empty(&config);
    let mux = driver(dry_run);
    let report = Engine::new(mux.as_ref()).down(&config);
    print_summary(&report, "killed", |s| matches!(s, SessionStatus::Destroyed));
    Ok(report)
}

fn warn_if_empty(config: &ComposeConfig) {
    if !config.sessions.is_empty() {
        return;
    }
    match &config.path {
        Some(path) => report::warn(&format!("No sessions declared in {}", path.display())),
        None => report::warn("No sessions declared"),
    }
}

fn print_summary(report: &Report, verb: &str, done: impl Fn(&SessionStatus) -> bool) {
    if report.sessions.len() < 2 {
        return;
    }
    let done = report.count(done);
    let skipped = report.count(|s| matches!(s, SessionStatus::Skipped(_)));
    let failed = report.count(|s| matches!(s, SessionStatus::Failed(_)));

    let mark = if failed > 0 { "✘".red() } else { "✔".green() };
    eprintln!(
        "{} {}",
        mark,
        format!("{} {}, {} skipped, {} failed", done, verb, skipped, failed).dimmed()
    );
}

// =============================================================================
// Session Listing
// =============================================================================

/// JSON output format for a running session
#[derive(Serialize)]
pub struct SessionRow {
    /// Session name
    pub name: String,
    /// Number of windows
    pub windows: u32,
    /// Creation time (Unix timestamp)
    pub created: i64,
    /// Whether clients are attached
    pub attached: bool,
}

impl From<&SessionInfo> for SessionRow {
    fn from(info: &SessionInfo) -> Self {
        SessionRow {
            name: info.name.clone(),
            windows: info.windows,
            created: info.created,
            attached: info.attached,
        }
    }
}

/// List running tmux sessions.
pub fn do_list_sessions(json: bool) -> Result<()> {
    let sessions = Tmux.list_sessions()?;

    if json {
        let rows: Vec<SessionRow> = sessions.iter().map(SessionRow::from).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("{}", "No tmux sessions running".dimmed());
        return Ok(());
    }

    use comfy_table::{Table, presets::NOTHING};

    let mut table = Table::new();
    table.load_preset(NOTHING);

    for session in &sessions {
        let attached = if session.attached {
            "(attached)".green().to_string()
        } else {
            String::new()
        };

        let windows_label = if session.windows == 1 {
            "window"
        } else {
            "windows"
        };
        table.add_row(vec![
            session.name.blue().to_string(),
            format!("{} {}", session.windows, windows_label)
                .dimmed()
                .to_string(),
            format_created(session.created).dimmed().to_string(),
            attached,
        ]);
    }

    println!("{table}");

    Ok(())
}

/// Render a Unix timestamp in local time
fn format_created(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
