//! Tmux driver for tmux-compose.
//!
//! The engine talks to tmux only through the [`Multiplexer`] trait. Two
//! implementations ship here:
//!
//! - [`Tmux`]: runs each command against the tmux server
//! - [`DryRun`]: answers read-only queries from tmux but prints mutating
//!   commands instead of executing them
//!
//! # Submodules
//!
//! - [`commands`]: Low-level tmux command builders (NewSession, SplitWindow, etc.)

mod commands;

use std::io::Write;

use anyhow::{Context, Result};

pub use commands::*;

use crate::{config::Split, target::Target};

/// Information about a running tmux session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session name
    pub name: String,
    /// Number of windows
    pub windows: u32,
    /// Creation time (Unix timestamp)
    pub created: i64,
    /// Whether clients are attached
    pub attached: bool,
}

/// Imperative operations against a terminal multiplexer
///
/// Calls are observed by the backend in the order they are made; callers
/// must not reorder or overlap them.
pub trait Multiplexer {
    /// Whether a session with exactly this name exists
    fn has_session(&self, name: &str) -> Result<bool>;

    /// Create a detached session together with its first window
    fn new_session(&self, session: &str, window: &str, start_dir: Option<&str>) -> Result<()>;

    /// Append a named window to a session
    fn new_window(&self, session: &str, window: &str, start_dir: Option<&str>) -> Result<()>;

    /// Split the pane at `target`; the new pane becomes active
    fn split_window(&self, target: &Target, split: Split, start_dir: Option<&str>) -> Result<()>;

    /// Tmux index of the active pane at `target`
    fn pane_index(&self, target: &Target) -> Result<usize>;

    /// Type `keys` into the pane at `target` and press Enter
    fn send_keys(&self, target: &Target, keys: &str) -> Result<()>;

    /// Make the pane at `target` active
    fn select_pane(&self, target: &Target) -> Result<()>;

    /// Make the window at `target` current
    fn select_window(&self, target: &Target) -> Result<()>;

    /// Apply a named layout to the window at `target`
    fn select_layout(&self, target: &Target, layout: &str) -> Result<()>;

    /// Destroy a session with all its windows and panes
    fn kill_session(&self, name: &str) -> Result<()>;

    /// All running sessions
    fn list_sessions(&self) -> Result<Vec<SessionInfo>>;
}

/// Check that the tmux binary can be executed
pub fn tmux_available() -> bool {
    version().status().unwrap_or(false)
}

/// Parse `list-sessions` output rendered with [`LIST_SESSIONS_FORMAT`]
pub fn parse_sessions(stdout: &str) -> Vec<SessionInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 4 {
                return None;
            }
            Some(SessionInfo {
                name: parts[0].to_string(),
                windows: parts[1].parse().unwrap_or(0),
                created: parts[2].parse().unwrap_or(0),
                attached: parts[3] != "0",
            })
        })
        .collect()
}

/// Parse a single index printed by tmux
pub fn parse_index(stdout: &str) -> Result<usize> {
    let value = stdout.trim();
    value
        .parse()
        .with_context(|| format!("Unexpected pane index from tmux: {:?}", value))
}

// =============================================================================
// Tmux
// =============================================================================

/// Driver that executes commands against the tmux server
#[derive(Debug, Default, Clone, Copy)]
pub struct Tmux;

impl Multiplexer for Tmux {
    fn has_session(&self, name: &str) -> Result<bool> {
        has_session(name).status()
    }

    fn new_session(&self, session: &str, window: &str, start_dir: Option<&str>) -> Result<()> {
        NewSession::new()
            .name(session)
            .detached()
            .window_name(window)
            .start_directory(start_dir)
            .build()
            .run()
    }

    fn new_window(&self, session: &str, window: &str, start_dir: Option<&str>) -> Result<()> {
        NewWindow::new()
            .session(session)
            .name(window)
            .start_directory(start_dir)
            .build()
            .run()
    }

    fn split_window(&self, target: &Target, split: Split, start_dir: Option<&str>) -> Result<()> {
        SplitWindow::new()
            .target(target)
            .direction(split)
            .start_directory(start_dir)
            .build()
            .run()
    }

    fn pane_index(&self, target: &Target) -> Result<usize> {
        let cmd = pane_index(target);
        let output = cmd.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("`{}` failed: {}", cmd, stderr.trim());
        }
        parse_index(&String::from_utf8_lossy(&output.stdout))
    }

    fn send_keys(&self, target: &Target, keys: &str) -> Result<()> {
        send_keys(target, keys).run()
    }

    fn select_pane(&self, target: &Target) -> Result<()> {
        select_pane(target).run()
    }

    fn select_window(&self, target: &Target) -> Result<()> {
        select_window(target).run()
    }

    fn select_layout(&self, target: &Target, layout: &str) -> Result<()> {
        select_layout(target, layout).run()
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        kill_session(name).run()
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let output = list_sessions().output()?;
        if !output.status.success() {
            // No server running means no sessions
            return Ok(Vec::new());
        }
        Ok(parse_sessions(&String::from_utf8_lossy(&output.stdout)))
    }
}

// =============================================================================
// Dry Run
// =============================================================================

/// Driver that prints mutating commands instead of running them
///
/// Existence checks still query tmux, so the printed plan reflects which
/// sessions would be skipped.
pub struct DryRun<W: Write> {
    out: std::cell::RefCell<W>,
}

impl<W: Write> DryRun<W> {
    /// Print commands to `out`
    pub fn new(out: W) -> Self {
        Self {
            out: std::cell::RefCell::new(out),
        }
    }

    fn print(&self, cmd: TmuxCommand) -> Result<()> {
        writeln!(self.out.borrow_mut(), "{}", cmd)?;
        Ok(())
    }
}

impl<W: Write> Multiplexer for DryRun<W> {
    fn has_session(&self, name: &str) -> Result<bool> {
        Tmux.has_session(name)
    }

    fn new_session(&self, session: &str, window: &str, start_dir: Option<&str>) -> Result<()> {
        self.print(
            NewSession::new()
                .name(session)
                .detached()
                .window_name(window)
                .start_directory(start_dir)
                .build(),
        )
    }

    fn new_window(&self, session: &str, window: &str, start_dir: Option<&str>) -> Result<()> {
        self.print(
            NewWindow::new()
                .session(session)
                .name(window)
                .start_directory(start_dir)
                .build(),
        )
    }

    fn split_window(&self, target: &Target, split: Split, start_dir: Option<&str>) -> Result<()> {
        self.print(
            SplitWindow::new()
                .target(target)
                .direction(split)
                .start_directory(start_dir)
                .build(),
        )
    }

    // The window was never created, so fall back to the global option
    fn pane_index(&self, _target: &Target) -> Result<usize> {
        match pane_base_index().output() {
            Ok(output) if output.status.success() => {
                Ok(parse_index(&String::from_utf8_lossy(&output.stdout)).unwrap_or(0))
            }
            _ => Ok(0),
        }
    }

    fn send_keys(&self, target: &Target, keys: &str) -> Result<()> {
        self.print(send_keys(target, keys))
    }

    fn select_pane(&self, target: &Target) -> Result<()> {
        self.print(select_pane(target))
    }

    fn select_window(&self, target: &Target) -> Result<()> {
        self.print(select_window(target))
    }

    fn select_layout(&self, target: &Target, layout: &str) -> Result<()> {
        self.print(select_layout(target, layout))
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        self.print(kill_session(name))
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        Tmux.list_sessions()
    }
}
