//! Low-level tmux command wrappers
//!
//! Builders render a [`TmuxCommand`], which can be executed or printed. The
//! same rendering feeds both the real driver and dry runs.

use std::{
    fmt,
    process::{Command, Output, Stdio},
};

use anyhow::{Context, Result};

use crate::{config::Split, target::Target};

/// Name of the tmux binary
pub const TMUX: &str = "tmux";

/// A fully rendered tmux invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxCommand {
    args: Vec<String>,
}

impl TmuxCommand {
    /// Start a command with the given tmux subcommand
    pub fn new(subcommand: &str) -> Self {
        Self {
            args: vec![subcommand.to_string()],
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn opt(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Arguments passed to tmux, subcommand first
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Execute and return the raw output
    pub fn output(&self) -> Result<Output> {
        Command::new(TMUX)
            .args(&self.args)
            .output()
            .context("Failed to execute tmux command")
    }

    /// Execute and report whether it succeeded (suppressing stderr)
    pub fn status(&self) -> Result<bool> {
        Ok(Command::new(TMUX)
            .args(&self.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("Failed to execute tmux command")?
            .success())
    }

    /// Execute, returning an error carrying tmux's stderr if it fails
    pub fn run(&self) -> Result<()> {
        let output = self.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("`{}` failed: {}", self, stderr.trim());
        }
        Ok(())
    }
}

impl fmt::Display for TmuxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", TMUX)?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Quote an argument for display as a shell word
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=^@%+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Exact-match session target, so `dev` never resolves to `devtools`
fn exact(session: &str) -> String {
    format!("={}", session)
}

// =============================================================================
// Session Commands
// =============================================================================

/// Check if a tmux session exists
pub fn has_session(name: &str) -> TmuxCommand {
    TmuxCommand::new("has-session").opt("-t", exact(name))
}

/// Kill a tmux session
pub fn kill_session(name: &str) -> TmuxCommand {
    TmuxCommand::new("kill-session").opt("-t", exact(name))
}

/// Format string for `list-sessions`, tab separated
pub const LIST_SESSIONS_FORMAT: &str =
    "#{session_name}\t#{session_windows}\t#{session_created}\t#{session_attached}";

/// List all tmux sessions
pub fn list_sessions() -> TmuxCommand {
    TmuxCommand::new("list-sessions").opt("-F", LIST_SESSIONS_FORMAT)
}

/// Builder for creating new tmux sessions
#[derive(Default)]
pub struct NewSession<'a> {
    name: Option<&'a str>,
    detached: bool,
    start_dir: Option<&'a str>,
    window_name: Option<&'a str>,
}

impl<'a> NewSession<'a> {
    /// Create a new session builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session name
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Start the session detached
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Set the starting directory
    pub fn start_directory(mut self, dir: Option<&'a str>) -> Self {
        self.start_dir = dir;
        self
    }

    /// Set the initial window name
    pub fn window_name(mut self, name: &'a str) -> Self {
        self.window_name = Some(name);
        self
    }

    /// Render the new-session command
    pub fn build(self) -> TmuxCommand {
        let mut cmd = TmuxCommand::new("new-session");

        if self.detached {
            cmd = cmd.arg("-d");
        }
        if let Some(name) = self.name {
            cmd = cmd.opt("-s", name);
        }
        if let Some(name) = self.window_name {
            cmd = cmd.opt("-n", name);
        }
        if let Some(dir) = self.start_dir {
            cmd = cmd.opt("-c", dir);
        }

        cmd
    }
}

// =============================================================================
// Window Commands
// =============================================================================

/// Builder for appending a window to a session
#[derive(Default)]
pub struct NewWindow<'a> {
    session: Option<&'a str>,
    name: Option<&'a str>,
    start_dir: Option<&'a str>,
}

impl<'a> NewWindow<'a> {
    /// Create a new window builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Session the window is appended to
    pub fn session(mut self, session: &'a str) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the window name
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the starting directory
    pub fn start_directory(mut self, dir: Option<&'a str>) -> Self {
        self.start_dir = dir;
        self
    }

    /// Render the new-window command
    pub fn build(self) -> TmuxCommand {
        let mut cmd = TmuxCommand::new("new-window");

        // A bare session target makes tmux append at the next free index
        if let Some(session) = self.session {
            cmd = cmd.opt("-t", format!("{}:", session));
        }
        if let Some(name) = self.name {
            cmd = cmd.opt("-n", name);
        }
        if let Some(dir) = self.start_dir {
            cmd = cmd.opt("-c", dir);
        }

        cmd
    }
}

/// Select a window
pub fn select_window(target: &Target) -> TmuxCommand {
    TmuxCommand::new("select-window").opt("-t", target.to_string())
}

/// Apply a named layout to a window
pub fn select_layout(target: &Target, layout: &str) -> TmuxCommand {
    TmuxCommand::new("select-layout")
        .opt("-t", target.to_string())
        .arg(layout)
}

// =============================================================================
// Pane Commands
// =============================================================================

/// Builder for splitting windows
#[derive(Default)]
pub struct SplitWindow<'a> {
    target: Option<&'a Target>,
    direction: Option<Split>,
    start_dir: Option<&'a str>,
}

impl<'a> SplitWindow<'a> {
    /// Create a new split window builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target pane
    pub fn target(mut self, target: &'a Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the split orientation
    pub fn direction(mut self, split: Split) -> Self {
        self.direction = Some(split);
        self
    }

    /// Set the starting directory
    pub fn start_directory(mut self, dir: Option<&'a str>) -> Self {
        self.start_dir = dir;
        self
    }

    /// Render the split-window command
    pub fn build(self) -> TmuxCommand {
        let mut cmd = TmuxCommand::new("split-window");

        if let Some(target) = self.target {
            cmd = cmd.opt("-t", target.to_string());
        }

        match self.direction {
            Some(Split::Horizontal) => cmd = cmd.arg("-h"),
            Some(Split::Vertical) => cmd = cmd.arg("-v"),
            None => {}
        }

        if let Some(dir) = self.start_dir {
            cmd = cmd.opt("-c", dir);
        }

        cmd
    }
}

/// Select a pane
pub fn select_pane(target: &Target) -> TmuxCommand {
    TmuxCommand::new("select-pane").opt("-t", target.to_string())
}

/// Print the index of the active pane at `target`
pub fn pane_index(target: &Target) -> TmuxCommand {
    TmuxCommand::new("display-message")
        .arg("-p")
        .opt("-t", target.to_string())
        .arg("#{pane_index}")
}

/// Print the global `pane-base-index` window option
pub fn pane_base_index() -> TmuxCommand {
    TmuxCommand::new("show-options")
        .arg("-gwv")
        .arg("pane-base-index")
}

/// Type keys into a pane, then press Enter
pub fn send_keys(target: &Target, keys: &str) -> TmuxCommand {
    TmuxCommand::new("send-keys")
        .opt("-t", target.to_string())
        .arg(keys)
        .arg("Enter")
}

/// Print the tmux version; used as a presence check
pub fn version() -> TmuxCommand {
    TmuxCommand::new("-V")
}
