//! Reconciliation engine.
//!
//! Walks the declared sessions, windows and panes and drives a
//! [`Multiplexer`] to build (`up`) or tear down (`down`) that state.
//!
//! # Ordering
//!
//! Tmux addresses windows and panes by positions that shift as commands
//! run: a session is born with exactly one window, a split makes the new pane
//! active, and the window name alone resolves to whichever pane is active.
//! The engine therefore issues one call at a time, in declared order, and
//! keeps a [`PaneCursor`] per window instead of asking tmux where it is.
//!
//! # Failure policy
//!
//! Session creation, window creation, the base pane lookup, splits,
//! keystrokes and the final window selection are critical: if one fails the session is abandoned,
//! the half-built session is killed, and the engine moves on to the next
//! session. Reselecting the base pane and applying a layout are best-effort
//! and only produce warnings.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::{
    config::{ComposeConfig, ResolvedWindow, SessionConfig},
    report::{self, Report, SessionOutcome, SessionStatus},
    target::{PaneCursor, Target},
    tmux::Multiplexer,
};

/// Pause before applying a layout, letting tmux finish sizing new panes
pub const LAYOUT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Drives a [`Multiplexer`] towards the state declared in a compose file
pub struct Engine<'a, M: Multiplexer + ?Sized> {
    mux: &'a M,
    settle_delay: Duration,
}

impl<'a, M: Multiplexer + ?Sized> Engine<'a, M> {
    /// Create an engine over `mux`
    pub fn new(mux: &'a M) -> Self {
        Self {
            mux,
            settle_delay: LAYOUT_SETTLE_DELAY,
        }
    }

    /// Override the pause before layout application
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    // =========================================================================
    // up
    // =========================================================================

    /// Create every declared session that is not already running
    pub fn up(&self, config: &ComposeConfig) -> Report {
        let mut report = Report::default();
        for session in &config.sessions {
            let outcome = self.up_session(session);
            report::print_outcome(&outcome);
            report.sessions.push(outcome);
        }
        report
    }

    fn up_session(&self, session: &SessionConfig) -> SessionOutcome {
        let name = session.name.as_str();
        let mut warnings = Vec::new();

        let status = match self.mux.has_session(name) {
            Ok(true) => SessionStatus::Skipped("already running".to_string()),
            Ok(false) => match self.create_session(session, &mut warnings) {
                Ok(()) => SessionStatus::Created,
                Err(err) => SessionStatus::Failed(format!("{:#}", err)),
            },
            Err(err) => SessionStatus::Failed(format!("{:#}", err)),
        };

        SessionOutcome {
            name: name.to_string(),
            status,
            warnings,
        }
    }

    fn create_session(&self, session: &SessionConfig, warnings: &mut Vec<String>) -> Result<()> {
        let name = session.name.as_str();
        let windows = session.resolve_windows();
        let Some((first, rest)) = windows.split_first() else {
            anyhow::bail!("No windows resolved");
        };

        // The session's only window at birth is the first declared one
        self.mux
            .new_session(name, &first.name, first.root.as_deref())
            .context("Failed to create session")?;

        if let Err(err) = self.populate_session(name, first, rest, warnings) {
            if let Err(kill_err) = self.mux.kill_session(name) {
                self.warning(
                    warnings,
                    format!("{}: could not remove partial session: {:#}", name, kill_err),
                );
            }
            return Err(err);
        }

        Ok(())
    }

    fn populate_session(
        &self,
        session: &str,
        first: &ResolvedWindow,
        rest: &[ResolvedWindow],
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        self.send_window_command(session, first)?;
        self.reconcile_panes(session, first, warnings)?;

        for window in rest {
            self.mux
                .new_window(session, &window.name, window.root.as_deref())
                .with_context(|| format!("Failed to create window '{}'", window.name))?;
            self.send_window_command(session, window)?;
            self.reconcile_panes(session, window, warnings)?;
        }

        self.mux
            .select_window(&Target::first_window(session))
            .context("Failed to select first window")
    }

    fn send_window_command(&self, session: &str, window: &ResolvedWindow) -> Result<()> {
        let Some(command) = &window.command else {
            return Ok(());
        };
        // No split has happened yet, so the name reaches the base pane
        self.mux
            .send_keys(&Target::window(session, &window.name), command)
            .with_context(|| format!("Failed to send command to window '{}'", window.name))
    }

    /// Create a window's panes in order, then lay them out
    fn reconcile_panes(
        &self,
        session: &str,
        window: &ResolvedWindow,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        if window.panes.is_empty() {
            return Ok(());
        }

        // Pane numbering follows `pane-base-index`, so ask where the base pane sits
        let base_index = self
            .mux
            .pane_index(&Target::window(session, &window.name))
            .with_context(|| format!("Failed to query panes of window '{}'", window.name))?;
        let mut cursor = PaneCursor::new(session, &window.name, base_index);

        for (index, pane) in window.panes.iter().enumerate() {
            if index > 0 {
                self.mux
                    .split_window(&cursor.split_target(), pane.split, window.root.as_deref())
                    .with_context(|| {
                        format!("Failed to split pane {} in window '{}'", index, window.name)
                    })?;
                cursor.record_split();
            }

            if let Some(command) = &pane.command {
                self.mux
                    .send_keys(&cursor.target(index), command)
                    .with_context(|| {
                        format!(
                            "Failed to send command to pane {} in window '{}'",
                            index, window.name
                        )
                    })?;
            }
        }

        if let Some(layout) = window.effective_layout() {
            self.apply_layout(session, window, layout, &mut cursor, warnings);
        }

        Ok(())
    }

    fn apply_layout(
        &self,
        session: &str,
        window: &ResolvedWindow,
        layout: &str,
        cursor: &mut PaneCursor,
        warnings: &mut Vec<String>,
    ) {
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }

        match self.mux.select_pane(&cursor.target(0)) {
            Ok(()) => cursor.record_select(0),
            Err(err) => self.warning(
                warnings,
                format!(
                    "{}:{}: could not select base pane: {:#}",
                    session, window.name, err
                ),
            ),
        }

        if let Err(err) = self
            .mux
            .select_layout(&Target::window(session, &window.name), layout)
        {
            self.warning(
                warnings,
                format!(
                    "{}:{}: could not apply layout '{}': {:#}",
                    session, window.name, layout, err
                ),
            );
        }
    }

    // =========================================================================
    // down
    // =========================================================================

    /// Kill every declared session that is running
    pub fn down(&self, config: &ComposeConfig) -> Report {
        let mut report = Report::default();
        for session in &config.sessions {
            let outcome = self.down_session(&session.name);
            report::print_outcome(&outcome);
            report.sessions.push(outcome);
        }
        report
    }

    fn down_session(&self, name: &str) -> SessionOutcome {
        let status = match self.mux.has_session(name) {
            Ok(false) => SessionStatus::Skipped("not running".to_string()),
            Ok(true) => match self.mux.kill_session(name) {
                Ok(()) => SessionStatus::Destroyed,
                Err(err) => SessionStatus::Failed(format!("{:#}", err)),
            },
            Err(err) => SessionStatus::Failed(format!("{:#}", err)),
        };

        SessionOutcome {
            name: name.to_string(),
            status,
            warnings: Vec::new(),
        }
    }

    fn warning(&self, warnings: &mut Vec<String>, message: String) {
        report::warn(&message);
        warnings.push(message);
    }
}

// =============================================================================
// Tests
// =============================================================================
