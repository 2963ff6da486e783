//! Outcomes of a reconciliation run and the status lines printed for them.

use std::fmt;

use colored::Colorize;

/// What happened to one declared session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// `up` built the session
    Created,
    /// `down` killed the session
    Destroyed,
    /// Nothing to do; the reason is shown to the user
    Skipped(String),
    /// A critical step failed and the session was abandoned
    Failed(String),
}

/// Outcome for a single session, with any non-fatal warnings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub name: String,
    pub status: SessionStatus,
    pub warnings: Vec<String>,
}

/// Outcomes for every session in a compose file, in declared order
#[derive(Debug, Default)]
pub struct Report {
    pub sessions: Vec<SessionOutcome>,
}

impl Report {
    /// Whether any session failed
    pub fn has_failures(&self) -> bool {
        self.sessions
            .iter()
            .any(|s| matches!(s.status, SessionStatus::Failed(_)))
    }

    /// Number of sessions that ended with `status`
    pub fn count(&self, status: impl Fn(&SessionStatus) -> bool) -> usize {
        self.sessions.iter().filter(|s| status(&s.status)).count()
    }

    /// Outcome recorded for `name`
    pub fn get(&self, name: &str) -> Option<&SessionOutcome> {
        self.sessions.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SessionStatus::Created => {
                write!(f, "{} {} {}", "✔".green(), "Created".dimmed(), self.name.blue())
            }
            SessionStatus::Destroyed => {
                write!(f, "{} {} {}", "✔".green(), "Killed".dimmed(), self.name.blue())
            }
            SessionStatus::Skipped(reason) => write!(
                f,
                "{} {} {}",
                "-".dimmed(),
                self.name.blue(),
                reason.dimmed()
            ),
            SessionStatus::Failed(message) => {
                write!(f, "{} {}: {}", "✘".red(), self.name.blue(), message)
            }
        }
    }
}

/// Print a warning line to stderr
pub fn warn(message: &str) {
    eprintln!("{} {}", "!".yellow(), message);
}

/// Print a session outcome to stderr
pub fn print_outcome(outcome: &SessionOutcome) {
    eprintln!("{}", outcome);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: SessionStatus) -> SessionOutcome {
        SessionOutcome {
            name: name.to_string(),
            status,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_failures_are_detected() {
        let mut report = Report::default();
        report.sessions.push(outcome("dev", SessionStatus::Created));
        report
            .sessions
            .push(outcome("ops", SessionStatus::Skipped("already running".into())));
        assert!(!report.has_failures());

        report
            .sessions
            .push(outcome("web", SessionStatus::Failed("boom".into())));
        assert!(report.has_failures());
        assert_eq!(report.count(|s| matches!(s, SessionStatus::Created)), 1);
        assert_eq!(
            report.get("web").map(|s| &s.status),
            Some(&SessionStatus::Failed("boom".into()))
        );
    }

    #[test]
    fn test_outcome_display_mentions_name() {
        colored::control::set_override(false);
        let line = outcome("dev", SessionStatus::Skipped("not running".into())).to_string();
        assert_eq!(line, "- dev not running");
    }
}
