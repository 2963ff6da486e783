//! Configuration types and parsing for tmux-compose files
//!
//! A compose file declares sessions, their windows, and the panes inside each
//! window. The raw types mirror the YAML document; every optional field is
//! resolved exactly once into the `Resolved*` types the engine consumes, so
//! defaults live in one place instead of being re-derived at each use.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default compose file name, looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "tmux-compose.yml";

/// Environment variable that overrides the default compose file path
pub const CONFIG_FILE_ENV: &str = "TMUX_COMPOSE_FILE";

// =============================================================================
// Compose Document
// =============================================================================

/// Root of a compose file
#[derive(Debug, Deserialize)]
pub struct ComposeConfig {
    /// Document format version (carried, not interpreted)
    #[serde(default)]
    pub version: Option<String>,
    /// Sessions in declared order
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
    /// Path to the compose file (set during loading, not from YAML)
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

/// A tmux session and its windows
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Session name (unique within the file)
    pub name: String,
    /// Start directory for every window and pane in the session
    #[serde(default)]
    pub root: Option<String>,
    /// Windows in declared order; the first is created with the session
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
}

/// A window inside a session
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WindowConfig {
    /// Window name (defaults to `window<N>`, 1-based position)
    #[serde(default)]
    pub name: Option<String>,
    /// Command typed into the window's base pane
    #[serde(default)]
    pub command: Option<String>,
    /// Start directory, overriding the session's `root`
    #[serde(default)]
    pub root: Option<String>,
    /// Panes; the first one is the window's base pane
    #[serde(default)]
    pub panes: Vec<PaneConfig>,
    /// Named tmux layout applied after all panes exist
    #[serde(default)]
    pub layout: Option<String>,
}

/// A pane inside a window
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaneConfig {
    /// Command typed into the pane
    #[serde(default)]
    pub command: Option<String>,
    /// How the pane is split off (ignored for the base pane)
    #[serde(default)]
    pub split: Split,
}

/// Orientation of a new pane relative to the active one
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// New pane stacked below (tmux `-v`)
    #[default]
    Vertical,
    /// New pane beside (tmux `-h`)
    Horizontal,
}

// =============================================================================
// Resolved Types
// =============================================================================

/// Window with every default applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow {
    /// Declared or positional name
    pub name: String,
    /// Non-empty command for the base pane
    pub command: Option<String>,
    /// Expanded start directory
    pub root: Option<String>,
    /// Resolved panes, possibly empty
    pub panes: Vec<ResolvedPane>,
    /// Non-empty layout name
    pub layout: Option<String>,
}

/// Pane with every default applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPane {
    /// Non-empty command
    pub command: Option<String>,
    /// Split orientation
    pub split: Split,
}

impl ResolvedWindow {
    /// Layout to apply, if this window qualifies for one
    ///
    /// A layout only makes sense once panes were declared.
    pub fn effective_layout(&self) -> Option<&str> {
        if self.panes.is_empty() {
            None
        } else {
            self.layout.as_deref()
        }
    }
}

impl SessionConfig {
    /// Resolve windows in declared order
    ///
    /// A session with no windows still gets the single window tmux creates
    /// with every session, named `window1`.
    pub fn resolve_windows(&self) -> Vec<ResolvedWindow> {
        if self.windows.is_empty() {
            return vec![ResolvedWindow {
                name: default_window_name(0),
                command: None,
                root: self.root.as_deref().map(expand_path),
                panes: Vec::new(),
                layout: None,
            }];
        }

        self.windows
            .iter()
            .enumerate()
            .map(|(index, window)| window.resolve(index, self.root.as_deref()))
            .collect()
    }
}

impl WindowConfig {
    /// Resolve this window given its declared position and the session root
    pub fn resolve(&self, index: usize, session_root: Option<&str>) -> ResolvedWindow {
        let name = non_empty(self.name.as_deref()).unwrap_or_else(|| default_window_name(index));
        let root = self
            .root
            .as_deref()
            .or(session_root)
            .map(expand_path);

        ResolvedWindow {
            name,
            command: non_empty(self.command.as_deref()),
            root,
            panes: self.resolve_panes(),
            layout: non_empty(self.layout.as_deref()),
        }
    }

    /// Resolve panes in declared order
    pub fn resolve_panes(&self) -> Vec<ResolvedPane> {
        self.panes
            .iter()
            .map(|pane| ResolvedPane {
                command: non_empty(pane.command.as_deref()),
                split: pane.split,
            })
            .collect()
    }
}

/// Positional window name, 1-based
pub fn default_window_name(index: usize) -> String {
    format!("window{}", index + 1)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Validation
// =============================================================================

/// Characters tmux either rewrites in names or reads as target separators
const RESERVED_NAME_CHARS: &[char] = &['.', ':'];

/// Whether tmux would read `name` as something other than a window name
///
/// Covers window indexes, `@` ids, the single-character shorthands, relative
/// offsets such as `+1`, `{...}` tokens and the `=` exact-match prefix.
pub fn is_window_token(name: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if digits(name) || matches!(name, "^" | "$" | "!" | "+" | "-") {
        return true;
    }
    if name.starts_with('{') && name.ends_with('}') {
        return true;
    }
    if name.starts_with('=') {
        return true;
    }
    match name.split_at_checked(1) {
        Some(("+" | "-" | "@" | "%", rest)) => digits(rest),
        _ => false,
    }
}

impl ComposeConfig {
    /// Check the invariants the engine relies on for addressing
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for session in &self.sessions {
            let name = session.name.as_str();
            if name.trim().is_empty() {
                anyhow::bail!("Session name must not be empty");
            }
            if name.trim() != name {
                anyhow::bail!(
                    "Session name '{}' must not start or end with whitespace",
                    session.name
                );
            }
            if name.contains(RESERVED_NAME_CHARS) {
                anyhow::bail!(
                    "Session name '{}' must not contain '.' or ':'",
                    session.name
                );
            }
            if !seen.insert(name) {
                anyhow::bail!("Duplicate session name '{}'", session.name);
            }

            let mut window_names = HashSet::new();
            for window in session.resolve_windows() {
                if window.name.contains(RESERVED_NAME_CHARS) {
                    anyhow::bail!(
                        "Window name '{}' in session '{}' must not contain '.' or ':'",
                        window.name,
                        session.name
                    );
                }
                if is_window_token(&window.name) {
                    anyhow::bail!(
                        "Window name '{}' in session '{}' is reserved; tmux would read it as a window reference",
                        window.name,
                        session.name
                    );
                }
                if !window_names.insert(window.name.clone()) {
                    anyhow::bail!(
                        "Duplicate window name '{}' in session '{}'",
                        window.name,
                        session.name
                    );
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse a compose document from YAML text and validate it
pub fn parse_config(yaml: &str) -> Result<ComposeConfig> {
    let config: ComposeConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Load a compose file from disk
pub fn load_config(path: &Path) -> Result<ComposeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut config =
        parse_config(&content).with_context(|| format!("Invalid compose file {}", path.display()))?;
    config.path = Some(path.to_path_buf());
    Ok(config)
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &str) -> String {
    path.strip_prefix("~/")
        .and_then(|stripped| dirs::home_dir().map(|home| home.join(stripped)))
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DEV: &str = r#"
version: "1"
sessions:
  - name: dev
    windows:
      - name: editor
        command: vim
      - name: server
        panes:
          - command: npm start
          - command: npm test
            split: horizontal
          - command: tail -f log
        layout: main-vertical
      - command: htop
"#;

    #[test]
    fn test_parse_and_resolve_windows() {
        let config = parse_config(DEV).unwrap();
        assert_eq!(config.version.as_deref(), Some("1"));
        assert_eq!(config.sessions.len(), 1);

        let windows = config.sessions[0].resolve_windows();
        let names: Vec<&str> = windows.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["editor", "server", "window3"]);
        assert_eq!(windows[0].command.as_deref(), Some("vim"));
        assert_eq!(windows[2].command.as_deref(), Some("htop"));

        let splits: Vec<Split> = windows[1].panes.iter().map(|p| p.split).collect();
        assert_eq!(
            splits,
            vec![Split::Vertical, Split::Horizontal, Split::Vertical]
        );
        assert_eq!(windows[1].effective_layout(), Some("main-vertical"));
    }

    #[test]
    fn test_layout_without_panes_is_ignored() {
        let window = WindowConfig {
            layout: Some("tiled".to_string()),
            ..Default::default()
        }
        .resolve(0, None);
        assert_eq!(window.layout.as_deref(), Some("tiled"));
        assert_eq!(window.effective_layout(), None);
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let window = WindowConfig {
            name: Some("  ".to_string()),
            command: Some(String::new()),
            layout: Some(String::new()),
            panes: vec![PaneConfig {
                command: Some(" ".to_string()),
                split: Split::Horizontal,
            }],
            ..Default::default()
        }
        .resolve(1, None);
        assert_eq!(window.name, "window2");
        assert_eq!(window.command, None);
        assert_eq!(window.layout, None);
        assert_eq!(window.panes[0].command, None);
    }

    #[test]
    fn test_session_without_windows_gets_default_window() {
        let config = parse_config("sessions:\n  - name: bare\n").unwrap();
        let windows = config.sessions[0].resolve_windows();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].name, "window1");
        assert!(windows[0].panes.is_empty());
    }

    #[test]
    fn test_window_root_overrides_session_root() {
        let yaml = r#"
sessions:
  - name: dev
    root: /srv/app
    windows:
      - name: a
      - name: b
        root: /tmp
"#;
        let config = parse_config(yaml).unwrap();
        let windows = config.sessions[0].resolve_windows();
        assert_eq!(windows[0].root.as_deref(), Some("/srv/app"));
        assert_eq!(windows[1].root.as_deref(), Some("/tmp"));
    }

    #[test]
    fn test_duplicate_session_rejected() {
        let yaml = "sessions:\n  - name: dev\n  - name: dev\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate session name 'dev'"));
    }

    #[test]
    fn test_positional_name_collision_rejected() {
        let yaml = r#"
sessions:
  - name: dev
    windows:
      - name: window2
      - command: ls
"#;
        let err = parse_config(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate window name 'window2'"));
    }

    #[test]
    fn test_reserved_characters_rejected() {
        assert!(parse_config("sessions:\n  - name: my.app\n").is_err());
        let yaml = "sessions:\n  - name: dev\n    windows:\n      - name: 'a:b'\n";
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn test_numeric_window_name_rejected() {
        let yaml = "sessions:\n  - name: dev\n    windows:\n      - name: '2'\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(err.to_string().contains("Window name '2' in session 'dev' is reserved"));
    }

    #[test]
    fn test_window_reference_tokens_rejected() {
        for name in ["!", "^", "$", "+", "-", "+1", "-2", "@3", "%0", "{last}", "=editor"] {
            let yaml = format!("sessions:\n  - name: dev\n    windows:\n      - name: '{}'\n", name);
            assert!(parse_config(&yaml).is_err(), "window '{}' was accepted", name);
        }
    }

    #[test]
    fn test_window_token_detection() {
        assert!(is_window_token("!"));
        assert!(is_window_token("{end}"));
        assert!(is_window_token("-10"));
        assert!(!is_window_token("web-1"));
        assert!(!is_window_token("+x"));
        assert!(!is_window_token("c++"));
        assert!(!is_window_token("logs"));
    }

    #[test]
    fn test_padded_session_name_rejected() {
        let err = parse_config("sessions:\n  - name: ' dev '\n").unwrap_err();
        assert!(err.to_string().contains("whitespace"));
        assert!(parse_config("sessions:\n  - name: '   '\n").is_err());
    }

    #[test]
    fn test_unknown_split_rejected() {
        let yaml = r#"
sessions:
  - name: dev
    windows:
      - panes:
          - split: diagonal
"#;
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn test_load_config_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, DEV).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.yml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
