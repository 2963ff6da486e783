//! tmux-compose Core - Core library for the tmux-compose workspace launcher
//!
//! This crate provides the core functionality for tmux-compose including:
//! - Compose file parsing, validation and default resolution
//! - Tmux command builders behind the `Multiplexer` driver trait
//! - Target addressing for windows and panes
//! - The reconciliation engine behind `up` and `down`

pub mod config;
pub mod engine;
pub mod report;
pub mod target;
pub mod tmux;

// Re-export commonly used types at crate root
pub use config::{
    ComposeConfig, PaneConfig, ResolvedPane, ResolvedWindow, SessionConfig, Split, WindowConfig,
};
pub use engine::Engine;
pub use report::{Report, SessionOutcome, SessionStatus};
pub use target::{Addressing, PaneCursor, Target, WindowRef};
pub use tmux::{DryRun, Multiplexer, SessionInfo, Tmux};
