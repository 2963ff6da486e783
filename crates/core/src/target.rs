//! Tmux target addressing.
//!
//! Tmux does not let callers name panes, and the pane it considers active
//! moves with every split. [`PaneCursor`] tracks both for one window so the
//! engine always knows which form of target reaches the pane it means.

use std::fmt;

/// Reference to a window within a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowRef {
    /// Window by name
    Name(String),
    /// Lowest-numbered window, whatever `base-index` is set to
    First,
}

/// A `session[:window[.pane]]` target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub session: String,
    pub window: Option<WindowRef>,
    pub pane: Option<usize>,
}

impl Target {
    /// Target a window by name; tmux resolves it to that window's active pane
    pub fn window(session: &str, window: &str) -> Self {
        Self {
            session: session.to_string(),
            window: Some(WindowRef::Name(window.to_string())),
            pane: None,
        }
    }

    /// Target the first window of a session
    pub fn first_window(session: &str) -> Self {
        Self {
            session: session.to_string(),
            window: Some(WindowRef::First),
            pane: None,
        }
    }

    /// Target a pane by its position in a named window
    pub fn pane(session: &str, window: &str, pane: usize) -> Self {
        Self {
            pane: Some(pane),
            ..Self::window(session, window)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.session)?;
        match &self.window {
            Some(WindowRef::Name(name)) => write!(f, ":{}", name)?,
            Some(WindowRef::First) => write!(f, ":^")?,
            None => return Ok(()),
        }
        if let Some(pane) = self.pane {
            write!(f, ".{}", pane)?;
        }
        Ok(())
    }
}

/// How a pane must be addressed at the current point in the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Explicit positional index within the window
    ByIndex(usize),
    /// The window name alone; reaches the pane tmux holds active
    Active,
}

/// Per-window record of which panes exist and which one is active
///
/// Positions are 0-based in declared order. Tmux numbers panes from the
/// window's `pane-base-index`, so the cursor carries that offset and adds it
/// whenever it renders a pane by index.
#[derive(Debug)]
pub struct PaneCursor {
    session: String,
    window: String,
    base_index: usize,
    count: usize,
    active: usize,
}

impl PaneCursor {
    /// Cursor for a freshly created window: only the base pane exists
    ///
    /// `base_index` is the tmux index of that base pane.
    pub fn new(session: &str, window: &str, base_index: usize) -> Self {
        Self {
            session: session.to_string(),
            window: window.to_string(),
            base_index,
            count: 1,
            active: 0,
        }
    }

    /// Target for the next split; tmux splits the active pane
    pub fn split_target(&self) -> Target {
        Target::window(&self.session, &self.window)
    }

    /// Record a successful split: the new pane exists and is now active
    ///
    /// Splitting the last pane appends, so the new pane takes the next index.
    pub fn record_split(&mut self) -> usize {
        let index = self.count;
        self.count += 1;
        self.active = index;
        index
    }

    /// Record an explicit selection of an existing pane
    pub fn record_select(&mut self, index: usize) {
        debug_assert!(index < self.count);
        self.active = index;
    }

    /// Which addressing mode reaches `index` right now
    ///
    /// The base pane is always addressed by index. A split pane is reachable
    /// through the window name only while it is the active one.
    pub fn address(&self, index: usize) -> Addressing {
        if index > 0 && index == self.active {
            Addressing::Active
        } else {
            Addressing::ByIndex(index)
        }
    }

    /// Concrete target for pane `index`
    pub fn target(&self, index: usize) -> Target {
        match self.address(index) {
            Addressing::Active => Target::window(&self.session, &self.window),
            Addressing::ByIndex(i) => {
                Target::pane(&self.session, &self.window, self.base_index + i)
            }
        }
    }
}
