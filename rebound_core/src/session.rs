//! # Session Context
//!
//! Explicit per-session state the front-end caller owns and passes around.
//! The engine and repository keep no ambient mutable state; anything the UI
//! would traditionally hold in globals (the selected orientation, the
//! project context a received share opened) lives here.

use serde::{Deserialize, Serialize};

use crate::curves::Orientation;

/// Mutable front-end session state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Orientation the next calculation will use
    pub orientation: Orientation,

    /// Project context opened by a received project share, if any
    pub shared_project: Option<String>,
}

impl Session {
    /// Fresh session: horizontal orientation, no shared project.
    pub fn new() -> Self {
        Session::default()
    }
}
