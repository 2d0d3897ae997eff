//! Closed state types for a draft session.

use serde::Serialize;

use crate::domain::ContentId;

/// What the editor is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    Idle,
    Selected(ContentId),
    CreatingNew,
}

/// Externally visible editor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    ViewingDraft,
    ViewingPublished,
    CreatingNew,
}

/// The single mutating action in flight for an entity type, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    #[default]
    Idle,
    Saving,
    Creating,
    Publishing,
}

impl Activity {
    pub fn is_busy(self) -> bool {
        !matches!(self, Activity::Idle)
    }
}

/// Progress of the list fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ListState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Publish confirmation dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishDialog {
    #[default]
    Closed,
    Open,
}

/// One error slot per action so an error from one does not mask another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionErrors {
    pub save: Option<String>,
    pub create: Option<String>,
    pub publish: Option<String>,
}

impl ActionErrors {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Result of an editor command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The command ran to completion.
    Completed,
    /// Another action was in flight; nothing happened.
    Skipped,
    /// A precondition failed before the store was called.
    Rejected,
    /// The store call failed.
    Failed(String),
}

/// Result of a list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded(usize),
    /// Superseded by a newer load or torn down; the result was discarded.
    Cancelled,
    Failed(String),
}
