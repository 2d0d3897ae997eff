//! Domain-level error types.

use thiserror::Error;

use crate::domain::{ContentId, ContentKind};

/// Domain errors - rejected editor commands.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ContentKind, id: ContentId },

    #[error("Published {} are locked and cannot be edited.", .0.plural())]
    Locked(ContentKind),

    #[error("Select a {0} or start a new draft first.")]
    NothingSelected(ContentKind),

    #[error("Save the new {0} as a draft before publishing.")]
    NotPersisted(ContentKind),

    /// The stored version would fail validation, whatever the buffer holds.
    #[error("The saved {0} is incomplete. Save your changes before publishing.")]
    Incomplete(ContentKind),
}
