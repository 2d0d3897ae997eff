//! Domain entities - the content managed by the console.

mod content;
mod post;
mod project;

pub use content::{
    Content, ContentId, ContentKind, ContentStatus, DraftField, DraftFields, FieldOf, InputOf,
    PatchOf, sort_recent_first,
};
pub use post::{Post, PostDraft, PostField, PostInput, PostPatch};
pub use project::{PortfolioLink, Project, ProjectDraft, ProjectField, ProjectInput, ProjectPatch};
