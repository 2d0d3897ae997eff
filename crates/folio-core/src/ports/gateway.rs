//! Content store ports.

use async_trait::async_trait;

use crate::domain::{Content, ContentId, InputOf, PatchOf};

/// Gateway trait - the console's only route to the content store.
///
/// Every operation requires an active session and fails with
/// [`GatewayError::NotAuthenticated`] before touching the network otherwise.
/// Failures are never retried.
#[async_trait]
pub trait ContentGateway<C: Content>: Send + Sync {
    /// All entities of this type, most recently updated first.
    async fn list(&self) -> Result<Vec<C>, GatewayError>;

    /// Persist a new draft. The store assigns the id and timestamp.
    async fn create(&self, input: InputOf<C>) -> Result<C, GatewayError>;

    /// Apply a partial update and refresh the timestamp.
    async fn update(&self, id: &ContentId, patch: PatchOf<C>) -> Result<C, GatewayError>;

    /// Flip the entity to published and stamp the publish time.
    async fn publish(&self, id: &ContentId) -> Result<C, GatewayError>;
}

/// Read-only access to published content for the public pages.
#[async_trait]
pub trait PublishedCatalog<C: Content>: Send + Sync {
    /// Published entities, newest publication first.
    async fn list_published(&self) -> Result<Vec<C>, GatewayError>;

    /// One published entity; drafts are reported as not found.
    async fn find_published(&self, id: &ContentId) -> Result<C, GatewayError>;
}

/// Content store errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Not authenticated.")]
    NotAuthenticated,

    #[error("Failed to read auth session.")]
    SessionLookup,

    #[error("Unable to reach the content store: {0}")]
    Unreachable(String),

    #[error("{context} (status {status})")]
    Rejected { context: String, status: u16 },

    #[error("{0} not found.")]
    NotFound(String),

    #[error("Unexpected response from the content store: {0}")]
    Decode(String),

    #[error("{0}")]
    Unavailable(String),
}
