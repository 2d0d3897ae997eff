//! Content store gateways.

pub mod fixtures;
mod memory;
mod record;

#[cfg(feature = "live")]
mod config;
#[cfg(feature = "live")]
mod rest;

pub use memory::InMemoryContentStore;
pub use record::StoreRecord;

#[cfg(feature = "live")]
pub use config::StoreConfig;
#[cfg(feature = "live")]
pub use rest::RestContentStore;

use folio_core::ports::{AuthProvider, GatewayError, Session};

/// Every console call needs a live session; checked before any store access.
pub(crate) async fn require_session(auth: &dyn AuthProvider) -> Result<Session, GatewayError> {
    match auth.get_session().await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(GatewayError::NotAuthenticated),
        Err(err) => {
            tracing::warn!(error = %err, "Session lookup failed");
            Err(GatewayError::SessionLookup)
        }
    }
}
