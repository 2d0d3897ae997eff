//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`:
//! content store gateways and auth providers.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, fixture store and in-memory auth only
//! - `live` - PostgREST-shaped content store and GoTrue-shaped auth over HTTP
//! - `jwt` - Local verification of session tokens with the store's JWT secret

pub mod auth;
pub mod store;

// Re-exports - In-Memory
pub use auth::InMemoryAuthProvider;
pub use store::{InMemoryContentStore, StoreRecord, fixtures};

// Re-exports - Live
#[cfg(feature = "live")]
pub use auth::GoTrueAuthProvider;
#[cfg(feature = "jwt")]
pub use auth::{JwtConfig, SessionVerifier};
#[cfg(feature = "live")]
pub use store::{RestContentStore, StoreConfig};
