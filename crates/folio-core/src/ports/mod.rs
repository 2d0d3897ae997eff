//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod gateway;

pub use auth::{
    AuthError, AuthProvider, AuthUser, Session, SessionChange, SessionTokens, SignInRedirect,
};
pub use gateway::{ContentGateway, GatewayError, PublishedCatalog};
