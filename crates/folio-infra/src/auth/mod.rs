//! Auth provider implementations.

mod memory;

#[cfg(feature = "live")]
mod gotrue;
#[cfg(feature = "jwt")]
mod jwt;

pub use memory::InMemoryAuthProvider;

#[cfg(feature = "live")]
pub use gotrue::GoTrueAuthProvider;
#[cfg(feature = "jwt")]
pub use jwt::{JwtConfig, SessionVerifier, VerifiedToken};
