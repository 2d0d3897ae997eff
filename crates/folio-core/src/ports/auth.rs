//! Authentication provider port.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// The account behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// An authenticated session issued by the provider.
#[derive(Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Tokens handed back by the provider's redirect flow.
#[derive(Clone, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: Option<i64>,
}

/// Where to send the browser to start sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInRedirect {
    pub url: String,
}

/// A change of the provider's current session.
#[derive(Debug, Clone)]
pub enum SessionChange {
    SignedIn(Session),
    SignedOut,
}

/// Auth provider trait - abstraction over the hosted identity service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, if any.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Fresh profile of the signed-in account.
    async fn get_current_user(&self) -> Result<Option<AuthUser>, AuthError>;

    /// Start an external sign-in flow that returns to `return_url`.
    async fn sign_in_with_redirect(
        &self,
        provider: &str,
        return_url: &str,
    ) -> Result<SignInRedirect, AuthError>;

    /// Adopt the tokens produced by a completed redirect flow.
    async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError>;

    /// The account a presented access token belongs to.
    ///
    /// Unknown, revoked and expired tokens fail with
    /// [`AuthError::InvalidToken`] or [`AuthError::TokenExpired`].
    async fn verify_token(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Session change notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to read auth session: {0}")]
    SessionLookup(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Auth provider error: {0}")]
    Provider(String),
}
