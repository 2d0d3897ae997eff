//! In-memory auth provider - local development without a hosted provider.
//!
//! Redirect sign-in completes immediately as the configured account.
//! Works within a single process only.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use folio_core::gate::mask_email;
use folio_core::ports::{
    AuthError, AuthProvider, AuthUser, Session, SessionChange, SessionTokens, SignInRedirect,
};

const SESSION_HOURS: i64 = 8;

pub struct InMemoryAuthProvider {
    email: Option<String>,
    session: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
}

impl InMemoryAuthProvider {
    /// `email` is the account every sign-in resolves to; `None` disables sign-in.
    pub fn new(email: Option<String>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            email,
            session: RwLock::new(None),
            changes,
        }
    }

    fn issue(&self, email: &str, access_token: String) -> Session {
        Session {
            access_token,
            refresh_token: None,
            expires_at: Some(Utc::now() + TimeDelta::hours(SESSION_HOURS)),
            user: AuthUser {
                id: format!("local-{email}"),
                email: Some(email.to_string()),
            },
        }
    }

    async fn establish(&self, session: Session) -> Session {
        *self.session.write().await = Some(session.clone());
        // Ignore send errors (no subscribers)
        let _ = self.changes.send(SessionChange::SignedIn(session.clone()));
        session
    }

    fn account(&self) -> Result<&str, AuthError> {
        self.email
            .as_deref()
            .ok_or_else(|| AuthError::Provider("No development account is configured.".into()))
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let mut session = self.session.write().await;
        if session.as_ref().is_some_and(|s| s.is_expired(Utc::now())) {
            *session = None;
        }
        Ok(session.clone())
    }

    async fn get_current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.get_session().await?.map(|session| session.user))
    }

    async fn sign_in_with_redirect(
        &self,
        provider: &str,
        return_url: &str,
    ) -> Result<SignInRedirect, AuthError> {
        let email = self.account()?.to_string();
        let session = self.issue(&email, format!("local-{}", Uuid::new_v4()));
        self.establish(session).await;
        tracing::info!(provider, email = %mask_email(&email), "Local sign-in completed");
        Ok(SignInRedirect {
            url: return_url.to_string(),
        })
    }

    async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError> {
        if tokens.access_token.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty access token".into()));
        }
        let email = self.account()?.to_string();
        let mut session = self.issue(&email, tokens.access_token);
        session.refresh_token = tokens.refresh_token;
        if let Some(seconds) = tokens.expires_in {
            session.expires_at = Some(Utc::now() + TimeDelta::seconds(seconds));
        }
        Ok(self.establish(session).await)
    }

    /// Only the token of the live local session is accepted.
    async fn verify_token(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        match self.get_session().await? {
            Some(session) if session.access_token == access_token => Ok(session.user),
            _ => Err(AuthError::InvalidToken("unknown session token".into())),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.session.write().await = None;
        let _ = self.changes.send(SessionChange::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}
