//! Access gate for the Matrix console.
//!
//! Resolves the provider session once on mount, follows session changes for
//! as long as it is mounted and decides which view the console shows.

use std::sync::{Arc, Mutex as StdMutex};

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

use crate::ports::{
    AuthError, AuthProvider, AuthUser, Session, SessionChange, SessionTokens, SignInRedirect,
};

/// The single-account allowlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed_email: Option<String>,
}

impl AccessPolicy {
    /// Blank values count as unset.
    pub fn new(allowed_email: Option<&str>) -> Self {
        let allowed_email = allowed_email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty());
        Self { allowed_email }
    }

    pub fn allowed_email(&self) -> Option<&str> {
        self.allowed_email.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.allowed_email.is_some()
    }

    pub fn permits(&self, email: Option<&str>) -> bool {
        match (&self.allowed_email, email) {
            (Some(allowed), Some(email)) => allowed.eq_ignore_ascii_case(email.trim()),
            _ => false,
        }
    }
}

/// Where sign-in starts and where it comes back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInTarget {
    pub provider: String,
    pub return_url: String,
}

impl SignInTarget {
    /// Returns to `/matrix` on the given public origin.
    pub fn for_origin(provider: impl Into<String>, origin: &str) -> Self {
        Self {
            provider: provider.into(),
            return_url: format!("{}/matrix", origin.trim_end_matches('/')),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum GateStatus {
    Loading,
    SignedOut,
    SignedIn,
    Error(String),
}

/// What the console shows, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum GateView {
    Loading,
    Unavailable { message: String },
    /// No allowed email is configured, whatever the session.
    Misconfigured { signed_in_as: Option<String> },
    SignInRequired,
    /// Signed in with an account that is not on the allowlist.
    Denied { email: Option<String> },
    Authorized { email: String },
}

struct GateState {
    status: GateStatus,
    session: Option<Session>,
}

impl GateState {
    fn apply(&mut self, change: SessionChange) {
        match change {
            SessionChange::SignedIn(session) => {
                self.status = GateStatus::SignedIn;
                self.session = Some(session);
            }
            SessionChange::SignedOut => {
                self.status = GateStatus::SignedOut;
                self.session = None;
            }
        }
    }

    fn fail(&mut self, message: String) {
        self.status = GateStatus::Error(message);
    }
}

/// Access gate - session state plus the allowlist decision.
pub struct AccessGate {
    provider: Arc<dyn AuthProvider>,
    policy: AccessPolicy,
    target: SignInTarget,
    state: Arc<RwLock<GateState>>,
    listener: StdMutex<Option<JoinHandle<()>>>,
}

impl AccessGate {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        policy: AccessPolicy,
        target: SignInTarget,
    ) -> Self {
        Self {
            provider,
            policy,
            target,
            state: Arc::new(RwLock::new(GateState {
                status: GateStatus::Loading,
                session: None,
            })),
            listener: StdMutex::new(None),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Resolves the current session and starts following session changes.
    ///
    /// Mounting again replaces the previous listener.
    pub async fn mount(&self) -> GateStatus {
        self.teardown();
        // Subscribe first so a change racing the lookup is not lost.
        let changes = self.provider.subscribe();

        let resolved = match self.resolve_session().await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "Auth session lookup failed");
                let mut state = self.state.write().await;
                state.fail(err.to_string());
                return state.status.clone();
            }
        };

        let status = {
            let mut state = self.state.write().await;
            state.apply(match resolved {
                Some(session) => SessionChange::SignedIn(session),
                None => SessionChange::SignedOut,
            });
            state.status.clone()
        };
        tracing::info!(status = ?status, "Access gate mounted");

        let handle = tokio::spawn(follow_changes(changes, self.state.clone()));
        if let Ok(mut listener) = self.listener.lock() {
            *listener = Some(handle);
        }
        status
    }

    async fn resolve_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(mut session) = self.provider.get_session().await? else {
            return Ok(None);
        };
        if let Some(user) = self.provider.get_current_user().await? {
            session.user = user;
        }
        Ok(Some(session))
    }

    /// Stops following session changes.
    pub fn teardown(&self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }

    pub async fn status(&self) -> GateStatus {
        self.state.read().await.status.clone()
    }

    /// The view of the process session.
    pub async fn view(&self) -> GateView {
        let state = self.state.read().await;
        match &state.status {
            GateStatus::Loading => GateView::Loading,
            GateStatus::Error(message) => GateView::Unavailable {
                message: message.clone(),
            },
            GateStatus::SignedOut => self.decide(None),
            GateStatus::SignedIn => {
                let user = state.session.as_ref().map(|session| session.user.clone());
                self.decide(user)
            }
        }
    }

    /// The view for a request presenting `access_token`.
    ///
    /// The process session only decides whether the gate is still loading or
    /// failed; who is signed in comes from the token itself.
    pub async fn view_for(&self, access_token: Option<&str>) -> GateView {
        match self.status().await {
            GateStatus::Loading => return GateView::Loading,
            GateStatus::Error(message) => return GateView::Unavailable { message },
            GateStatus::SignedOut | GateStatus::SignedIn => {}
        }

        let user = match access_token {
            None => None,
            Some(token) => match self.provider.verify_token(token).await {
                Ok(user) => Some(user),
                Err(AuthError::InvalidToken(_) | AuthError::TokenExpired) => None,
                Err(err) => {
                    tracing::warn!(error = %err, "Access token check failed");
                    return GateView::Unavailable {
                        message: err.to_string(),
                    };
                }
            },
        };
        self.decide(user)
    }

    fn decide(&self, user: Option<AuthUser>) -> GateView {
        let signed_in = user.is_some();
        let email = user.and_then(|user| user.email).map(|email| email.to_lowercase());

        if !self.policy.is_configured() {
            return GateView::Misconfigured {
                signed_in_as: email,
            };
        }
        match (signed_in, email) {
            (false, _) => GateView::SignInRequired,
            (true, Some(email)) if self.policy.permits(Some(&email)) => {
                GateView::Authorized { email }
            }
            (true, email) => GateView::Denied { email },
        }
    }

    /// The allowed email when the gate is open.
    pub async fn authorized_email(&self) -> Option<String> {
        match self.view().await {
            GateView::Authorized { email } => Some(email),
            _ => None,
        }
    }

    /// Starts the provider's redirect sign-in back to the console.
    pub async fn sign_in(&self) -> Result<SignInRedirect, AuthError> {
        let result = self
            .provider
            .sign_in_with_redirect(&self.target.provider, &self.target.return_url)
            .await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "Sign-in could not start");
            self.state.write().await.fail(err.to_string());
        }
        result
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        match self.provider.sign_out().await {
            Ok(()) => {
                self.state.write().await.apply(SessionChange::SignedOut);
                tracing::info!("Signed out");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Sign-out failed");
                self.state.write().await.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Adopts the tokens returned by a completed redirect sign-in.
    ///
    /// Rejected tokens leave the gate as it was.
    pub async fn adopt_session(&self, tokens: SessionTokens) -> Result<GateView, AuthError> {
        let session = self.provider.set_session(tokens).await?;
        tracing::info!(email = %mask_email(session.email().unwrap_or_default()), "Session adopted");
        self.state
            .write()
            .await
            .apply(SessionChange::SignedIn(session));
        Ok(self.view().await)
    }

    /// Access token of the current session, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|session| session.access_token.clone())
    }
}

impl Drop for AccessGate {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn follow_changes(
    mut changes: broadcast::Receiver<SessionChange>,
    state: Arc<RwLock<GateState>>,
) {
    loop {
        match changes.recv().await {
            Ok(change) => {
                let signed_in = matches!(change, SessionChange::SignedIn(_));
                tracing::debug!(signed_in, "Session changed");
                state.write().await.apply(change);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Session change listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Masks the local part of an email for logs: `ada@example.com` → `a***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        None if email.is_empty() => String::new(),
        None => "***".to_string(),
    }
}
