//! GoTrue-shaped auth provider over HTTP.
//!
//! Holds the one session of the console process. Tokens arrive through
//! [`AuthProvider::set_session`] once the browser returns from the redirect.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use folio_core::gate::mask_email;
use folio_core::ports::{
    AuthError, AuthProvider, AuthUser, Session, SessionChange, SessionTokens, SignInRedirect,
};

use super::SessionVerifier;
use crate::store::StoreConfig;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: AuthUser,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

pub struct GoTrueAuthProvider {
    client: Client,
    config: StoreConfig,
    verifier: Option<SessionVerifier>,
    session: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
}

impl GoTrueAuthProvider {
    pub fn new(client: Client, config: StoreConfig) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            client,
            config,
            verifier: None,
            session: RwLock::new(None),
            changes,
        }
    }

    /// Verify adopted tokens locally instead of asking the provider.
    pub fn with_verifier(mut self, verifier: SessionVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    fn url(&self, path: &str) -> Result<url::Url, AuthError> {
        self.config
            .auth_url(path)
            .map_err(|e| AuthError::Provider(format!("Invalid auth URL: {e}")))
    }

    fn expiry(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
        expires_in.map(|seconds| Utc::now() + TimeDelta::seconds(seconds))
    }

    async fn check(response: Response) -> Result<Response, AuthError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthError::InvalidToken("rejected by the auth provider".into()))
            }
            status => Err(AuthError::Provider(format!("status {status}"))),
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(self.url("user")?)
            .header("apikey", self.config.anon_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let mut url = self.url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let response = self
            .client
            .post(url)
            .header("apikey", self.config.anon_key())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let tokens: TokenResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        Ok(Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: Self::expiry(tokens.expires_in),
            user: tokens.user,
        })
    }

    async fn replace(&self, session: Option<Session>) {
        *self.session.write().await = session.clone();
        let change = match session {
            Some(session) => SessionChange::SignedIn(session),
            None => SessionChange::SignedOut,
        };
        // Ignore send errors (no subscribers)
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuthProvider {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.session.read().await.clone() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.replace(None).await;
            return Ok(None);
        };
        match self.refresh(refresh_token).await {
            Ok(renewed) => {
                tracing::debug!("Session refreshed");
                self.replace(Some(renewed.clone())).await;
                Ok(Some(renewed))
            }
            Err(AuthError::InvalidToken(_)) => {
                tracing::info!("Refresh token rejected, signing out");
                self.replace(None).await;
                Ok(None)
            }
            Err(err) => Err(AuthError::SessionLookup(err.to_string())),
        }
    }

    async fn get_current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };
        let user = self.fetch_user(&session.access_token).await?;
        if let Some(current) = self.session.write().await.as_mut() {
            current.user = user.clone();
        }
        Ok(Some(user))
    }

    async fn sign_in_with_redirect(
        &self,
        provider: &str,
        return_url: &str,
    ) -> Result<SignInRedirect, AuthError> {
        let mut url = self.url("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", return_url);
        Ok(SignInRedirect { url: url.into() })
    }

    async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError> {
        let (user, expires_at) = match &self.verifier {
            Some(verifier) => {
                let verified = verifier.verify(&tokens.access_token)?;
                (verified.user, verified.expires_at)
            }
            None => (self.fetch_user(&tokens.access_token).await?, None),
        };

        let session = Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: Self::expiry(tokens.expires_in).or(expires_at),
            user,
        };
        let email = mask_email(session.email().unwrap_or_default());
        tracing::info!(email = %email, "Session established");
        self.replace(Some(session.clone())).await;
        Ok(session)
    }

    async fn verify_token(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        match &self.verifier {
            Some(verifier) => Ok(verifier.verify(access_token)?.user),
            None => self.fetch_user(access_token).await,
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.session.read().await.clone() else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.url("logout")?)
            .header("apikey", self.config.anon_key())
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        match Self::check(response).await {
            // An already revoked token means the session is gone either way.
            Ok(_) | Err(AuthError::InvalidToken(_)) => {}
            Err(err) => return Err(err),
        }

        self.replace(None).await;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}
