//! Application state - shared across all handlers.

use std::sync::Arc;

use folio_core::domain::{Post, Project};
use folio_core::ports::{AuthProvider, ContentGateway, PublishedCatalog};
use folio_core::{AccessGate, AccessPolicy, MatrixConsole, SignInTarget};
use folio_infra::{InMemoryAuthProvider, InMemoryContentStore, StoreRecord, fixtures};

#[cfg(feature = "live")]
use anyhow::Context;
#[cfg(feature = "live")]
use folio_infra::{GoTrueAuthProvider, JwtConfig, RestContentStore, SessionVerifier, StoreConfig};

use crate::config::{AppConfig, DataSource};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub console: Arc<MatrixConsole>,
    pub posts: Arc<dyn PublishedCatalog<Post>>,
    pub projects: Arc<dyn PublishedCatalog<Project>>,
}

/// The console and public faces of one content table.
struct Backend<C> {
    gateway: Arc<dyn ContentGateway<C>>,
    catalog: Arc<dyn PublishedCatalog<C>>,
}

impl<C: StoreRecord> Backend<C> {
    fn fixture(auth: Arc<dyn AuthProvider>, seed: Vec<C>) -> Self {
        let store = Arc::new(InMemoryContentStore::new(auth, seed));
        Self {
            gateway: store.clone(),
            catalog: store,
        }
    }

    #[cfg(feature = "live")]
    fn live(live: &Live, auth: Arc<dyn AuthProvider>) -> Self {
        let store = Arc::new(RestContentStore::new(
            live.client.clone(),
            live.store.clone(),
            auth,
        ));
        Self {
            gateway: store.clone(),
            catalog: store,
        }
    }
}

/// Connection to the hosted store, shared by every live adapter.
#[cfg(feature = "live")]
struct Live {
    client: reqwest::Client,
    store: StoreConfig,
    jwt_secret: Option<String>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub fn build(config: &AppConfig) -> anyhow::Result<Self> {
        #[cfg(feature = "live")]
        let live = match &config.store {
            Some(settings) => Some(Live {
                client: reqwest::Client::builder()
                    .user_agent(concat!("folio-matrix/", env!("CARGO_PKG_VERSION")))
                    .build()?,
                store: StoreConfig::new(&settings.url, settings.anon_key.clone())
                    .context("STORE_URL is not a valid URL")?,
                jwt_secret: settings.jwt_secret.clone(),
            }),
            None => None,
        };

        #[cfg(feature = "live")]
        let auth: Arc<dyn AuthProvider> = match &live {
            Some(live) => {
                let provider = GoTrueAuthProvider::new(live.client.clone(), live.store.clone());
                match &live.jwt_secret {
                    Some(secret) => {
                        let verifier = SessionVerifier::new(JwtConfig::new(secret.clone()));
                        Arc::new(provider.with_verifier(verifier))
                    }
                    None => Arc::new(provider),
                }
            }
            None => Self::local_auth(config),
        };

        #[cfg(not(feature = "live"))]
        let auth = {
            if config.store.is_some() {
                tracing::warn!("Built without the live feature - ignoring STORE_URL");
            }
            Self::local_auth(config)
        };

        let posts: Backend<Post> = match config.posts_source {
            DataSource::Fixture => Backend::fixture(auth.clone(), fixtures::posts()?),
            #[cfg(feature = "live")]
            DataSource::Live => Backend::live(
                live.as_ref().context("POSTS_SOURCE=live needs a store")?,
                auth.clone(),
            ),
            #[cfg(not(feature = "live"))]
            DataSource::Live => anyhow::bail!("POSTS_SOURCE=live needs the live feature"),
        };

        let projects: Backend<Project> = match config.projects_source {
            DataSource::Fixture => Backend::fixture(auth.clone(), fixtures::projects()?),
            #[cfg(feature = "live")]
            DataSource::Live => Backend::live(
                live.as_ref().context("PROJECTS_SOURCE=live needs a store")?,
                auth.clone(),
            ),
            #[cfg(not(feature = "live"))]
            DataSource::Live => anyhow::bail!("PROJECTS_SOURCE=live needs the live feature"),
        };

        if config.allowed_email.is_none() {
            tracing::warn!("MATRIX_ALLOWED_EMAIL not set. The console will stay closed.");
        }

        let gate = AccessGate::new(
            auth,
            AccessPolicy::new(config.allowed_email.as_deref()),
            SignInTarget::for_origin(config.auth_provider.clone(), &config.public_url),
        );

        tracing::info!(
            posts = ?config.posts_source,
            projects = ?config.projects_source,
            "Application state initialized"
        );

        Ok(Self {
            gate: Arc::new(gate),
            console: Arc::new(MatrixConsole::new(posts.gateway, projects.gateway)),
            posts: posts.catalog,
            projects: projects.catalog,
        })
    }

    fn local_auth(config: &AppConfig) -> Arc<dyn AuthProvider> {
        tracing::warn!("STORE_URL not set. Using the in-memory auth provider.");
        Arc::new(InMemoryAuthProvider::new(config.dev_sign_in_email.clone()))
    }
}
