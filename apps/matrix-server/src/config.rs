//! Application configuration loaded from environment variables.
//!
//! Resolved once at startup and handed to constructors from there on.

use std::env;
use std::str::FromStr;

/// Where one content type is read from and written to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
    /// Embedded fixture data, kept in memory.
    #[default]
    Fixture,
    /// The hosted content store.
    Live,
}

impl FromStr for DataSource {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "fixture" | "mock" => Ok(DataSource::Fixture),
            "live" => Ok(DataSource::Live),
            _ => Err(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("{var} must be set when {requires} is set")]
    Missing {
        var: &'static str,
        requires: &'static str,
    },

    #[error("{var}=live needs STORE_URL and STORE_ANON_KEY")]
    LiveWithoutStore { var: &'static str },
}

/// Hosted store connection settings.
#[derive(Clone)]
pub struct StoreSettings {
    pub url: String,
    pub anon_key: String,
    /// Verifies session tokens locally when set.
    pub jwt_secret: Option<String>,
}

impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("url", &self.url)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Public origin of the site, used for the sign-in return URL.
    pub public_url: String,
    pub allowed_email: Option<String>,
    pub auth_provider: String,
    pub store: Option<StoreSettings>,
    pub posts_source: DataSource,
    pub projects_source: DataSource,
    /// Account the in-memory auth provider signs in as.
    pub dev_sign_in_email: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match var("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value,
            })?,
            None => 8080,
        };
        let public_url = var("PUBLIC_URL").unwrap_or_else(|| format!("http://{host}:{port}"));

        let store = match (var("STORE_URL"), var("STORE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(StoreSettings {
                url,
                anon_key,
                jwt_secret: var("STORE_JWT_SECRET"),
            }),
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    var: "STORE_ANON_KEY",
                    requires: "STORE_URL",
                });
            }
            (None, _) => None,
        };

        let source = |key: &'static str| -> Result<DataSource, ConfigError> {
            let source = match var(key) {
                Some(value) => value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue { var: key, value })?,
                None => DataSource::default(),
            };
            if source == DataSource::Live && store.is_none() {
                return Err(ConfigError::LiveWithoutStore { var: key });
            }
            Ok(source)
        };
        let posts_source = source("POSTS_SOURCE")?;
        let projects_source = source("PROJECTS_SOURCE")?;

        let allowed_email = var("MATRIX_ALLOWED_EMAIL");
        Ok(Self {
            host,
            port,
            public_url,
            dev_sign_in_email: var("DEV_SIGN_IN_EMAIL").or_else(|| allowed_email.clone()),
            allowed_email,
            auth_provider: var("MATRIX_AUTH_PROVIDER").unwrap_or_else(|| "google".to_string()),
            store,
            posts_source,
            projects_source,
        })
    }
}
