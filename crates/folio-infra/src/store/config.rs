use url::Url;

/// Hosted store endpoint and its public (anon) key.
#[derive(Clone)]
pub struct StoreConfig {
    base: Url,
    anon_key: String,
}

impl StoreConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            anon_key: anon_key.into(),
        })
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `<base>/rest/v1/<table>`
    pub fn rest_url(&self, table: &str) -> Result<Url, url::ParseError> {
        self.base.join(&format!("rest/v1/{table}"))
    }

    /// `<base>/auth/v1/<path>`
    pub fn auth_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(&format!("auth/v1/{path}"))
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base", &self.base.as_str())
            .field("anon_key", &"<redacted>")
            .finish()
    }
}
