use std::path::PathBuf;
use std::time::Duration;

/// Document identity shared by every client when none is configured.
pub const DEFAULT_DOCUMENT_ID: &str = "shared-user";

/// Firestore REST root used when no override is configured.
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// How often the REST backend re-reads a watched document.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Credentials and addressing for the cloud document store.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,

    /// Logical identity of the shared document every client reads and writes.
    /// Passing a per-user id here is all multi-tenant use needs.
    pub document_id: String,

    /// REST root (overridable for emulators)
    pub base_url: String,

    /// Re-read interval for watched documents
    pub poll_interval: Duration,
}

impl CloudConfig {
    pub fn new(
        api_key: impl Into<String>,
        auth_domain: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            auth_domain: auth_domain.into(),
            project_id: project_id.into(),
            document_id: DEFAULT_DOCUMENT_ID.to_string(),
            base_url: DEFAULT_FIRESTORE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = document_id.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Read the cloud configuration from the environment.
    ///
    /// Returns `None` unless `FIREBASE_API_KEY`, `FIREBASE_AUTH_DOMAIN` and
    /// `FIREBASE_PROJECT_ID` are all set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with a caller-supplied variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(
            non_empty("FIREBASE_API_KEY")?,
            non_empty("FIREBASE_AUTH_DOMAIN")?,
            non_empty("FIREBASE_PROJECT_ID")?,
        );
        if let Some(document_id) = non_empty("PORTFOLIO_DOCUMENT_ID") {
            config = config.with_document_id(document_id);
        }
        if let Some(base_url) = non_empty("FIREBASE_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        Some(config)
    }

    /// True when every credential needed to reach the store is present.
    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty()
            && !self.auth_domain.trim().is_empty()
            && !self.project_id.trim().is_empty()
            && !self.document_id.trim().is_empty()
    }
}

/// Application settings used to wire up the storage stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the local key-value files.
    pub data_dir: PathBuf,

    /// Cloud mirroring; `None` keeps everything on this device.
    pub cloud: Option<CloudConfig>,

    /// Price-lookup endpoint (e.g. "http://localhost:3000/api/price").
    pub price_api_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".portfolio"),
            cloud: None,
            price_api_url: None,
        }
    }
}

impl Settings {
    /// Build settings from `PORTFOLIO_DATA_DIR`, `PORTFOLIO_PRICE_API_URL`
    /// and the cloud variables read by [`CloudConfig::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("PORTFOLIO_DATA_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            cloud: CloudConfig::from_env(),
            price_api_url: std::env::var("PORTFOLIO_PRICE_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}
