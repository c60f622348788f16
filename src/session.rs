//! Client session: API base URL, stored credential, and the logout path.
//!
//! A [`Session`] is built once per process and handed to every caller that
//! talks to the backend. It owns the credential store and knows where to
//! send the user when the backend rejects that credential.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::StoreError;

/// Persistent storage for the API bearer token.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Read the stored token, if any.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored token.
    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Remove the stored token.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Token kept in a file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by `path`. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, token).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Token kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.token.read().map(|t| t.clone()).unwrap_or_default())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
        Ok(())
    }
}

/// Receives navigation requests, e.g. the forced redirect to login.
pub trait Navigator: Send + Sync {
    /// Navigate to `url`.
    fn navigate(&self, url: &Url);
}

/// Navigator that only logs where the user should go.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, url: &Url) {
        info!(%url, "Navigation requested");
    }
}

/// Per-process client context.
#[derive(Clone)]
pub struct Session {
    base_url: Url,
    login_path: String,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("login_path", &self.login_path)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session from its parts.
    pub fn new(
        base_url: Url,
        login_path: impl Into<String>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url,
            login_path: login_path.into(),
            store,
            navigator,
        }
    }

    /// Build a session from configuration.
    ///
    /// `API_KEY` in the environment is held in memory; otherwise the key
    /// file is used.
    pub fn from_config(config: &Config, navigator: Arc<dyn Navigator>) -> Result<Self, url::ParseError> {
        let store: Arc<dyn TokenStore> = match config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Arc::new(MemoryTokenStore::with_token(key)),
            None => Arc::new(FileTokenStore::new(config.api_key_file.clone())),
        };
        Ok(Self::new(config.base_url()?, config.login_path.clone(), store, navigator))
    }

    /// API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append an endpoint path to the base URL, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
    }

    /// Absolute URL of the login route.
    pub fn login_url(&self) -> Url {
        self.endpoint(&self.login_path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    /// Current bearer token. Unreadable storage counts as no token.
    pub fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored API key");
                None
            }
        }
    }

    /// Store a new bearer token.
    pub fn login(&self, token: &str) -> Result<(), StoreError> {
        self.store.save(token)?;
        debug!("API key stored");
        Ok(())
    }

    /// Remove the stored token without navigating.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()
    }

    /// Forced logout after the backend rejected the credential.
    pub fn expire(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored API key");
        }
        let login = self.login_url();
        warn!(login = %login, "Credentials rejected, session expired");
        self.navigator.navigate(&login);
    }
}
