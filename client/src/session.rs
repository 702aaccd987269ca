//! Persisted session storage.
//!
//! The session lives in an external key-value collaborator under two
//! logical keys: the identity blob (JSON) and the bearer token (an
//! opaque string). [`SessionStore`] re-reads the collaborator on every
//! `get` and keeps no cache of its own.

use ams_types::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Key for the identity blob.
pub const USER_DATA_KEY: &str = "user_data";
/// Key for the bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Error type for key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The persisted key-value collaborator.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// On-disk file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFormat {
    version: u32,
    entries: BTreeMap<String, String>,
}

impl Default for StoreFormat {
    fn default() -> Self {
        Self {
            version: 1,
            entries: BTreeMap::new(),
        }
    }
}

/// Key-value collaborator persisting to a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    cache: RwLock<Option<BTreeMap<String, String>>>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(None),
        }
    }

    /// Load entries from file, using the cache if available.
    async fn load(&self) -> Result<BTreeMap<String, String>> {
        {
            let cache = self.cache.read().await;
            if let Some(entries) = cache.as_ref() {
                return Ok(entries.clone());
            }
        }

        debug!("Loading key-value store from {:?}", self.path);

        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let entries = match serde_json::from_str::<StoreFormat>(&content) {
            Ok(format) => format.entries,
            Err(e) => {
                warn!("Store file {:?} is unreadable ({}), starting empty", self.path, e);
                BTreeMap::new()
            }
        };

        let mut cache = self.cache.write().await;
        *cache = Some(entries.clone());
        Ok(entries)
    }

    async fn persist(&self, entries: BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let format = StoreFormat {
            version: 1,
            entries: entries.clone(),
        };
        let json = serde_json::to_string_pretty(&format)?;
        fs::write(&self.path, json).await?;

        let mut cache = self.cache.write().await;
        *cache = Some(entries);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load().await?;
        entries.remove(key);
        self.persist(entries).await
    }

    async fn clear(&self) -> Result<()> {
        self.persist(BTreeMap::new()).await
    }
}

/// The authenticated identity, read from and written to the
/// collaborator on every call.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The current session, or `None` when logged out. An identity
    /// blob that fails to parse is treated as absent, not fatal.
    pub async fn get(&self) -> Result<Option<Session>> {
        let Some(blob) = self.store.get(USER_DATA_KEY).await? else {
            return Ok(None);
        };

        let mut session: Session = match serde_json::from_str(&blob) {
            Ok(session) => session,
            Err(e) => {
                warn!("Stored identity is unreadable ({}), treating as logged out", e);
                return Ok(None);
            }
        };

        session.auth_token = self.store.get(AUTH_TOKEN_KEY).await?;
        Ok(Some(session))
    }

    pub async fn set(&self, session: &Session) -> Result<()> {
        let blob = serde_json::to_string(session)?;
        self.store.set(USER_DATA_KEY, &blob).await?;
        match &session.auth_token {
            Some(token) => self.store.set(AUTH_TOKEN_KEY, token).await,
            None => self.store.remove(AUTH_TOKEN_KEY).await,
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }
}
