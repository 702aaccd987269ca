//! Configuration management.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StorageConfig {
    data_dir: Option<PathBuf>,
    session_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs are written there in addition
    /// to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error). If not set, the
    /// RUST_LOG environment variable applies, defaulting to "info".
    log_level: Option<String>,
}

fn default_base_url() -> String {
    ams_types::DEFAULT_BASE_URL.to_string()
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote AMS endpoint
    pub base_url: String,
    /// Path to the persisted session file
    pub session_path: PathBuf,
    /// Path to log file
    pub log_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env
    /// vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `.ams.toml` in the current directory
    /// 2. `config.toml` in the user config directory (~/.config/ams/ on Linux)
    pub fn load(
        base_url: Option<String>,
        data_dir: Option<PathBuf>,
        session_path: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir().ok().map(|d| d.join(".ams.toml"));
        let user_config = directories::ProjectDirs::from("", "", "ams")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // Priority: defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }));

        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // AMS_SERVER__BASE_URL, AMS_STORAGE__DATA_DIR, ...
        figment = figment.merge(Env::prefixed("AMS_").split("__"));

        if let Some(url) = base_url {
            figment = figment.merge(Serialized::default("server.base_url", url));
        }
        if let Some(ref dd) = data_dir {
            figment = figment.merge(Serialized::default("storage.data_dir", dd));
        }
        if let Some(ref sp) = session_path {
            figment = figment.merge(Serialized::default("storage.session_path", sp));
        }

        let config_file: ConfigFile = figment.extract()?;

        let session_path = Self::resolve_session_path(
            config_file.storage.data_dir,
            config_file.storage.session_path,
        )?;

        Ok(Self {
            base_url: config_file.server.base_url,
            session_path,
            log_file: config_file.logging.log_file,
            log_level: config_file.logging.log_level,
        })
    }

    /// Resolve where the persisted session lives.
    ///
    /// Priority: explicit session_path > data_dir/session.json >
    /// platform data directory.
    fn resolve_session_path(
        data_dir: Option<PathBuf>,
        session_path: Option<PathBuf>,
    ) -> anyhow::Result<PathBuf> {
        if let Some(path) = session_path {
            return Ok(path);
        }

        let base_dir = match data_dir {
            Some(dir) => dir,
            None => directories::ProjectDirs::from("", "", "ams")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        if !base_dir.exists() {
            std::fs::create_dir_all(&base_dir)?;
            info!("Created data directory: {}", base_dir.display());
        }

        Ok(base_dir.join("session.json"))
    }
}
