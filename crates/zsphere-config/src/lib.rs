pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8080;

const ENV_CONFIG_PATH: &str = "ZSPHERE_CONFIG_PATH";
const ENV_HOST: &str = "ZSPHERE_HOST";
const ENV_PORT: &str = "ZSPHERE_PORT";
const ENV_ACCOUNT_NAME: &str = "ZSPHERE_ACCOUNT_NAME";
const ENV_ACCOUNT_PASSWORD: &str = "ZSPHERE_ACCOUNT_PASSWORD";
const ENV_ACCESS_KEY_ID: &str = "ZSPHERE_ACCESS_KEY_ID";
const ENV_ACCESS_KEY_SECRET: &str = "ZSPHERE_ACCESS_KEY_SECRET";

/// ZSphere config directory (`~/.config/zsphere`)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("zsphere"))
}

/// Locate the config file
///
/// 1. `ZSPHERE_CONFIG_PATH` (explicit path)
/// 2. `~/.config/zsphere/config.yaml`
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    let global_config = get_config_dir()?.join("config.yaml");
    global_config.exists().then_some(global_config)
}

/// Values read from the YAML config file; each one overrides the environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub account_name: Option<String>,
    pub account_password: Option<String>,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// How the client authenticates against the management node
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Account { name: String, password: String },
    AccessKey { id: String, secret: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Account { name, .. } => f
                .debug_struct("Account")
                .field("name", name)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::AccessKey { id, .. } => f
                .debug_struct("AccessKey")
                .field("id", id)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Connection settings for the Cloud API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
}

impl ClientConfig {
    /// Resolve from the process environment and the config file, if any
    pub fn load() -> Result<Self> {
        let file = match find_config_file() {
            Some(path) => {
                tracing::debug!("Using config file: {}", path.display());
                Some(FileConfig::from_path(&path)?)
            }
            None => None,
        };
        Self::resolve(|key| std::env::var(key).ok(), file)
    }

    /// Environment values are defaults, file values override them
    pub fn resolve(env: impl Fn(&str) -> Option<String>, file: Option<FileConfig>) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());
        let file = file.unwrap_or_default();

        let env_port = env(ENV_PORT).and_then(|p| match p.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                tracing::warn!("Ignoring invalid {}: {}", ENV_PORT, p);
                None
            }
        });

        let pick = |file_value: Option<String>, key: &str| {
            file_value.filter(|v| !v.is_empty()).or_else(|| env(key))
        };

        let host = pick(file.host, ENV_HOST).ok_or(ConfigError::MissingHost)?;
        let port = file.port.or(env_port).unwrap_or(DEFAULT_PORT);

        let account = pick(file.account_name, ENV_ACCOUNT_NAME)
            .zip(pick(file.account_password, ENV_ACCOUNT_PASSWORD));
        let access_key = pick(file.access_key_id, ENV_ACCESS_KEY_ID)
            .zip(pick(file.access_key_secret, ENV_ACCESS_KEY_SECRET));

        let credentials = match (access_key, account) {
            (Some((id, secret)), _) => Credentials::AccessKey { id, secret },
            (None, Some((name, password))) => Credentials::Account { name, password },
            (None, None) => return Err(ConfigError::MissingCredentials),
        };

        Ok(Self {
            host,
            port,
            credentials,
        })
    }

    /// Base URL of the management node API
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
