use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Missing ZSphere API host. Set `host` in the config file or the ZSPHERE_HOST environment variable"
    )]
    MissingHost,

    #[error(
        "Missing ZSphere authorization. Provide either account_name/account_password \
        (ZSPHERE_ACCOUNT_NAME/ZSPHERE_ACCOUNT_PASSWORD) or access_key_id/access_key_secret \
        (ZSPHERE_ACCESS_KEY_ID/ZSPHERE_ACCESS_KEY_SECRET)"
    )]
    MissingCredentials,

    #[error("Invalid config file {path}: {source}")]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
