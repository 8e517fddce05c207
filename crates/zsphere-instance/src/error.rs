//! Instance lifecycle error types

use thiserror::Error;
use zsphere_cloud::CloudError;

#[derive(Error, Debug)]
pub enum InstanceError {
    /// Detectable from the desired spec alone; raised before any remote call
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A remote lookup showed a required resource missing or unusable
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The Cloud API call itself failed
    #[error("{operation} failed: {source}")]
    Remote {
        operation: String,
        #[source]
        source: CloudError,
    },

    #[error("State error: {0}")]
    State(#[source] CloudError),
}

impl InstanceError {
    pub fn remote(operation: impl Into<String>) -> impl FnOnce(CloudError) -> Self {
        let operation = operation.into();
        move |source| InstanceError::Remote { operation, source }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, InstanceError::Configuration(_))
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, InstanceError::Precondition(_))
    }
}

pub type Result<T> = std::result::Result<T, InstanceError>;
