//! Error types for policy configuration and arithmetic

use thiserror::Error;

/// Errors raised by the policy engine.
///
/// Policy rejections are not errors; they come back as
/// [`PolicyResult::Rejected`](crate::types::PolicyResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Inconsistent network parameters: {0}")]
    InconsistentParameters(String),

    #[error("Invalid policy configuration: {0}")]
    InvalidConfig(String),

    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PolicyError>;
