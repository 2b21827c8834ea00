use std::io;
use thiserror::Error;

/// Error type for the barstat sampling core
#[derive(Error, Debug)]
pub enum BarstatError {
    #[error("Failed to read {resource}: {reason}")]
    ReadFailed {
        resource: &'static str,
        reason: String,
    },

    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("Failed to terminate application: {0}")]
    TerminateFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Location detection failed: {0}")]
    LocationDetectionFailed(String),

    #[error("Failed to decode response: {0}")]
    DecodingFailed(String),

    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Failed to activate power assertion: {0}")]
    ActivationFailed(String),

    #[error("Failed to deactivate power assertion: {0}")]
    DeactivationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for barstat
pub type Result<T> = std::result::Result<T, BarstatError>;

impl BarstatError {
    /// Create a read error for the named resource (cpu, ram, network, storage)
    pub fn read_failed<S: Into<String>>(resource: &'static str, reason: S) -> Self {
        BarstatError::ReadFailed {
            resource,
            reason: reason.into(),
        }
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        BarstatError::NotFound(msg.into())
    }

    pub fn terminate_failed<S: Into<String>>(msg: S) -> Self {
        BarstatError::TerminateFailed(msg.into())
    }

    pub fn invalid_url<S: Into<String>>(msg: S) -> Self {
        BarstatError::InvalidUrl(msg.into())
    }

    pub fn location_detection_failed<S: Into<String>>(msg: S) -> Self {
        BarstatError::LocationDetectionFailed(msg.into())
    }

    pub fn decoding_failed<S: Into<String>>(msg: S) -> Self {
        BarstatError::DecodingFailed(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        BarstatError::Network(msg.into())
    }

    pub fn activation_failed<S: Into<String>>(msg: S) -> Self {
        BarstatError::ActivationFailed(msg.into())
    }

    pub fn deactivation_failed<S: Into<String>>(msg: S) -> Self {
        BarstatError::DeactivationFailed(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BarstatError::Config(msg.into())
    }
}
