use thiserror::Error;

/// Failures while assembling the runtime from host capabilities.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A global subscriber is already installed, or the writer failed.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// A `desktop-shims` default could not be constructed.
    #[error("Default {capability} unavailable: {message}")]
    ShimUnavailable { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
