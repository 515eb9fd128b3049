use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to probe audio: {0}")]
    ProbeFailed(String),

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Discovery service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Discovery service not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
