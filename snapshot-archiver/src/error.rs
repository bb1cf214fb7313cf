//! Error types for the archiver

/// Result type alias
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Record store lookup failed (table unreachable, throttled, ...)
    #[error("Record store error: {0}")]
    Store(String),

    /// Stored password is not valid base64
    #[error("Credential decode error: {0}")]
    Credentials(#[from] base64::DecodeError),

    /// Transport-level HTTP failure after all retries
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid camera address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Camera answered with a non-success status
    #[error("Camera returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Challenge could not be answered
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Object store rejected the upload
    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Config error: {0}")]
    Config(String),

    /// Trigger payload could not be parsed
    #[error("Event error: {0}")]
    Event(#[from] serde_json::Error),
}
