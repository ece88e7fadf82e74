use thiserror::Error;

/// Errors talking to the AppMap server.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never got an answer (DNS, connect, timeout).
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("APPLAND_API_KEY is not set")]
    MissingApiKey,

    #[error("app id was not provided and could not be resolved")]
    AppIdUnresolved,

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl RemoteError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Http { status, .. } => matches!(status, 408 | 429 | 502 | 503 | 504),
            RemoteError::Transport { .. } => true,
            _ => false,
        }
    }
}
