//! Error types for the farm dashboard client

/// Category of a [`DashboardError`], for callers that branch on the kind of
/// failure without caring about its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Unreachable,
    ServerError,
    InvalidInput,
    Decode,
    Config,
    Io,
}

/// Errors that can occur in the farm dashboard client
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The backend did not answer within the configured timeout
    #[error("Request timeout - server is taking too long to respond")]
    Timeout(String),

    /// The request never reached the backend (DNS, refused connection, no response)
    #[error("Network error - please check if the backend server is running")]
    Unreachable(String),

    /// The backend answered with a non-2xx status
    #[error("Server error: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A 2xx response whose body was not the expected JSON
    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::Timeout(_) => ErrorKind::Timeout,
            DashboardError::Unreachable(_) => ErrorKind::Unreachable,
            DashboardError::Server { .. } => ErrorKind::ServerError,
            DashboardError::InvalidInput(_) => ErrorKind::InvalidInput,
            DashboardError::Decode(_) | DashboardError::Json(_) => ErrorKind::Decode,
            DashboardError::Config(_) => ErrorKind::Config,
            DashboardError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for farm dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
