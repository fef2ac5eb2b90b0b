use thiserror::Error;

/// Failures raised by the license server collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("License server timeout - check your internet connection")]
    Timeout,

    #[error("Cannot connect to license server - check your internet connection")]
    Connect,

    #[error("Network error: {0}")]
    Network(String),

    #[error("License server error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response from license server: {0}")]
    InvalidBody(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// HTTP status code, when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect
        } else if e.is_decode() {
            TransportError::InvalidBody(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

impl From<TransportError> for String {
    fn from(error: TransportError) -> Self {
        error.to_string()
    }
}
