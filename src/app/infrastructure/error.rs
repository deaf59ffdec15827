use thiserror::Error;

/// Coarse classification used to decide how an error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Server,
    Timeout,
    Malformed,
    Storage,
    Session,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Busy: {0}")]
    Busy(String),
}

impl From<minreq::Error> for AppError {
    fn from(err: minreq::Error) -> Self {
        match err {
            minreq::Error::SerdeJsonError(e) => AppError::MalformedResponse(e.to_string()),
            other => AppError::Transport(other.to_string()),
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Transport(_) => ErrorKind::Transport,
            AppError::Server(_) => ErrorKind::Server,
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::MalformedResponse(_) | AppError::Json(_) => ErrorKind::Malformed,
            AppError::Io(_) | AppError::Storage(_) => ErrorKind::Storage,
            AppError::UnknownPreset(_)
            | AppError::UnknownTemplate(_)
            | AppError::InvalidTransition(_)
            | AppError::Busy(_) => ErrorKind::Session,
        }
    }

    /// Text shown in the status bar.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(_) => "Could not reach the rendering server. Please try again.".to_string(),
            AppError::Server(msg) => format!("Error: {}", msg),
            AppError::Timeout(_) => "The server took too long to respond. Please try again.".to_string(),
            AppError::MalformedResponse(_) | AppError::Json(_) => {
                "The server sent an unexpected response.".to_string()
            }
            AppError::Io(e) => format!("File error: {}", e),
            AppError::Storage(msg) => format!("Storage error: {}", msg),
            AppError::UnknownPreset(name) => format!("Unknown preset \"{}\"", name),
            AppError::UnknownTemplate(name) => format!("Unknown template \"{}\"", name),
            AppError::InvalidTransition(msg) | AppError::Busy(msg) => msg.clone(),
        }
    }
}

/// Convenience type alias for Results with AppError
pub type Result<T> = std::result::Result<T, AppError>;
