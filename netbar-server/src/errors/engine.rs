use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Transport disconnected: {0}")]
    Transport(String),

    #[error("Unknown device {0}")]
    UnknownDevice(String),

    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl EngineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Transport(_) => StatusCode::BAD_GATEWAY,
            EngineError::UnknownDevice(_) => StatusCode::NOT_FOUND,
            EngineError::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
