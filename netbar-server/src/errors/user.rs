use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("Amount must be positive")]
    InvalidAmount,
}

impl UserError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserError::UserNotFound => StatusCode::NOT_FOUND,
            UserError::InvalidAmount => StatusCode::BAD_REQUEST,
        }
    }
}
