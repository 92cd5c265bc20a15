use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SettingError {
    #[error("Rate must not be negative")]
    InvalidRate,
}

impl SettingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SettingError::InvalidRate => StatusCode::BAD_REQUEST,
        }
    }
}
