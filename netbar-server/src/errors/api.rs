use super::{EngineError, SeatError, SettingError, UserError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Seat error: {0}")]
    SeatError(#[from] SeatError),

    #[error("Setting error: {0}")]
    SettingError(#[from] SettingError),

    #[error("User error: {0}")]
    UserError(#[from] UserError),

    #[error("Engine error: {0}")]
    EngineError(#[from] EngineError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
