use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    #[error("Seat not found")]
    SeatNotFound,

    #[error("No open session on this seat")]
    NoOpenSession,

    #[error("Unknown action {0}")]
    UnknownAction(String),
}

impl SeatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SeatError::SeatNotFound => StatusCode::NOT_FOUND,
            SeatError::NoOpenSession => StatusCode::CONFLICT,
            SeatError::UnknownAction(_) => StatusCode::BAD_REQUEST,
        }
    }
}
