use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use netbar_api::message::Command;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::{ApiError, EngineError, SeatError};
use crate::services::{SeatEngine, SeatView, SettledSession};

#[derive(Clone)]
pub struct SeatState {
    pub engine: Arc<SeatEngine>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MaintenanceBody {
    pub enabled: bool,
}

fn seat_error(error: EngineError) -> ApiError {
    match error {
        EngineError::UnknownDevice(_) => SeatError::SeatNotFound.into(),
        error => error.into(),
    }
}

pub async fn get_seats(State(state): State<SeatState>) -> Result<Json<Vec<SeatView>>, ApiError> {
    let seats = state.engine.seats(OffsetDateTime::now_utc()).await?;

    Ok(Json(seats))
}

pub async fn checkout_seat(
    State(state): State<SeatState>,
    Path(device_id): Path<String>,
) -> Result<Json<SettledSession>, ApiError> {
    let settled = state
        .engine
        .admin_checkout(&device_id, OffsetDateTime::now_utc())
        .await
        .map_err(seat_error)?
        .ok_or(SeatError::NoOpenSession)?;

    Ok(Json(settled))
}

pub async fn set_seat_maintenance(
    State(state): State<SeatState>,
    Path(device_id): Path<String>,
    Json(body): Json<MaintenanceBody>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .set_maintenance(&device_id, body.enabled)
        .await
        .map_err(seat_error)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_seat_command(
    State(state): State<SeatState>,
    Path((device_id, action)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let command = Command::from_action(&action).ok_or(SeatError::UnknownAction(action))?;

    state
        .engine
        .send_command(&device_id, command)
        .await
        .map_err(seat_error)?;

    Ok(StatusCode::ACCEPTED)
}
