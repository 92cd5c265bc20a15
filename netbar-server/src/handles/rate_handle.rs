use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use netbar_api::Money;
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, SettingError};
use crate::services::SeatEngine;

#[derive(Clone)]
pub struct RateState {
    pub engine: Arc<SeatEngine>,
}

/// Currency per minute, as a decimal string.
#[derive(Clone, Serialize, Deserialize)]
pub struct RateBody {
    pub rate: Money,
}

pub async fn get_rate(State(state): State<RateState>) -> Result<Json<RateBody>, ApiError> {
    let rate = state.engine.rate().await?;

    Ok(Json(RateBody { rate }))
}

pub async fn update_rate(
    State(state): State<RateState>,
    Json(body): Json<RateBody>,
) -> Result<Json<RateBody>, ApiError> {
    if body.rate.is_negative() {
        return Err(SettingError::InvalidRate.into());
    }

    state.engine.set_rate(body.rate).await?;

    Ok(Json(body))
}
