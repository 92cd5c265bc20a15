use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use netbar_api::Money;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::{ApiError, UserError};
use crate::services::SeatEngine;

#[derive(Clone)]
pub struct UserState {
    pub engine: Arc<SeatEngine>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RechargeBody {
    pub amount: Money,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub card_uid: String,
    pub balance: Money,
}

pub async fn recharge_user(
    State(state): State<UserState>,
    Path(card_uid): Path<String>,
    Json(body): Json<RechargeBody>,
) -> Result<Json<BalanceResponse>, ApiError> {
    if !body.amount.is_positive() {
        return Err(UserError::InvalidAmount.into());
    }

    let card_uid = card_uid.trim().to_ascii_uppercase();
    let balance = state
        .engine
        .recharge(&card_uid, body.amount, OffsetDateTime::now_utc())
        .await?
        .ok_or(UserError::UserNotFound)?;

    Ok(Json(BalanceResponse { card_uid, balance }))
}
