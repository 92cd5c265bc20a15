use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handles::*;
use crate::services::SeatEngine;

pub fn create_app(engine: Arc<SeatEngine>) -> Router {
    let seats = Router::new()
        .route("/", get(get_seats))
        .route("/:device_id/checkout", post(checkout_seat))
        .route("/:device_id/maintenance", post(set_seat_maintenance))
        .route("/:device_id/command/:action", post(send_seat_command))
        .with_state(SeatState {
            engine: engine.clone(),
        });

    let rate = Router::new()
        .route("/", get(get_rate).put(update_rate))
        .with_state(RateState {
            engine: engine.clone(),
        });

    let users = Router::new()
        .route("/:card_uid/recharge", post(recharge_user))
        .with_state(UserState {
            engine: engine.clone(),
        });

    Router::new()
        .nest("/seats", seats)
        .nest("/rate", rate)
        .nest("/users", users)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
