use crate::services::MapServices;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router<S: MapServices + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health::<S>))
        .route("/api/predict", post(handlers::post_predict::<S>))
        .route("/api/geocode", get(handlers::get_geocode::<S>))
        .route("/api/reverse", get(handlers::get_reverse::<S>))
        .route("/api/route", get(handlers::get_route::<S>))
        .route("/api/traffic", get(handlers::get_traffic))
        .with_state(state)
}
