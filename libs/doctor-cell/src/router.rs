use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_utils::extractor::identity_middleware;

use crate::handlers;
use crate::services::ScheduleService;

pub fn doctor_routes(service: Arc<ScheduleService>) -> Router {
    // Public routes (no identity required)
    let public_routes = Router::new()
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability));

    // Protected routes (identity required)
    let protected_routes = Router::new()
        .route("/{doctor_id}/availability", post(handlers::create_availability))
        .route(
            "/{doctor_id}/availability/{availability_id}",
            patch(handlers::update_availability),
        )
        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(service)
}
