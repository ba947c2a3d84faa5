// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::identity_middleware;

use crate::handlers;
use crate::services::{BookingService, SlotService};

pub fn appointment_routes(service: Arc<BookingService>) -> Router {
    // All appointment operations require an identity
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::search_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/reschedule", post(handlers::reschedule_appointment))
        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(service)
}

/// Public slot listing, mounted under `/doctors` next to the doctor routes.
pub fn slot_routes(service: Arc<SlotService>) -> Router {
    Router::new()
        .route("/{doctor_id}/available-slots", get(handlers::list_available_slots))
        .with_state(service)
}
