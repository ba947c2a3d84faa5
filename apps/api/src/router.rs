use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::{appointment_routes, slot_routes};
use appointment_cell::services::{BookingService, SlotService};
use doctor_cell::router::doctor_routes;
use doctor_cell::services::ScheduleService;

pub struct Services {
    pub schedule: Arc<ScheduleService>,
    pub booking: Arc<BookingService>,
    pub slots: Arc<SlotService>,
}

pub fn create_router(services: Services) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest(
            "/doctors",
            doctor_routes(services.schedule).merge(slot_routes(services.slots)),
        )
        .nest("/appointments", appointment_routes(services.booking))
}
