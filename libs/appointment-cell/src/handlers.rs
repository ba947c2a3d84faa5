// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::validation::parse_date;
use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{
    AppointmentSearchQuery, BookAppointmentRequest, CancelAppointmentRequest,
    RescheduleAppointmentRequest,
};
use crate::services::{BookingService, SlotService};

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: String,
    pub duration_minutes: Option<u16>,
}

// ==============================================================================
// PUBLIC HANDLERS (NO IDENTITY REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn list_available_slots(
    State(service): State<Arc<SlotService>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&query.date).map_err(AppError::ValidationError)?;

    let slots = service
        .list_available_slots(doctor_id, date, query.duration_minutes.map(i64::from))
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": date,
        "slots": slots,
        "total": slots.len()
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<BookingService>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = service.book_appointment(&actor, request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(service): State<Arc<BookingService>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.search_appointments(&actor, query).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get_appointment(&actor, appointment_id).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service
        .cancel_appointment(&actor, appointment_id, request)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(service): State<Arc<BookingService>>,
    Path(appointment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service
        .reschedule_appointment(&actor, appointment_id, request)
        .await?;

    Ok(Json(json!(appointment)))
}
