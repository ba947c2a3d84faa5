use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{CreateAvailabilityRequest, UpdateAvailabilityRequest};
use crate::services::ScheduleService;

// ==============================================================================
// PUBLIC HANDLERS (NO IDENTITY REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(service): State<Arc<ScheduleService>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let windows = service.list_windows(doctor_id).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "availability": windows,
        "total": windows.len()
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_availability(
    State(service): State<Arc<ScheduleService>>,
    Path(doctor_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let window = service.create_window(&actor, doctor_id, request).await?;

    Ok((StatusCode::CREATED, Json(json!(window))))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(service): State<Arc<ScheduleService>>,
    Path((doctor_id, availability_id)): Path<(Uuid, Uuid)>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let window = service
        .update_window(&actor, doctor_id, availability_id, request)
        .await?;

    Ok(Json(json!(window)))
}
