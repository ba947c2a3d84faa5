use axum::{
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use http::HeaderMap;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;

// Identity headers forwarded by the authenticating gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const PATIENT_ID_HEADER: &str = "x-patient-id";
pub const DOCTOR_ID_HEADER: &str = "x-doctor-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()))
            .map_err(|_| AppError::Auth(format!("Invalid {} header", name))),
    }
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, AppError> {
    header_str(headers, name)?
        .map(|raw| {
            Uuid::parse_str(raw).map_err(|_| AppError::Auth(format!("Invalid {} header", name)))
        })
        .transpose()
}

/// Builds the caller identity from trusted gateway headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user_id = header_uuid(headers, USER_ID_HEADER)?
        .ok_or_else(|| AppError::Auth("Missing identity".to_string()))?;

    let role: Role = header_str(headers, USER_ROLE_HEADER)?
        .ok_or_else(|| AppError::Auth("Missing role".to_string()))?
        .parse()
        .map_err(AppError::Auth)?;

    let patient_id = header_uuid(headers, PATIENT_ID_HEADER)?;
    let doctor_id = header_uuid(headers, DOCTOR_ID_HEADER)?;

    match role {
        Role::Patient if patient_id.is_none() => {
            return Err(AppError::Auth("Patient identity without patient id".to_string()));
        }
        Role::Doctor if doctor_id.is_none() => {
            return Err(AppError::Auth("Doctor identity without doctor id".to_string()));
        }
        _ => {}
    }

    Ok(Actor {
        user_id,
        role,
        patient_id,
        doctor_id,
    })
}

// Middleware for identity - rejects the request before it reaches a handler
pub async fn identity_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let actor = actor_from_headers(request.headers())?;
    debug!("Request identity: user {} as {}", actor.user_id, actor.role);

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

// Function to extract the actor from request extensions
pub fn extract_actor<B>(request: &Request<B>) -> Result<Actor, AppError> {
    request
        .extensions()
        .get::<Actor>()
        .cloned()
        .ok_or_else(|| AppError::Auth("Identity not found in request extensions".to_string()))
}
