// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub appointment_type: String,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// A freshly booked appointment in `REQUESTED` state.
    pub fn requested(
        doctor_id: Uuid,
        patient_id: Uuid,
        slot: TimeSlot,
        appointment_type: String,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            date: slot.start_time.date_naive(),
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: AppointmentStatus::Requested,
            appointment_type,
            notes,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    /// Active appointments occupy their slot; cancelled ones never block.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Requested | AppointmentStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Requested => "REQUESTED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==============================================================================
// TIME SLOTS
// ==============================================================================

/// Half-open `[start_time, end_time)` interval on the absolute timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self { start_time, end_time }
    }

    /// Slot on `date` between two times of day, interpreted as UTC.
    pub fn on(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start_time: date.and_time(start).and_utc(),
            end_time: date.and_time(end).and_utc(),
        }
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        intervals_overlap(self.start_time, self.end_time, other.start_time, other.end_time)
    }
}

/// Half-open interval intersection. Touching intervals do not overlap.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    /// Required when an admin books on behalf of a patient; patients may omit it.
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    pub date: String,
    pub time: String,
    pub appointment_type: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub limit: Option<i32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not allowed to access this appointment")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor is not available at the requested time")]
    SlotUnavailable,

    #[error("Time slot is already booked")]
    SlotTaken,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for AppointmentError {
    fn from(e: DatabaseError) -> Self {
        match e {
            // Storage-level uniqueness/exclusion violation on the doctor's interval.
            DatabaseError::Conflict(_) => AppointmentError::SlotTaken,
            DatabaseError::NotFound(_) => AppointmentError::NotFound,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::ValidationError(msg) => AppointmentError::ValidationError(msg),
            DoctorError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::Unauthorized => AppError::Auth(e.to_string()),
            AppointmentError::Forbidden => AppError::Forbidden(e.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::NotFound => AppError::NotFound(e.to_string()),
            AppointmentError::SlotUnavailable => AppError::Unprocessable(e.to_string()),
            AppointmentError::SlotTaken | AppointmentError::InvalidStatusTransition(_) => {
                AppError::Conflict(e.to_string())
            }
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
