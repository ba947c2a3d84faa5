use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared_models::error::AppError;
use uuid::Uuid;

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// Recurring weekly window during which a doctor accepts appointments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityWindow {
    pub fn new(doctor_id: Uuid, day_of_week: i32, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week,
            start_time,
            end_time,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// `[start, end)` lies entirely inside this window and the window is active.
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.is_available && start < end && self.start_time <= start && end <= self.end_time
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start_time < end && start < self.end_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_available: Option<bool>,
}

// ==============================================================================
// TIME-OF-DAY ARITHMETIC
// ==============================================================================

/// Weekday index used by availability windows (0 = Sunday).
pub fn day_of_week(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// End of a slot that starts at `start` and lasts `minutes`.
///
/// Minutes carry into hours; `None` when the duration is not positive, is a
/// day or longer, or the slot would run past midnight into the next day.
pub fn slot_end(start: NaiveTime, minutes: i64) -> Option<NaiveTime> {
    if !(1..MINUTES_PER_DAY).contains(&minutes) {
        return None;
    }
    let (end, wrapped_seconds) = start.overflowing_add_signed(Duration::minutes(minutes));
    if wrapped_seconds != 0 {
        return None;
    }
    Some(end)
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Availability window not found")]
    NotFound,

    #[error("Not allowed to manage this doctor's availability")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Availability conflicts with existing schedule")]
    OverlappingWindow,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<shared_database::DatabaseError> for DoctorError {
    fn from(e: shared_database::DatabaseError) -> Self {
        match e {
            shared_database::DatabaseError::NotFound(_) => DoctorError::NotFound,
            other => DoctorError::DatabaseError(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppError::NotFound(e.to_string()),
            DoctorError::Forbidden => AppError::Forbidden(e.to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::OverlappingWindow => AppError::Conflict(e.to_string()),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
