use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use crate::models::{day_of_week, AvailabilityWindow, DoctorError};
use crate::store::AvailabilityStore;

/// Read side of the doctor's weekly schedule: answers "is this slot inside
/// declared hours" and "which windows apply on this date".
pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    /// True iff `[start_time, end_time)` fits entirely inside a single active
    /// window for the weekday of `date`. Adjacent windows are not joined.
    pub async fn is_available(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<bool, DoctorError> {
        let windows = self.windows_for_date(doctor_id, date).await?;
        let available = windows.iter().any(|w| w.contains(start_time, end_time));

        debug!(
            "Doctor {} {} on {} {}-{} ({} windows checked)",
            doctor_id,
            if available { "available" } else { "unavailable" },
            date,
            start_time.format("%H:%M"),
            end_time.format("%H:%M"),
            windows.len()
        );

        Ok(available)
    }

    /// Active windows for the weekday of `date`, ordered by start time.
    pub async fn windows_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let windows = self
            .store
            .windows_for_day(doctor_id, day_of_week(date))
            .await?;
        Ok(windows.into_iter().filter(|w| w.is_available).collect())
    }
}
