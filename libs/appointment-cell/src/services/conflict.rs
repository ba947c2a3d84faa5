use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{intervals_overlap, Appointment, AppointmentError};
use crate::store::AppointmentStore;

pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// True if any active appointment of the doctor overlaps `[start_time, end_time)`.
    /// `exclude_appointment_id` lets a reschedule ignore the appointment being moved.
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        let conflicts = self
            .conflicting_appointments(doctor_id, start_time, end_time, exclude_appointment_id)
            .await?;
        Ok(!conflicts.is_empty())
    }

    pub async fn conflicting_appointments(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!(
            "Checking conflicts for doctor {} from {} to {}",
            doctor_id, start_time, end_time
        );

        let existing = self
            .store
            .active_for_doctor(doctor_id, exclude_appointment_id)
            .await?;

        let conflicts: Vec<Appointment> = existing
            .into_iter()
            .filter(|a| a.is_active())
            .filter(|a| intervals_overlap(a.start_time, a.end_time, start_time, end_time))
            .collect();

        if !conflicts.is_empty() {
            warn!(
                "Conflict detected for doctor {} - {} conflicting appointments",
                doctor_id,
                conflicts.len()
            );
        }

        Ok(conflicts)
    }
}
