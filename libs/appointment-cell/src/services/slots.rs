use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use doctor_cell::models::{slot_end, AvailabilityWindow, MINUTES_PER_DAY};
use doctor_cell::services::AvailabilityService;
use shared_config::AppConfig;

use crate::models::{AppointmentError, TimeSlot};
use crate::store::AppointmentStore;

/// Enumerates bookable slots for a doctor's day. Read-only; every call is
/// recomputed from the stores, so results may go stale before a booking.
pub struct SlotService {
    availability: Arc<AvailabilityService>,
    appointments: Arc<dyn AppointmentStore>,
    default_duration_minutes: i64,
}

impl SlotService {
    pub fn new(
        availability: Arc<AvailabilityService>,
        appointments: Arc<dyn AppointmentStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            availability,
            appointments,
            default_duration_minutes: config.slot_duration_minutes,
        }
    }

    pub async fn list_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        duration_minutes: Option<i64>,
    ) -> Result<Vec<TimeSlot>, AppointmentError> {
        let duration = duration_minutes.unwrap_or(self.default_duration_minutes);
        if !(1..MINUTES_PER_DAY).contains(&duration) {
            return Err(AppointmentError::ValidationError(format!(
                "Slot duration must be between 1 and {} minutes",
                MINUTES_PER_DAY - 1
            )));
        }

        let windows = self.availability.windows_for_date(doctor_id, date).await?;
        if windows.is_empty() {
            debug!("Doctor {} has no availability on {}", doctor_id, date);
            return Ok(Vec::new());
        }

        let booked: Vec<TimeSlot> = self
            .appointments
            .active_for_doctor_on(doctor_id, date)
            .await?
            .iter()
            .map(|a| a.slot())
            .collect();

        let slots = enumerate_slots(date, &windows, &booked, duration);
        debug!(
            "Doctor {} has {} free slots on {} ({} windows, {} booked)",
            doctor_id,
            slots.len(),
            date,
            windows.len(),
            booked.len()
        );
        Ok(slots)
    }
}

/// Walks each window in `duration_minutes` steps, keeping the slots that fit
/// inside the window and overlap nothing in `booked`. Window order is kept.
pub fn enumerate_slots(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    booked: &[TimeSlot],
    duration_minutes: i64,
) -> Vec<TimeSlot> {
    let mut slots = Vec::new();

    for window in windows.iter().filter(|w| w.is_available) {
        let mut cursor = window.start_time;
        while let Some(end) = slot_end(cursor, duration_minutes) {
            if end > window.end_time {
                break;
            }
            let candidate = TimeSlot::on(date, cursor, end);
            if !booked.iter().any(|b| b.overlaps(&candidate)) {
                slots.push(candidate);
            }
            cursor = end;
        }
    }

    slots
}
