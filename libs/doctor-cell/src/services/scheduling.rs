use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use security_cell::{AuditEntry, AuditEventType, AuditOutcome, AuditRecorder};
use shared_models::auth::Actor;

use crate::models::{
    AvailabilityWindow, CreateAvailabilityRequest, DoctorError, UpdateAvailabilityRequest,
};
use crate::store::AvailabilityStore;
use crate::validation::{parse_time_of_day, validate_day_of_week};

/// Doctor/admin management of recurring availability windows.
pub struct ScheduleService {
    store: Arc<dyn AvailabilityStore>,
    audit: Arc<dyn AuditRecorder>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn AvailabilityStore>, audit: Arc<dyn AuditRecorder>) -> Self {
        Self { store, audit }
    }

    pub async fn list_windows(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Fetching availability for doctor: {}", doctor_id);
        Ok(self.store.windows_for_doctor(doctor_id).await?)
    }

    pub async fn create_window(
        &self,
        actor: &Actor,
        doctor_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, DoctorError> {
        debug!("Creating availability for doctor: {}", doctor_id);

        if !actor.can_manage_doctor(doctor_id) {
            warn!("User {} may not manage availability of doctor {}", actor.user_id, doctor_id);
            return Err(DoctorError::Forbidden);
        }

        validate_day_of_week(request.day_of_week).map_err(DoctorError::ValidationError)?;
        let start_time = parse_time_of_day(&request.start_time).map_err(DoctorError::ValidationError)?;
        let end_time = parse_time_of_day(&request.end_time).map_err(DoctorError::ValidationError)?;
        validate_range(start_time, end_time)?;

        self.check_overlap(doctor_id, request.day_of_week, start_time, end_time, None)
            .await?;

        let mut window = AvailabilityWindow::new(doctor_id, request.day_of_week, start_time, end_time);
        window.is_available = request.is_available.unwrap_or(true);

        let window = self.store.insert(window).await?;
        info!("Availability {} created for doctor {}", window.id, doctor_id);

        self.audit_change(AuditEventType::AvailabilityCreated, actor, &window).await;
        Ok(window)
    }

    pub async fn update_window(
        &self,
        actor: &Actor,
        doctor_id: Uuid,
        window_id: Uuid,
        request: UpdateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, DoctorError> {
        debug!("Updating availability: {}", window_id);

        let mut window = self
            .store
            .get(window_id)
            .await?
            .filter(|w| w.doctor_id == doctor_id)
            .ok_or(DoctorError::NotFound)?;

        if !actor.can_manage_doctor(doctor_id) {
            warn!("User {} may not manage availability of doctor {}", actor.user_id, doctor_id);
            return Err(DoctorError::Forbidden);
        }

        let start_time = match request.start_time.as_deref() {
            Some(raw) => parse_time_of_day(raw).map_err(DoctorError::ValidationError)?,
            None => window.start_time,
        };
        let end_time = match request.end_time.as_deref() {
            Some(raw) => parse_time_of_day(raw).map_err(DoctorError::ValidationError)?,
            None => window.end_time,
        };
        validate_range(start_time, end_time)?;

        if start_time != window.start_time || end_time != window.end_time {
            self.check_overlap(doctor_id, window.day_of_week, start_time, end_time, Some(window.id))
                .await?;
        }

        window.start_time = start_time;
        window.end_time = end_time;
        if let Some(is_available) = request.is_available {
            window.is_available = is_available;
        }
        window.updated_at = Utc::now();

        let window = self.store.update(window).await?;
        info!("Availability {} updated for doctor {}", window.id, doctor_id);

        self.audit_change(AuditEventType::AvailabilityModified, actor, &window).await;
        Ok(window)
    }

    async fn check_overlap(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> Result<(), DoctorError> {
        let existing = self.store.windows_for_doctor(doctor_id).await?;
        let clash = existing
            .iter()
            .filter(|w| w.day_of_week == day_of_week && Some(w.id) != exclude_id)
            .any(|w| w.overlaps(start_time, end_time));

        if clash {
            return Err(DoctorError::OverlappingWindow);
        }
        Ok(())
    }

    async fn audit_change(&self, event_type: AuditEventType, actor: &Actor, window: &AvailabilityWindow) {
        let entry = AuditEntry::new(event_type, AuditOutcome::Success)
            .with_user(actor.user_id)
            .with_resource("availability", window.id)
            .add_context("doctorId", window.doctor_id)
            .add_context("dayOfWeek", window.day_of_week)
            .add_context("startTime", window.start_time.format("%H:%M").to_string())
            .add_context("endTime", window.end_time.format("%H:%M").to_string())
            .add_context("isAvailable", window.is_available);

        if let Err(e) = self.audit.record(entry).await {
            warn!("Failed to record audit entry for availability {}: {}", window.id, e);
        }
    }
}

fn validate_range(start_time: NaiveTime, end_time: NaiveTime) -> Result<(), DoctorError> {
    if start_time >= end_time {
        return Err(DoctorError::ValidationError(
            "Start time must be before end time".to_string(),
        ));
    }
    Ok(())
}
