// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::models::slot_end;
use doctor_cell::services::AvailabilityService;
use doctor_cell::validation::{parse_date, parse_time_of_day};
use security_cell::{AuditEntry, AuditEventType, AuditOutcome, AuditRecorder};
use shared_config::AppConfig;
use shared_models::auth::{Actor, Role};

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    BookAppointmentRequest, CancelAppointmentRequest, RescheduleAppointmentRequest, TimeSlot,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::consistency::SchedulingLocks;
use crate::store::AppointmentStore;

const MIN_CANCEL_REASON_LENGTH: usize = 10;
const MAX_SEARCH_LIMIT: i32 = 100;

pub struct BookingService {
    store: Arc<dyn AppointmentStore>,
    availability: Arc<AvailabilityService>,
    conflict_service: ConflictDetectionService,
    locks: SchedulingLocks,
    audit: Arc<dyn AuditRecorder>,
    slot_duration_minutes: i64,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        availability: Arc<AvailabilityService>,
        audit: Arc<dyn AuditRecorder>,
        config: &AppConfig,
    ) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(Arc::clone(&store)),
            store,
            availability,
            locks: SchedulingLocks::new(),
            audit,
            slot_duration_minutes: config.slot_duration_minutes,
        }
    }

    /// Books a REQUESTED appointment after the availability and conflict checks,
    /// both taken under the doctor's scheduling lock.
    #[instrument(skip(self, actor, request), fields(user_id = %actor.user_id, doctor_id = %request.doctor_id))]
    pub async fn book_appointment(
        &self,
        actor: &Actor,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let patient_id = self.resolve_patient(actor, request.patient_id)?;

        let date = parse_date(&request.date).map_err(AppointmentError::ValidationError)?;
        let time = parse_time_of_day(&request.time).map_err(AppointmentError::ValidationError)?;
        let appointment_type = request.appointment_type.trim();
        if appointment_type.is_empty() {
            return Err(AppointmentError::ValidationError(
                "Appointment type is required".to_string(),
            ));
        }
        let slot = self.slot_for(date, time)?;

        let guard = self.locks.acquire(request.doctor_id).await;
        self.ensure_bookable(request.doctor_id, date, time, slot, None).await?;

        let appointment = Appointment::requested(
            request.doctor_id,
            patient_id,
            slot,
            appointment_type.to_string(),
            request.notes.filter(|n| !n.trim().is_empty()),
        );
        let appointment = self.store.insert(appointment).await?;
        drop(guard);

        info!(
            "Appointment {} booked for patient {} with doctor {} at {}",
            appointment.id, patient_id, appointment.doctor_id, appointment.start_time
        );

        self.audit_event(
            AuditEntry::new(AuditEventType::AppointmentBooked, AuditOutcome::Success)
                .with_user(actor.user_id)
                .with_resource("appointment", appointment.id)
                .add_context("doctorId", appointment.doctor_id)
                .add_context("date", date.to_string())
                .add_context("time", time.format("%H:%M").to_string()),
        )
        .await;

        Ok(appointment)
    }

    /// Cancels the appointment. Cancelling an already cancelled appointment
    /// returns it unchanged and writes no audit record.
    #[instrument(skip(self, actor, request), fields(user_id = %actor.user_id))]
    pub async fn cancel_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let reason = match request.reason.map(|r| r.trim().to_string()) {
            Some(r) if r.is_empty() => None,
            Some(r) if r.chars().count() < MIN_CANCEL_REASON_LENGTH => {
                return Err(AppointmentError::ValidationError(format!(
                    "Cancellation reason must be at least {} characters",
                    MIN_CANCEL_REASON_LENGTH
                )));
            }
            other => other,
        };

        let appointment = self.load(appointment_id).await?;
        self.authorize(actor, &appointment)?;

        let guard = self.locks.acquire(appointment.doctor_id).await;
        let mut appointment = self.load(appointment_id).await?;

        if appointment.status == AppointmentStatus::Cancelled {
            debug!("Appointment {} already cancelled", appointment_id);
            return Ok(appointment);
        }

        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancel_reason = reason.clone();
        appointment.updated_at = Utc::now();

        let appointment = self.store.update(appointment).await?;
        drop(guard);

        info!("Appointment {} cancelled by user {}", appointment.id, actor.user_id);

        self.audit_event(
            AuditEntry::new(AuditEventType::AppointmentCancelled, AuditOutcome::Success)
                .with_user(actor.user_id)
                .with_resource("appointment", appointment.id)
                .add_context("reason", reason),
        )
        .await;

        Ok(appointment)
    }

    /// Moves the appointment to a new slot and resets it to REQUESTED. The
    /// appointment's own current interval is ignored by the conflict check.
    #[instrument(skip(self, actor, request), fields(user_id = %actor.user_id))]
    pub async fn reschedule_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let date = parse_date(&request.date).map_err(AppointmentError::ValidationError)?;
        let time = parse_time_of_day(&request.time).map_err(AppointmentError::ValidationError)?;

        let appointment = self.load(appointment_id).await?;
        self.authorize(actor, &appointment)?;
        let slot = self.slot_for(date, time)?;

        let guard = self.locks.acquire(appointment.doctor_id).await;
        let mut appointment = self.load(appointment_id).await?;

        if appointment.status == AppointmentStatus::Cancelled {
            warn!("Refusing to reschedule cancelled appointment {}", appointment_id);
            return Err(AppointmentError::InvalidStatusTransition(appointment.status));
        }

        self.ensure_bookable(appointment.doctor_id, date, time, slot, Some(appointment.id))
            .await?;

        appointment.date = date;
        appointment.start_time = slot.start_time;
        appointment.end_time = slot.end_time;
        appointment.status = AppointmentStatus::Requested;
        appointment.updated_at = Utc::now();

        let appointment = self.store.update(appointment).await?;
        drop(guard);

        info!(
            "Appointment {} rescheduled to {} by user {}",
            appointment.id, appointment.start_time, actor.user_id
        );

        self.audit_event(
            AuditEntry::new(AuditEventType::AppointmentRescheduled, AuditOutcome::Success)
                .with_user(actor.user_id)
                .with_resource("appointment", appointment.id)
                .add_context("newDate", date.to_string())
                .add_context("newTime", time.format("%H:%M").to_string()),
        )
        .await;

        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        self.authorize(actor, &appointment)?;
        Ok(appointment)
    }

    /// Patients and doctors only ever see their own appointments; admins may filter freely.
    pub async fn search_appointments(
        &self,
        actor: &Actor,
        mut query: AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        match actor.role {
            Role::Admin => {}
            Role::Patient => {
                query.patient_id = Some(actor.patient_id.ok_or(AppointmentError::Forbidden)?);
            }
            Role::Doctor => {
                query.doctor_id = Some(actor.doctor_id.ok_or(AppointmentError::Forbidden)?);
            }
        }
        query.limit = Some(query.limit.unwrap_or(50).clamp(1, MAX_SEARCH_LIMIT));

        debug!("Searching appointments with filters: {:?}", query);
        Ok(self.store.search(&query).await?)
    }

    // ==========================================================================
    // HELPERS
    // ==========================================================================

    fn resolve_patient(&self, actor: &Actor, requested: Option<Uuid>) -> Result<Uuid, AppointmentError> {
        match actor.role {
            Role::Patient => {
                let own = actor.patient_id.ok_or(AppointmentError::Forbidden)?;
                match requested {
                    Some(other) if other != own => {
                        warn!("Patient {} tried to book for patient {}", own, other);
                        Err(AppointmentError::Forbidden)
                    }
                    _ => Ok(own),
                }
            }
            Role::Admin => requested.ok_or_else(|| {
                AppointmentError::ValidationError(
                    "patient_id is required when booking on behalf of a patient".to_string(),
                )
            }),
            Role::Doctor => {
                warn!("Doctor user {} attempted to book an appointment", actor.user_id);
                Err(AppointmentError::Forbidden)
            }
        }
    }

    fn authorize(&self, actor: &Actor, appointment: &Appointment) -> Result<(), AppointmentError> {
        if actor.is_admin()
            || actor.is_patient(appointment.patient_id)
            || actor.is_doctor(appointment.doctor_id)
        {
            return Ok(());
        }
        warn!(
            "User {} ({}) denied access to appointment {}",
            actor.user_id, actor.role, appointment.id
        );
        Err(AppointmentError::Forbidden)
    }

    fn slot_for(&self, date: NaiveDate, time: NaiveTime) -> Result<TimeSlot, AppointmentError> {
        let end = slot_end(time, self.slot_duration_minutes).ok_or_else(|| {
            AppointmentError::ValidationError(
                "Appointment must start and end on the same day".to_string(),
            )
        })?;
        Ok(TimeSlot::on(date, time, end))
    }

    async fn ensure_bookable(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        slot: TimeSlot,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        let end = slot.end_time.time();
        if !self.availability.is_available(doctor_id, date, time, end).await? {
            warn!("Doctor {} not available on {} at {}", doctor_id, date, time.format("%H:%M"));
            return Err(AppointmentError::SlotUnavailable);
        }

        if self
            .conflict_service
            .has_conflict(doctor_id, slot.start_time, slot.end_time, exclude_appointment_id)
            .await?
        {
            warn!("Slot {} already taken for doctor {}", slot.start_time, doctor_id);
            return Err(AppointmentError::SlotTaken);
        }

        Ok(())
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    async fn audit_event(&self, entry: AuditEntry) {
        let action = entry.action.clone();
        if let Err(e) = self.audit.record(entry).await {
            warn!("Failed to record {} audit entry: {}", action, e);
        }
    }
}
