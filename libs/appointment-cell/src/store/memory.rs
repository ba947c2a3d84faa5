use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::{Appointment, AppointmentSearchQuery};
use super::AppointmentStore;

const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_start(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by_key(|a| a.start_time);
    appointments
}

fn interval_taken(existing: &HashMap<Uuid, Appointment>, candidate: &Appointment) -> bool {
    candidate.is_active()
        && existing.values().any(|other| {
            other.id != candidate.id
                && other.doctor_id == candidate.doctor_id
                && other.is_active()
                && other.slot().overlaps(&candidate.slot())
        })
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self.appointments.read().await.get(&appointment_id).cloned())
    }

    async fn active_for_doctor(
        &self,
        doctor_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let appointments = self.appointments.read().await;
        Ok(by_start(
            appointments
                .values()
                .filter(|a| a.doctor_id == doctor_id && a.is_active() && Some(a.id) != exclude_id)
                .cloned()
                .collect(),
        ))
    }

    async fn active_for_doctor_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let appointments = self.appointments.read().await;
        Ok(by_start(
            appointments
                .values()
                .filter(|a| a.doctor_id == doctor_id && a.date == date && a.is_active())
                .cloned()
                .collect(),
        ))
    }

    async fn search(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError> {
        let appointments = self.appointments.read().await;
        let limit = query
            .limit
            .map(|l| l.max(0) as usize)
            .unwrap_or(DEFAULT_SEARCH_LIMIT);

        let mut matches = by_start(
            appointments
                .values()
                .filter(|a| query.doctor_id.map_or(true, |id| a.doctor_id == id))
                .filter(|a| query.patient_id.map_or(true, |id| a.patient_id == id))
                .filter(|a| query.date.map_or(true, |d| a.date == d))
                .filter(|a| query.status.map_or(true, |s| a.status == s))
                .cloned()
                .collect(),
        );
        matches.truncate(limit);
        Ok(matches)
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DatabaseError> {
        let mut appointments = self.appointments.write().await;
        if appointments.contains_key(&appointment.id) {
            return Err(DatabaseError::Conflict(format!("appointment {} already exists", appointment.id)));
        }
        if interval_taken(&appointments, &appointment) {
            return Err(DatabaseError::Conflict(format!(
                "doctor {} already has an appointment at {}",
                appointment.doctor_id, appointment.start_time
            )));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, DatabaseError> {
        let mut appointments = self.appointments.write().await;
        if !appointments.contains_key(&appointment.id) {
            return Err(DatabaseError::NotFound(format!("appointment {}", appointment.id)));
        }
        if interval_taken(&appointments, &appointment) {
            return Err(DatabaseError::Conflict(format!(
                "doctor {} already has an appointment at {}",
                appointment.doctor_id, appointment.start_time
            )));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }
}
