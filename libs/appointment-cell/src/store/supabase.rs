use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{Appointment, AppointmentSearchQuery};
use super::AppointmentStore;

const TABLE: &str = "/rest/v1/appointments";
const DEFAULT_SEARCH_LIMIT: i32 = 50;

/// PostgREST `in.(...)` filter for statuses that occupy a slot.
fn active_status_filter() -> String {
    format!("status=in.{}", urlencoding::encode("(REQUESTED,CONFIRMED)"))
}

/// Appointments table behind PostgREST. A 409 from the exclusion constraint on
/// active intervals surfaces as `DatabaseError::Conflict`.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let path = format!("{}?id=eq.{}", TABLE, appointment_id);
        let rows: Vec<Appointment> = self.supabase.rows(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn active_for_doctor(
        &self,
        doctor_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let mut path = format!(
            "{}?doctor_id=eq.{}&{}",
            TABLE,
            doctor_id,
            active_status_filter()
        );
        if let Some(exclude_id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", exclude_id));
        }
        path.push_str("&order=start_time.asc");

        self.supabase.rows(Method::GET, &path, None).await
    }

    async fn active_for_doctor_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let path = format!(
            "{}?doctor_id=eq.{}&date=eq.{}&{}&order=start_time.asc",
            TABLE,
            doctor_id,
            date,
            active_status_filter()
        );
        self.supabase.rows(Method::GET, &path, None).await
    }

    async fn search(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError> {
        let mut filters = Vec::new();

        if let Some(doctor_id) = query.doctor_id {
            filters.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(patient_id) = query.patient_id {
            filters.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(date) = query.date {
            filters.push(format!("date=eq.{}", date));
        }
        if let Some(status) = query.status {
            filters.push(format!("status=eq.{}", status));
        }
        filters.push("order=start_time.asc".to_string());
        filters.push(format!("limit={}", query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT)));

        let path = format!("{}?{}", TABLE, filters.join("&"));
        self.supabase.rows(Method::GET, &path, None).await
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DatabaseError> {
        debug!(
            "Inserting appointment {} for doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.start_time
        );
        let body = serde_json::to_value(&appointment)?;
        let rows: Vec<Appointment> = self.supabase.rows(Method::POST, TABLE, Some(body)).await?;
        rows.into_iter().next().ok_or_else(|| DatabaseError::Api {
            status: 200,
            message: "insert returned no representation".to_string(),
        })
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, DatabaseError> {
        let path = format!("{}?id=eq.{}", TABLE, appointment.id);
        let body = json!({
            "date": appointment.date,
            "start_time": appointment.start_time.to_rfc3339(),
            "end_time": appointment.end_time.to_rfc3339(),
            "status": appointment.status,
            "cancel_reason": appointment.cancel_reason,
            "updated_at": appointment.updated_at.to_rfc3339(),
        });
        let rows: Vec<Appointment> = self.supabase.rows(Method::PATCH, &path, Some(body)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound(format!("appointment {}", appointment.id)))
    }
}
