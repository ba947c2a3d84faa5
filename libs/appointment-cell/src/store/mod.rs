use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::{Appointment, AppointmentSearchQuery};

mod memory;
mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

/// Persistence for booked appointments.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    /// REQUESTED/CONFIRMED appointments of the doctor, optionally leaving one out.
    async fn active_for_doctor(
        &self,
        doctor_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    /// REQUESTED/CONFIRMED appointments of the doctor on one calendar date, by start time.
    async fn active_for_doctor_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    async fn search(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when another active appointment of the
    /// same doctor already occupies an overlapping interval.
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DatabaseError>;

    /// Same interval guard as `insert`, ignoring the appointment being updated.
    async fn update(&self, appointment: Appointment) -> Result<Appointment, DatabaseError>;
}
