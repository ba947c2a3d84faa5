#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::models::BookAppointmentRequest;
use appointment_cell::services::{BookingService, SlotService};
use appointment_cell::store::{AppointmentStore, InMemoryAppointmentStore};
use doctor_cell::models::AvailabilityWindow;
use doctor_cell::services::AvailabilityService;
use doctor_cell::store::{AvailabilityStore, InMemoryAvailabilityStore};
use security_cell::AuditRecorder;
use shared_utils::test_utils::{hm, RecordingAuditor, TestConfig};

/// One doctor with in-memory stores and fully wired services.
pub struct Clinic {
    pub windows: Arc<InMemoryAvailabilityStore>,
    pub appointments: Arc<InMemoryAppointmentStore>,
    pub availability: Arc<AvailabilityService>,
    pub audit: Arc<RecordingAuditor>,
    pub booking: Arc<BookingService>,
    pub slots: Arc<SlotService>,
    pub doctor_id: Uuid,
}

impl Clinic {
    pub fn new() -> Self {
        let audit = RecordingAuditor::new();
        Self::build(audit.clone(), audit)
    }

    /// Same wiring, but audit records go to `recorder` instead of `audit`.
    pub fn with_recorder(recorder: Arc<dyn AuditRecorder>) -> Self {
        Self::build(RecordingAuditor::new(), recorder)
    }

    fn build(audit: Arc<RecordingAuditor>, recorder: Arc<dyn AuditRecorder>) -> Self {
        let config = TestConfig::default().to_app_config();
        let windows = Arc::new(InMemoryAvailabilityStore::new());
        let appointments = Arc::new(InMemoryAppointmentStore::new());
        let availability = Arc::new(AvailabilityService::new(windows.clone()));

        let booking = Arc::new(BookingService::new(
            appointments.clone(),
            availability.clone(),
            recorder,
            &config,
        ));
        let slots = Arc::new(SlotService::new(availability.clone(), appointments.clone(), &config));

        Self {
            windows,
            appointments,
            availability,
            audit,
            booking,
            slots,
            doctor_id: Uuid::new_v4(),
        }
    }

    /// A second orchestrator over the same stores, with its own lock table,
    /// standing in for another server process.
    pub fn second_process(&self) -> BookingService {
        let config = TestConfig::default().to_app_config();
        BookingService::new(
            self.appointments.clone(),
            self.availability.clone(),
            self.audit.clone(),
            &config,
        )
    }

    pub async fn open_window(&self, day_of_week: i32, start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
        let window = AvailabilityWindow::new(self.doctor_id, day_of_week, hm(start.0, start.1), hm(end.0, end.1));
        self.windows.insert(window).await.unwrap()
    }

    pub async fn active_count(&self) -> usize {
        self.appointments
            .active_for_doctor(self.doctor_id, None)
            .await
            .unwrap()
            .len()
    }
}

pub fn book_request(doctor_id: Uuid, date: NaiveDate, time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        patient_id: None,
        date: date.format("%Y-%m-%d").to_string(),
        time: time.to_string(),
        appointment_type: "consultation".to_string(),
        notes: None,
    }
}
