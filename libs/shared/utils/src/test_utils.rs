use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use http::request::Builder;
use tokio::sync::Mutex;
use uuid::Uuid;

use security_cell::{AuditEntry, AuditRecorder};
use shared_config::{AppConfig, StorageBackend};
use shared_models::auth::{Actor, Role};

use crate::extractor::{DOCTOR_ID_HEADER, PATIENT_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_api_key: String,
    pub slot_duration_minutes: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_api_key: "test-service-key".to_string(),
            slot_duration_minutes: 30,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_api_key: self.supabase_api_key.clone(),
            storage_backend: StorageBackend::Memory,
            slot_duration_minutes: self.slot_duration_minutes,
            server_port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestActor {
    pub actor: Actor,
}

impl TestActor {
    pub fn patient() -> Self {
        Self::patient_with_id(Uuid::new_v4())
    }

    pub fn patient_with_id(patient_id: Uuid) -> Self {
        Self {
            actor: Actor::patient(Uuid::new_v4(), patient_id),
        }
    }

    pub fn doctor(doctor_id: Uuid) -> Self {
        Self {
            actor: Actor::doctor(Uuid::new_v4(), doctor_id),
        }
    }

    pub fn admin() -> Self {
        Self {
            actor: Actor::admin(Uuid::new_v4()),
        }
    }

    pub fn patient_id(&self) -> Uuid {
        self.actor.patient_id.unwrap_or_default()
    }

    /// Identity headers as the gateway would forward them.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            (USER_ID_HEADER, self.actor.user_id.to_string()),
            (USER_ROLE_HEADER, self.actor.role.to_string()),
        ];
        if let Some(patient_id) = self.actor.patient_id {
            headers.push((PATIENT_ID_HEADER, patient_id.to_string()));
        }
        if let Some(doctor_id) = self.actor.doctor_id {
            headers.push((DOCTOR_ID_HEADER, doctor_id.to_string()));
        }
        headers
    }

    pub fn apply(&self, mut builder: Builder) -> Builder {
        for (name, value) in self.headers() {
            builder = builder.header(name, value);
        }
        builder
    }

    pub fn role(&self) -> Role {
        self.actor.role
    }
}

/// A fixed Monday far enough in the future for booking tests.
pub fn test_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap_or_default()
}

/// The first date on or after `test_monday()` that falls on `weekday`.
pub fn test_date_for(weekday: Weekday) -> NaiveDate {
    let monday = test_monday();
    let offset = (weekday.num_days_from_monday() + 7 - monday.weekday().num_days_from_monday()) % 7;
    monday + Duration::days(offset as i64)
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}


/// Audit sink that keeps every entry so tests can assert on the trail.
#[derive(Default)]
pub struct RecordingAuditor {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn entries_for_resource(&self, resource_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.resource_id == Some(resource_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditRecorder for RecordingAuditor {
    async fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}
