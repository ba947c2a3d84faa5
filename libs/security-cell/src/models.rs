// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =====================================================================================
// AUDIT MODELS
// =====================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    AppointmentBooked,
    AppointmentCancelled,
    AppointmentRescheduled,
    AvailabilityCreated,
    AvailabilityModified,
}

impl AuditEventType {
    /// Action name persisted with the audit record.
    pub fn action(&self) -> &'static str {
        match self {
            AuditEventType::AppointmentBooked => "APPOINTMENT_CREATED",
            AuditEventType::AppointmentCancelled => "APPOINTMENT_CANCELLED",
            AuditEventType::AppointmentRescheduled => "APPOINTMENT_RESCHEDULED",
            AuditEventType::AvailabilityCreated => "AVAILABILITY_CREATED",
            AuditEventType::AvailabilityModified => "AVAILABILITY_UPDATED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_id: Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    pub action: String,
    pub user_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    pub outcome: AuditOutcome,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AuditEntry {
    pub fn new(event_type: AuditEventType, outcome: AuditOutcome) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            event_type,
            action: event_type.action().to_string(),
            user_id: None,
            resource_type: None,
            resource_id: None,
            outcome,
            metadata: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_resource(mut self, resource_type: &str, resource_id: Uuid) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self.resource_id = Some(resource_id);
        self
    }

    pub fn add_context<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(serialized) = serde_json::to_value(value) {
            self.metadata.insert(key.to_string(), serialized);
        }
        self
    }
}
