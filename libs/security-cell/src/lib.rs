// =====================================================================================
// SECURITY CELL - AUDIT TRAIL FOR SCHEDULING
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{AuditEntry, AuditEventType, AuditOutcome};
pub use services::{AuditRecorder, AuditService};
