pub mod audit;

pub use audit::{AuditRecorder, AuditService};
