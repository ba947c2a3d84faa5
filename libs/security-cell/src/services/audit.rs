// =====================================================================================
// AUDIT SERVICE - BEST-EFFORT AUDIT TRAIL FOR SCHEDULING CHANGES
// =====================================================================================

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use shared_database::SupabaseClient;

use crate::models::{AuditEntry, AuditOutcome};

const FLUSH_THRESHOLD: usize = 100;
const MAX_BUFFERED_ENTRIES: usize = 10_000;

/// Sink for audit records. Callers treat failures as non-fatal.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<()>;
}

pub struct AuditService {
    supabase: Option<Arc<SupabaseClient>>,
    audit_buffer: Arc<RwLock<Vec<AuditEntry>>>,
    max_buffered: usize,
}

impl Default for AuditService {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditService {
    pub fn new() -> Self {
        Self {
            supabase: None,
            audit_buffer: Arc::new(RwLock::new(Vec::new())),
            max_buffered: MAX_BUFFERED_ENTRIES,
        }
    }

    /// Upper bound on unflushed entries; the oldest are dropped past it.
    pub fn with_max_buffered(mut self, max_buffered: usize) -> Self {
        self.max_buffered = max_buffered.max(1);
        self
    }

    /// Persists flushed batches to the `audit_logs` table.
    pub fn with_supabase(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            supabase: Some(supabase),
            ..Self::new()
        }
    }

    #[instrument(skip(self, entry))]
    pub async fn log_audit_entry(&self, entry: AuditEntry) -> Result<()> {
        self.log_to_tracing(&entry);

        let should_flush = {
            let mut buffer = self.audit_buffer.write().await;
            buffer.push(entry);
            self.drop_oldest(&mut buffer);
            buffer.len() >= FLUSH_THRESHOLD
        };

        if should_flush {
            self.flush_audit_buffer().await?;
        }

        Ok(())
    }

    fn log_to_tracing(&self, entry: &AuditEntry) {
        match entry.outcome {
            AuditOutcome::Success => {
                info!(
                    event_id = %entry.event_id,
                    event_type = ?entry.event_type,
                    user_id = ?entry.user_id,
                    resource_id = ?entry.resource_id,
                    "AUDIT: {}", entry.action
                );
            }
            AuditOutcome::Failure | AuditOutcome::Denied => {
                warn!(
                    event_id = %entry.event_id,
                    event_type = ?entry.event_type,
                    user_id = ?entry.user_id,
                    outcome = ?entry.outcome,
                    "AUDIT FAILURE: {}", entry.action
                );
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn flush_audit_buffer(&self) -> Result<()> {
        let entries = {
            let mut buffer = self.audit_buffer.write().await;
            std::mem::take(&mut *buffer)
        };

        if entries.is_empty() {
            return Ok(());
        }

        match &self.supabase {
            Some(supabase) => {
                let rows: Vec<Value> = entries.iter().map(audit_row).collect();
                let count = rows.len();
                let persisted: Result<Vec<Value>, _> = supabase
                    .request(Method::POST, "/rest/v1/audit_logs", Some(Value::Array(rows)))
                    .await;

                if let Err(e) = persisted {
                    // Put the batch back so the next flush retries it.
                    let mut buffer = self.audit_buffer.write().await;
                    let newer = std::mem::replace(&mut *buffer, entries);
                    buffer.extend(newer);
                    self.drop_oldest(&mut buffer);
                    return Err(e.into());
                }
                info!("Flushed {} audit entries to audit_logs", count);
            }
            None => {
                debug!("Flushed {} audit entries (no persistent sink configured)", entries.len());
            }
        }

        Ok(())
    }

    fn drop_oldest(&self, buffer: &mut Vec<AuditEntry>) {
        if buffer.len() > self.max_buffered {
            let excess = buffer.len() - self.max_buffered;
            buffer.drain(..excess);
            warn!("Audit buffer full, dropped {} oldest entries", excess);
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.audit_buffer.read().await.len()
    }
}

#[async_trait]
impl AuditRecorder for AuditService {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        self.log_audit_entry(entry).await
    }
}

fn audit_row(entry: &AuditEntry) -> Value {
    json!({
        "id": entry.event_id,
        "user_id": entry.user_id,
        "action": entry.action,
        "resource": entry.resource_type,
        "resource_id": entry.resource_id,
        "metadata": entry.metadata,
        "outcome": entry.outcome,
        "created_at": entry.timestamp.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditEventType;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn booked(resource_id: Uuid) -> AuditEntry {
        AuditEntry::new(AuditEventType::AppointmentBooked, AuditOutcome::Success)
            .with_user(Uuid::new_v4())
            .with_resource("appointment", resource_id)
    }

    #[tokio::test]
    async fn records_are_buffered_until_flushed() {
        let service = AuditService::new();

        service.record(booked(Uuid::new_v4())).await.unwrap();
        service.record(booked(Uuid::new_v4())).await.unwrap();
        assert_eq!(service.pending_count().await, 2);

        service.flush_audit_buffer().await.unwrap();
        assert_eq!(service.pending_count().await, 0);
    }

    #[tokio::test]
    async fn flush_persists_batch_to_supabase() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/audit_logs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = Arc::new(SupabaseClient::with_base_url(&server.uri(), "key"));
        let service = AuditService::with_supabase(client);
        service.record(booked(Uuid::new_v4())).await.unwrap();

        service.flush_audit_buffer().await.unwrap();
        assert_eq!(service.pending_count().await, 0);
    }

    #[tokio::test]
    async fn failed_flush_keeps_entries_buffered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/audit_logs"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let client = Arc::new(SupabaseClient::with_base_url(&server.uri(), "key"));
        let service = AuditService::with_supabase(client);
        service.record(booked(Uuid::new_v4())).await.unwrap();

        assert!(service.flush_audit_buffer().await.is_err());
        assert_eq!(service.pending_count().await, 1);
    }

    #[tokio::test]
    async fn unreachable_sink_keeps_only_the_newest_entries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/audit_logs"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = Arc::new(SupabaseClient::with_base_url(&server.uri(), "key"));
        let service = AuditService::with_supabase(client).with_max_buffered(3);

        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            service.record(booked(*id)).await.unwrap();
            assert!(service.flush_audit_buffer().await.is_err());
            assert!(service.pending_count().await <= 3);
        }
        assert_eq!(service.pending_count().await, 3);

        let requests = server.received_requests().await.unwrap();
        let last_batch: Vec<Value> = serde_json::from_slice(&requests.last().unwrap().body).unwrap();
        let sent: Vec<String> = last_batch
            .iter()
            .map(|row| row["resource_id"].as_str().unwrap().to_string())
            .collect();
        let newest: Vec<String> = ids[2..].iter().map(Uuid::to_string).collect();
        assert_eq!(sent, newest);
    }
}
