use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use crate::models::AvailabilityWindow;
use super::AvailabilityStore;

const TABLE: &str = "/rest/v1/doctor_availability";

pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAvailabilityStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn windows_for_day(&self, doctor_id: Uuid, day_of_week: i32) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
        let path = format!(
            "{}?doctor_id=eq.{}&day_of_week=eq.{}&is_available=eq.true&order=start_time.asc",
            TABLE, doctor_id, day_of_week
        );
        self.supabase.rows(Method::GET, &path, None).await
    }

    async fn windows_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
        let path = format!(
            "{}?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            TABLE, doctor_id
        );
        self.supabase.rows(Method::GET, &path, None).await
    }

    async fn get(&self, window_id: Uuid) -> Result<Option<AvailabilityWindow>, DatabaseError> {
        let path = format!("{}?id=eq.{}", TABLE, window_id);
        let rows: Vec<AvailabilityWindow> = self.supabase.rows(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DatabaseError> {
        debug!("Inserting availability {} for doctor {}", window.id, window.doctor_id);
        let body = serde_json::to_value(&window)?;
        let rows: Vec<AvailabilityWindow> = self.supabase.rows(Method::POST, TABLE, Some(body)).await?;
        rows.into_iter().next().ok_or_else(|| DatabaseError::Api {
            status: 200,
            message: "insert returned no representation".to_string(),
        })
    }

    async fn update(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DatabaseError> {
        let path = format!("{}?id=eq.{}", TABLE, window.id);
        let body = json!({
            "start_time": window.start_time,
            "end_time": window.end_time,
            "is_available": window.is_available,
            "updated_at": window.updated_at.to_rfc3339(),
        });
        let rows: Vec<AvailabilityWindow> = self.supabase.rows(Method::PATCH, &path, Some(body)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound(format!("availability {}", window.id)))
    }
}
