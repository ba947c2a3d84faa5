use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::AvailabilityWindow;
use super::AvailabilityStore;

#[derive(Default)]
pub struct InMemoryAvailabilityStore {
    windows: RwLock<HashMap<Uuid, AvailabilityWindow>>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(mut windows: Vec<AvailabilityWindow>) -> Vec<AvailabilityWindow> {
    windows.sort_by(|a, b| {
        a.day_of_week
            .cmp(&b.day_of_week)
            .then(a.start_time.cmp(&b.start_time))
    });
    windows
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn windows_for_day(&self, doctor_id: Uuid, day_of_week: i32) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
        let windows = self.windows.read().await;
        Ok(sorted(
            windows
                .values()
                .filter(|w| w.doctor_id == doctor_id && w.day_of_week == day_of_week && w.is_available)
                .cloned()
                .collect(),
        ))
    }

    async fn windows_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
        let windows = self.windows.read().await;
        Ok(sorted(
            windows
                .values()
                .filter(|w| w.doctor_id == doctor_id)
                .cloned()
                .collect(),
        ))
    }

    async fn get(&self, window_id: Uuid) -> Result<Option<AvailabilityWindow>, DatabaseError> {
        Ok(self.windows.read().await.get(&window_id).cloned())
    }

    async fn insert(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DatabaseError> {
        let mut windows = self.windows.write().await;
        if windows.contains_key(&window.id) {
            return Err(DatabaseError::Conflict(format!("availability {} already exists", window.id)));
        }
        windows.insert(window.id, window.clone());
        Ok(window)
    }

    async fn update(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DatabaseError> {
        let mut windows = self.windows.write().await;
        match windows.get_mut(&window.id) {
            Some(existing) => {
                *existing = window.clone();
                Ok(window)
            }
            None => Err(DatabaseError::NotFound(format!("availability {}", window.id))),
        }
    }
}
