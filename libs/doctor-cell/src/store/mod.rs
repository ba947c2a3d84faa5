use async_trait::async_trait;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::AvailabilityWindow;

mod memory;
mod supabase;

pub use memory::InMemoryAvailabilityStore;
pub use supabase::SupabaseAvailabilityStore;

/// Persistence for recurring availability windows.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Active windows for one weekday, ordered by start time.
    async fn windows_for_day(&self, doctor_id: Uuid, day_of_week: i32) -> Result<Vec<AvailabilityWindow>, DatabaseError>;

    /// Every window of the doctor, active or not, ordered by weekday then start time.
    async fn windows_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DatabaseError>;

    async fn get(&self, window_id: Uuid) -> Result<Option<AvailabilityWindow>, DatabaseError>;

    async fn insert(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DatabaseError>;

    async fn update(&self, window: AvailabilityWindow) -> Result<AvailabilityWindow, DatabaseError>;
}
