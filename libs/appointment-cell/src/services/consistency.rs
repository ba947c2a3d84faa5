// libs/appointment-cell/src/services/consistency.rs
//
// Per-doctor mutual exclusion for check-then-write scheduling operations.
//

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Hands out one async lock per doctor. Booking, rescheduling and cancelling
/// hold the doctor's lock from the availability read until the write lands, so
/// two requests for the same doctor cannot both pass the conflict check.
#[derive(Default)]
pub struct SchedulingLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SchedulingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, doctor_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // An entry only the map references has no holder and no waiter.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(doctor_id).or_default().clone()
        };
        debug!("Waiting for scheduling lock of doctor {}", doctor_id);
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked_doctors(&self) -> usize {
        self.locks.lock().await.len()
    }
}
