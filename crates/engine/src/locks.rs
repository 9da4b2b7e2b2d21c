//! Per-expedition critical sections.
//!
//! Two reservations on the same expedition must not both read the occupancy
//! before either has written its booking. The registry hands out one async
//! mutex per expedition id; holders run their whole check-and-insert
//! transaction under it. Reservations on different expeditions never wait on
//! each other.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub(crate) struct ExpeditionLocks {
    slots: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl ExpeditionLocks {
    /// Waits until the caller is the only holder for `expedition_id`.
    pub(crate) async fn acquire(&self, expedition_id: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop slots nobody holds or waits on.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(expedition_id).or_default())
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_expedition_is_serialized() {
        let locks = Arc::new(ExpeditionLocks::default());
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_expeditions_do_not_block() {
        let locks = ExpeditionLocks::default();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(Uuid::new_v4())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let locks = ExpeditionLocks::default();
        for _ in 0..10 {
            let _g = locks.acquire(Uuid::new_v4()).await;
        }
        // Only the slot of the last acquisition survives the final prune.
        assert!(locks.len() <= 1);
    }
}
