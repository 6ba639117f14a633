//! Per-library serialization
//!
//! Each library id maps to its own async mutex. Holding the guard admits one
//! add or remove for that library; other libraries proceed independently.
//! Tokio's mutex queues waiters in FIFO order, so operations on a library run
//! in the order they asked for the lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Held while an operation owns its library. Dropping it releases the lock.
pub struct LibraryGuard {
    library_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

impl LibraryGuard {
    pub fn library_id(&self) -> Uuid {
        self.library_id
    }
}

#[derive(Default)]
pub struct LibraryLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl LibraryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the library is free and take it
    pub async fn acquire(&self, library_id: Uuid) -> LibraryGuard {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(library_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        LibraryGuard {
            library_id,
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of libraries that have been locked at least once
    pub fn tracked_libraries(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_waiters_are_admitted_in_order() {
        let locks = Arc::new(LibraryLocks::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let library_id = Uuid::new_v4();

        let first = locks.acquire(library_id).await;

        let mut handles = Vec::new();
        for i in 0..5 {
            let locks = locks.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(library_id).await;
                order.lock().push(i);
            }));
            // Let the task reach the lock queue before spawning the next one
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        drop(first);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(locks.tracked_libraries(), 1);
    }

    #[tokio::test]
    async fn test_libraries_do_not_block_each_other() {
        let locks = LibraryLocks::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let guard_a = locks.acquire(a).await;
        let guard_b = tokio::time::timeout(Duration::from_secs(1), locks.acquire(b))
            .await
            .expect("second library should not wait");

        assert_eq!(guard_a.library_id(), a);
        assert_eq!(guard_b.library_id(), b);
        assert_eq!(locks.tracked_libraries(), 2);
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = LibraryLocks::new();
        let id = Uuid::new_v4();

        drop(locks.acquire(id).await);
        let reacquired = tokio::time::timeout(Duration::from_secs(1), locks.acquire(id)).await;
        assert!(reacquired.is_ok());
    }
}
