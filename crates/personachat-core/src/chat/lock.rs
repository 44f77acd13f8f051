//! Per-session mutual exclusion.
//!
//! `SessionLocks` hands out one async mutex per [`SessionKey`]. Requests for
//! the same session queue up behind each other; different sessions never
//! share a lock. Entries are pruned once no guard or waiter refers to them.
//!
//! The `DashMap` shard guard is only ever held for the clone of the inner
//! `Arc`, never across `.await`.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use personachat_types::chat::SessionKey;

/// Table of per-session locks. Cloning shares the same table.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    inner: Arc<DashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Access is released when the
    /// returned guard is dropped.
    pub async fn acquire(&self, key: &SessionKey) -> SessionGuard {
        let mutex = self.inner.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        SessionGuard {
            guard: Some(guard),
            key: key.clone(),
            table: Arc::clone(&self.inner),
        }
    }

    /// Number of sessions currently locked or awaited.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive access to one session.
#[derive(Debug)]
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: SessionKey,
    table: Arc<DashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Release first so the guard's own Arc no longer counts.
        drop(self.guard.take());
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use personachat_types::persona::Persona;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(session: &str) -> SessionKey {
        SessionKey::new("alice", Persona::Rainmaker, session)
    }

    #[tokio::test]
    async fn test_entry_pruned_after_release() {
        let locks = SessionLocks::new();
        {
            let _guard = locks.acquire(&key("s1")).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(&key("s1")).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&key("s2"))).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_same_session_is_exclusive() {
        let locks = SessionLocks::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&key("shared")).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = SessionLocks::new();
        let first = locks.acquire(&key("s1")).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&key("s1")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
