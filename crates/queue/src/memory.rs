//! In-process task store.
//!
//! Mirrors the Postgres store's contract (unique dates, skip-locked claims,
//! rollback on drop) without a database. Used by tests and local runs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use binwatch_common::error::AppError;
use binwatch_common::types::{DeliveryOutcome, DeliveryStatus, EnqueueOutcome, NotificationTask};

use crate::store::{TaskClaim, TaskStore};

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion order doubles as creation order.
    tasks: Vec<NotificationTask>,
    claimed: HashSet<Uuid>,
}

/// Task store kept in memory behind a mutex. Clones share the same tasks.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every task, oldest first.
    pub fn tasks(&self) -> Vec<NotificationTask> {
        lock(&self.state).tasks.clone()
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert_if_absent(&self, target_date: NaiveDate) -> Result<EnqueueOutcome, AppError> {
        let mut state = lock(&self.state);
        if state.tasks.iter().any(|t| t.target_date == target_date) {
            return Ok(EnqueueOutcome::AlreadyQueued);
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        state.tasks.push(NotificationTask {
            id,
            target_date,
            status: DeliveryStatus::Pending,
            retry_count: 0,
            last_error: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        });
        Ok(EnqueueOutcome::Queued { id })
    }

    async fn claim_next(&self, max_retries: i32) -> Result<Option<Box<dyn TaskClaim>>, AppError> {
        let mut state = lock(&self.state);

        let next = state
            .tasks
            .iter()
            .filter(|t| t.is_eligible(max_retries) && !state.claimed.contains(&t.id))
            .min_by_key(|t| t.created_at)
            .cloned();

        let Some(task) = next else {
            return Ok(None);
        };

        state.claimed.insert(task.id);
        let claim: Box<dyn TaskClaim> = Box::new(MemoryClaim {
            state: Arc::clone(&self.state),
            task,
        });
        Ok(Some(claim))
    }

    async fn get(&self, id: Uuid) -> Result<Option<NotificationTask>, AppError> {
        Ok(lock(&self.state).tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_date(
        &self,
        target_date: NaiveDate,
    ) -> Result<Option<NotificationTask>, AppError> {
        Ok(lock(&self.state)
            .tasks
            .iter()
            .find(|t| t.target_date == target_date)
            .cloned())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<NotificationTask>, AppError> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(lock(&self.state)
            .tasks
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

struct MemoryClaim {
    state: Arc<Mutex<MemoryState>>,
    task: NotificationTask,
}

#[async_trait]
impl TaskClaim for MemoryClaim {
    fn task(&self) -> &NotificationTask {
        &self.task
    }

    async fn finalize(
        self: Box<Self>,
        outcome: DeliveryOutcome,
    ) -> Result<NotificationTask, AppError> {
        let mut state = lock(&self.state);
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == self.task.id)
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", self.task.id)))?;

        let now = Utc::now();
        task.status = outcome.status();
        task.retry_count += 1;
        task.updated_at = now;
        match outcome {
            DeliveryOutcome::Delivered => {
                task.last_error = None;
                task.sent_at = Some(now);
            }
            DeliveryOutcome::Failed { reason } => task.last_error = Some(reason),
        }

        // `state` unlocks before `self` drops and clears the claim.
        Ok(task.clone())
    }

    async fn release(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

impl Drop for MemoryClaim {
    fn drop(&mut self) {
        lock(&self.state).claimed.remove(&self.task.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_per_date() {
        let store = MemoryTaskStore::new();

        let first = store.insert_if_absent(date(6)).await.unwrap();
        assert!(matches!(first, EnqueueOutcome::Queued { .. }));

        let second = store.insert_if_absent(date(6)).await.unwrap();
        assert_eq!(second, EnqueueOutcome::AlreadyQueued);

        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_held_claim_is_skipped() {
        let store = MemoryTaskStore::new();
        store.insert_if_absent(date(6)).await.unwrap();

        let claim = store.claim_next(3).await.unwrap().expect("one eligible task");
        assert!(store.claim_next(3).await.unwrap().is_none());

        claim.release().await.unwrap();
        assert!(store.claim_next(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dropped_claim_leaves_task_untouched() {
        let store = MemoryTaskStore::new();
        store.insert_if_absent(date(6)).await.unwrap();

        let claim = store.claim_next(3).await.unwrap().unwrap();
        drop(claim);

        let task = store.find_by_date(date(6)).await.unwrap().unwrap();
        assert_eq!(task.status, DeliveryStatus::Pending);
        assert_eq!(task.retry_count, 0);
        assert!(store.claim_next(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_finalize_records_attempt() {
        let store = MemoryTaskStore::new();
        store.insert_if_absent(date(6)).await.unwrap();

        let claim = store.claim_next(3).await.unwrap().unwrap();
        let failed = claim
            .finalize(DeliveryOutcome::Failed {
                reason: "HTTP 500".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(failed.status, DeliveryStatus::Failed);
        assert_eq!(failed.retry_count, 1);
        assert_eq!(failed.last_error.as_deref(), Some("HTTP 500"));

        let claim = store.claim_next(3).await.unwrap().unwrap();
        let sent = claim.finalize(DeliveryOutcome::Delivered).await.unwrap();
        assert_eq!(sent.status, DeliveryStatus::Sent);
        assert_eq!(sent.retry_count, 2);
        assert!(sent.sent_at.is_some());
        assert!(sent.last_error.is_none());

        assert!(store.claim_next(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claims_oldest_first() {
        let store = MemoryTaskStore::new();
        store.insert_if_absent(date(9)).await.unwrap();
        store.insert_if_absent(date(6)).await.unwrap();

        let first = store.claim_next(3).await.unwrap().unwrap();
        assert_eq!(first.task().target_date, date(9));

        let second = store.claim_next(3).await.unwrap().unwrap();
        assert_eq!(second.task().target_date, date(6));
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let store = MemoryTaskStore::new();
        for day in [6, 9, 13] {
            store.insert_if_absent(date(day)).await.unwrap();
        }

        let recent = store.list_recent(2).await.unwrap();
        let dates: Vec<_> = recent.iter().map(|t| t.target_date).collect();
        assert_eq!(dates, vec![date(13), date(9)]);
    }
}
