//! Enqueuer — turns a "bin is full" trigger into at most one task per
//! collection date.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use binwatch_common::error::AppError;
use binwatch_common::types::EnqueueOutcome;

use crate::schedule::CollectionSchedule;
use crate::store::TaskStore;

/// Outcome of a trigger, along with the date it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerResult {
    pub target_date: NaiveDate,
    #[serde(flatten)]
    pub outcome: EnqueueOutcome,
}

/// Idempotent producer side of the queue.
#[derive(Clone)]
pub struct Enqueuer {
    store: Arc<dyn TaskStore>,
    schedule: CollectionSchedule,
}

impl Enqueuer {
    pub fn new(store: Arc<dyn TaskStore>, schedule: CollectionSchedule) -> Self {
        Self { store, schedule }
    }

    /// Queue a notification for `target_date`.
    ///
    /// Repeating the call for the same date is a no-op that reports
    /// [`EnqueueOutcome::AlreadyQueued`].
    pub async fn enqueue(&self, target_date: NaiveDate) -> Result<EnqueueOutcome, AppError> {
        let outcome = self.store.insert_if_absent(target_date).await?;

        match outcome {
            EnqueueOutcome::Queued { id } => {
                tracing::info!(task_id = %id, target_date = %target_date, "Notification queued");
            }
            EnqueueOutcome::AlreadyQueued => {
                tracing::info!(target_date = %target_date, "Notification already queued, skipping");
            }
        }

        Ok(outcome)
    }

    /// Resolve the next collection day as of `now` and queue it.
    pub async fn trigger(&self, now: DateTime<Utc>) -> Result<TriggerResult, AppError> {
        let target_date = self.schedule.next_after(now).ok_or_else(|| {
            AppError::Internal("no collection day within the next week".to_string())
        })?;

        let outcome = self.enqueue(target_date).await?;
        Ok(TriggerResult {
            target_date,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Weekday};

    use super::*;
    use crate::memory::MemoryTaskStore;

    fn enqueuer(store: &MemoryTaskStore) -> Enqueuer {
        let schedule = CollectionSchedule::new(vec![Weekday::Mon, Weekday::Thu], 9).unwrap();
        Enqueuer::new(Arc::new(store.clone()), schedule)
    }

    #[tokio::test]
    async fn test_repeated_triggers_queue_once() {
        let store = MemoryTaskStore::new();
        let enqueuer = enqueuer(&store);
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();

        let first = enqueuer.trigger(now).await.unwrap();
        assert_eq!(first.target_date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert!(matches!(first.outcome, EnqueueOutcome::Queued { .. }));

        let second = enqueuer.trigger(now).await.unwrap();
        assert_eq!(second.outcome, EnqueueOutcome::AlreadyQueued);
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_enqueues_create_one_task() {
        let store = MemoryTaskStore::new();
        let enqueuer = enqueuer(&store);
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let enqueuer = enqueuer.clone();
                tokio::spawn(async move { enqueuer.enqueue(date).await.unwrap() })
            })
            .collect();

        let mut queued = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), EnqueueOutcome::Queued { .. }) {
                queued += 1;
            }
        }

        assert_eq!(queued, 1);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_trigger_result_json_shape() {
        let result = TriggerResult {
            target_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            outcome: EnqueueOutcome::AlreadyQueued,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"target_date": "2025-01-06", "status": "already_queued"})
        );
    }
}
