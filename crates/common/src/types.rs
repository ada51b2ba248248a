use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification delivery status.
///
/// `Sent` is terminal. `Failed` rows stay claimable until their retry budget
/// is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A queued "bin is full" notification, deduplicated by collection date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationTask {
    pub id: Uuid,
    /// Collection day the reminder is about. Unique across the table.
    pub target_date: NaiveDate,
    pub status: DeliveryStatus,
    /// Number of delivery attempts made so far.
    pub retry_count: i32,
    /// Reason reported by the most recent failed attempt.
    pub last_error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationTask {
    /// Whether a worker may claim this task.
    pub fn is_eligible(&self, max_retries: i32) -> bool {
        match self.status {
            DeliveryStatus::Pending => true,
            DeliveryStatus::Failed => self.retry_count < max_retries,
            DeliveryStatus::Sent => false,
        }
    }

    /// A failed task whose retry budget is spent. It stays in the table but
    /// is never claimed again.
    pub fn is_exhausted(&self, max_retries: i32) -> bool {
        self.status == DeliveryStatus::Failed && self.retry_count >= max_retries
    }
}

/// Result of an idempotent enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnqueueOutcome {
    /// A new task was created.
    Queued { id: Uuid },
    /// A task for the same date already exists; nothing changed.
    AlreadyQueued,
}

/// What happened when a claimed task was handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
}

impl DeliveryOutcome {
    /// Status the task moves to once this outcome is recorded.
    pub fn status(&self) -> DeliveryStatus {
        match self {
            DeliveryOutcome::Delivered => DeliveryStatus::Sent,
            DeliveryOutcome::Failed { .. } => DeliveryStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: DeliveryStatus, retry_count: i32) -> NotificationTask {
        let now = Utc::now();
        NotificationTask {
            id: Uuid::new_v4(),
            target_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            status,
            retry_count,
            last_error: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pending_is_always_eligible() {
        assert!(task(DeliveryStatus::Pending, 0).is_eligible(3));
    }

    #[test]
    fn test_failed_is_eligible_below_budget() {
        assert!(task(DeliveryStatus::Failed, 2).is_eligible(3));
        assert!(!task(DeliveryStatus::Failed, 3).is_eligible(3));
        assert!(task(DeliveryStatus::Failed, 3).is_exhausted(3));
    }

    #[test]
    fn test_sent_is_never_eligible() {
        let sent = task(DeliveryStatus::Sent, 1);
        assert!(!sent.is_eligible(3));
        assert!(!sent.is_exhausted(3));
    }

    #[test]
    fn test_enqueue_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(EnqueueOutcome::AlreadyQueued).unwrap();
        assert_eq!(json, serde_json::json!({"status": "already_queued"}));

        let id = Uuid::new_v4();
        let json = serde_json::to_value(EnqueueOutcome::Queued { id }).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn test_delivery_outcome_status() {
        assert_eq!(DeliveryOutcome::Delivered.status(), DeliveryStatus::Sent);
        let failed = DeliveryOutcome::Failed {
            reason: "HTTP 500".to_string(),
        };
        assert_eq!(failed.status(), DeliveryStatus::Failed);
    }
}
