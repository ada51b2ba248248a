//! Task store abstraction.
//!
//! A claim is an open unit of work: while a [`TaskClaim`] is alive the row is
//! locked against every other claimant, and concurrent `claim_next` calls skip
//! it instead of waiting. Finalizing records the attempt and commits; dropping
//! the claim (or calling [`TaskClaim::release`]) rolls everything back.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use binwatch_common::error::AppError;
use binwatch_common::types::{DeliveryOutcome, EnqueueOutcome, NotificationTask};

/// Durable storage for notification tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a pending task for `target_date` unless one already exists.
    ///
    /// Must be a single atomic operation so that concurrent callers for the
    /// same date cannot both insert.
    async fn insert_if_absent(&self, target_date: NaiveDate) -> Result<EnqueueOutcome, AppError>;

    /// Claim the oldest eligible task, if any.
    ///
    /// A task is eligible when it is `pending`, or `failed` with
    /// `retry_count < max_retries`. Rows held by another claim are skipped.
    async fn claim_next(&self, max_retries: i32) -> Result<Option<Box<dyn TaskClaim>>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<NotificationTask>, AppError>;

    async fn find_by_date(&self, target_date: NaiveDate)
    -> Result<Option<NotificationTask>, AppError>;

    /// Most recently created tasks first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<NotificationTask>, AppError>;
}

/// An exclusively held task.
#[async_trait]
pub trait TaskClaim: Send {
    /// The task as it was when claimed.
    fn task(&self) -> &NotificationTask;

    /// Record one delivery attempt and commit, releasing the claim.
    ///
    /// `retry_count` goes up by one whatever the outcome.
    async fn finalize(self: Box<Self>, outcome: DeliveryOutcome)
    -> Result<NotificationTask, AppError>;

    /// Give the task back untouched.
    async fn release(self: Box<Self>) -> Result<(), AppError>;
}
