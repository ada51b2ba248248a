//! PostgreSQL-backed task store.
//!
//! Deduplication is the `UNIQUE (target_date)` constraint; claiming is a
//! `SELECT ... FOR UPDATE SKIP LOCKED` inside a transaction that stays open
//! until the claim is finalized or dropped.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use binwatch_common::error::AppError;
use binwatch_common::types::{DeliveryOutcome, EnqueueOutcome, NotificationTask};

use crate::store::{TaskClaim, TaskStore};

/// Task store on the `notifications` table.
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert_if_absent(&self, target_date: NaiveDate) -> Result<EnqueueOutcome, AppError> {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO notifications (id, target_date, status)
            VALUES ($1, $2, 'pending')
            ON CONFLICT (target_date) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(target_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some((id,)) => EnqueueOutcome::Queued { id },
            None => EnqueueOutcome::AlreadyQueued,
        })
    }

    async fn claim_next(&self, max_retries: i32) -> Result<Option<Box<dyn TaskClaim>>, AppError> {
        let mut tx = self.pool.begin().await?;

        let task: Option<NotificationTask> = sqlx::query_as(
            r#"
            SELECT *
            FROM notifications
            WHERE status = 'pending'
               OR (status = 'failed' AND retry_count < $1)
            ORDER BY created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(max_retries)
        .fetch_optional(&mut *tx)
        .await?;

        match task {
            Some(task) => {
                tracing::debug!(
                    task_id = %task.id,
                    target_date = %task.target_date,
                    retry_count = task.retry_count,
                    "Claimed notification task"
                );
                let claim: Box<dyn TaskClaim> = Box::new(PgClaim { tx, task });
                Ok(Some(claim))
            }
            None => {
                tx.commit().await?;
                Ok(None)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<NotificationTask>, AppError> {
        let task = sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_by_date(
        &self,
        target_date: NaiveDate,
    ) -> Result<Option<NotificationTask>, AppError> {
        let task = sqlx::query_as("SELECT * FROM notifications WHERE target_date = $1")
            .bind(target_date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<NotificationTask>, AppError> {
        let tasks = sqlx::query_as("SELECT * FROM notifications ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }
}

/// A row locked by an open transaction.
///
/// Dropping it drops the transaction, which sqlx rolls back.
struct PgClaim {
    tx: Transaction<'static, Postgres>,
    task: NotificationTask,
}

#[async_trait]
impl TaskClaim for PgClaim {
    fn task(&self) -> &NotificationTask {
        &self.task
    }

    async fn finalize(
        self: Box<Self>,
        outcome: DeliveryOutcome,
    ) -> Result<NotificationTask, AppError> {
        let PgClaim { mut tx, task } = *self;

        let (last_error, sent_at) = match &outcome {
            DeliveryOutcome::Delivered => (None, Some(Utc::now())),
            DeliveryOutcome::Failed { reason } => (Some(reason.clone()), None),
        };

        let updated: NotificationTask = sqlx::query_as(
            r#"
            UPDATE notifications
            SET status = $1,
                retry_count = retry_count + 1,
                last_error = $2,
                sent_at = COALESCE($3, sent_at),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(outcome.status().to_string())
        .bind(last_error)
        .bind(sent_at)
        .bind(task.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn release(self: Box<Self>) -> Result<(), AppError> {
        let PgClaim { tx, .. } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
