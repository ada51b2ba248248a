//! Notification worker — polls the queue and delivers one task per tick.
//!
//! Each tick is a claim → dispatch → finalize pipeline over a single held
//! claim. The claim keeps the row locked for the whole tick, so parallel
//! workers never deliver the same task twice. Any error before finalize
//! commits drops the claim, which rolls it back for a later tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use binwatch_common::config::AppConfig;
use binwatch_common::error::AppError;
use binwatch_common::types::{DeliveryOutcome, DeliveryStatus};
use binwatch_notifier::{DispatchError, Dispatcher, render_message};
use binwatch_queue::TaskStore;

/// Default delivery attempts per task.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// Worker tuning.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Attempts per task before it stops being claimed.
    pub max_retries: i32,
    /// Upper bound on one dispatch call. Exceeding it counts as a failure.
    pub dispatch_timeout: Duration,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.worker_tick_interval_ms),
            max_retries: config.worker_max_retries,
            dispatch_timeout: Duration::from_millis(config.dispatch_timeout_ms),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            max_retries: DEFAULT_MAX_RETRIES,
            dispatch_timeout: Duration::from_secs(10),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was eligible.
    Idle,
    Delivered {
        task_id: Uuid,
    },
    Failed {
        task_id: Uuid,
        retry_count: i32,
        /// The task has used its last attempt and will not be claimed again.
        exhausted: bool,
    },
}

/// Consumer side of the queue.
pub struct NotificationWorker {
    store: Arc<dyn TaskStore>,
    dispatcher: Arc<dyn Dispatcher>,
    config: WorkerConfig,
}

impl NotificationWorker {
    pub fn new(
        store: Arc<dyn TaskStore>,
        dispatcher: Arc<dyn Dispatcher>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Tick until `shutdown` is cancelled.
    ///
    /// Shutdown is only observed between ticks: a tick that has started
    /// always finishes, committing or rolling back its claim. Tick errors are
    /// logged and the loop carries on.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            tick_interval_ms = self.config.tick_interval.as_millis() as u64,
            max_retries = self.config.max_retries,
            dispatch_timeout_ms = self.config.dispatch_timeout.as_millis() as u64,
            "Notification worker started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.tick().await {
                Ok(TickOutcome::Idle) => tracing::trace!("No notification to deliver"),
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Worker tick failed, claim rolled back");
                }
            }
        }

        tracing::info!("Notification worker stopped");
    }

    /// Run one claim → dispatch → finalize cycle.
    pub async fn tick(&self) -> Result<TickOutcome, AppError> {
        let Some(claim) = self.store.claim_next(self.config.max_retries).await? else {
            return Ok(TickOutcome::Idle);
        };

        let task_id = claim.task().id;
        let target_date = claim.task().target_date;
        tracing::info!(
            task_id = %task_id,
            target_date = %target_date,
            attempt = claim.task().retry_count + 1,
            "Delivering notification"
        );

        let outcome = self.deliver(target_date).await;
        let task = claim.finalize(outcome).await?;

        if task.status == DeliveryStatus::Sent {
            tracing::info!(task_id = %task.id, retry_count = task.retry_count, "Notification sent");
            return Ok(TickOutcome::Delivered { task_id });
        }

        let exhausted = task.is_exhausted(self.config.max_retries);
        if exhausted {
            tracing::warn!(
                task_id = %task.id,
                target_date = %task.target_date,
                retry_count = task.retry_count,
                last_error = task.last_error.as_deref().unwrap_or_default(),
                "Notification retries exhausted, giving up"
            );
        } else {
            tracing::warn!(
                task_id = %task.id,
                retry_count = task.retry_count,
                last_error = task.last_error.as_deref().unwrap_or_default(),
                "Notification delivery failed, will retry"
            );
        }

        Ok(TickOutcome::Failed {
            task_id,
            retry_count: task.retry_count,
            exhausted,
        })
    }

    /// Render and dispatch the message, bounded by the dispatch timeout.
    async fn deliver(&self, target_date: NaiveDate) -> DeliveryOutcome {
        let message = render_message(target_date);
        let timeout = self.config.dispatch_timeout;

        let result = tokio::time::timeout(timeout, self.dispatcher.dispatch(&message))
            .await
            .unwrap_or(Err(DispatchError::Timeout(timeout)));

        match result {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(e) => DeliveryOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
