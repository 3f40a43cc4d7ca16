use anyhow::Result;
use chrono::Duration;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::jobs::JobEntity,
    value_objects::{enums::job_types::JobType, jobs::TokenExchangePayload},
};

#[async_trait]
#[automock]
pub trait JobRepository {
    async fn enqueue_token_exchange_job(&self, payload: TokenExchangePayload) -> Result<Uuid>;

    async fn lock_next_job(&self, job_type: JobType) -> Result<Option<JobEntity>>;

    async fn mark_job_done(&self, job_id: Uuid) -> Result<()>;

    async fn mark_job_failed(&self, job_id: Uuid, err: &str, max_attempts: i32) -> Result<()>;

    /// Requeues or kills `running` jobs whose lock is older than `lease`.
    /// Each reclaim counts as a failed attempt. Returns the number of jobs touched.
    async fn reclaim_stale_jobs(
        &self,
        job_type: JobType,
        lease: Duration,
        max_attempts: i32,
    ) -> Result<usize>;
}
