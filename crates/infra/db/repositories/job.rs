use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::jobs::{InsertJobEntity, JobEntity},
        repositories::job::JobRepository,
        value_objects::{
            enums::{job_statuses::JobStatus, job_types::JobType},
            jobs::TokenExchangePayload,
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::jobs},
};

/// Delay before attempt `attempts + 1`, or `None` once the job has used up its attempts.
/// Exponential: 5s, 25s, 125s...
pub fn retry_backoff(attempts: i32, max_attempts: i32) -> Option<Duration> {
    if attempts >= max_attempts {
        return None;
    }
    let exponent = (attempts - 1).max(0) as u32;
    Some(Duration::seconds(5 * 5_i64.pow(exponent)))
}

/// Status and next `run_at` for a job that has just used attempt number `attempts`.
pub fn after_failed_attempt(
    attempts: i32,
    max_attempts: i32,
    now: DateTime<Utc>,
) -> (JobStatus, DateTime<Utc>) {
    match retry_backoff(attempts, max_attempts) {
        Some(delay) => (JobStatus::Queued, now + delay),
        None => (JobStatus::Dead, now),
    }
}

/// A `running` job locked at or before the returned instant has lost its lease.
pub fn lease_cutoff(now: DateTime<Utc>, lease: Duration) -> DateTime<Utc> {
    now - lease
}

const LEASE_EXPIRED_ERROR: &str = "lease expired while running";

pub struct JobPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl JobPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl JobRepository for JobPostgres {
    async fn enqueue_token_exchange_job(&self, payload: TokenExchangePayload) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let insert_entity = InsertJobEntity {
            type_: JobType::TikTokTokenExchange.to_string(),
            payload: serde_json::to_value(payload)?,
            run_at: now,
            attempts: 0,
            locked_at: None,
            locked_by: None,
            status: JobStatus::Queued.to_string(),
            error: None,
            created_at: now,
        };

        let job_id = diesel::insert_into(jobs::table)
            .values(&insert_entity)
            .returning(jobs::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(job_id)
    }

    async fn lock_next_job(&self, job_type: JobType) -> Result<Option<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let worker_id = Uuid::new_v4().to_string();
        let current_time = Utc::now();

        let job = conn.transaction::<Option<JobEntity>, diesel::result::Error, _>(|conn| {
            let candidate: Option<JobEntity> = jobs::table
                .select(JobEntity::as_select())
                .filter(jobs::type_.eq(job_type.as_str()))
                .filter(jobs::status.eq(JobStatus::Queued.as_str()))
                .filter(jobs::run_at.le(current_time))
                .order(jobs::run_at.asc())
                .for_update()
                .skip_locked()
                .first::<JobEntity>(conn)
                .optional()?;

            let Some(job) = candidate else {
                return Ok(None);
            };

            let locked = diesel::update(jobs::table.find(job.id))
                .set((
                    jobs::status.eq(JobStatus::Running.as_str()),
                    jobs::locked_at.eq(Some(current_time)),
                    jobs::locked_by.eq(Some(worker_id)),
                ))
                .returning(JobEntity::as_select())
                .get_result::<JobEntity>(conn)?;
            Ok(Some(locked))
        })?;

        Ok(job)
    }

    async fn mark_job_done(&self, job_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(JobStatus::Done.as_str()),
                jobs::locked_at.eq::<Option<DateTime<Utc>>>(None),
                jobs::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_job_failed(&self, job_id: Uuid, err: &str, max_attempts: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let current_time = Utc::now();

        let attempts = jobs::table
            .find(job_id)
            .select(jobs::attempts)
            .first::<i32>(&mut conn)?;

        let new_attempts = attempts + 1;
        let (new_status, next_run_at) =
            after_failed_attempt(new_attempts, max_attempts, current_time);

        diesel::update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(new_status.as_str()),
                jobs::attempts.eq(new_attempts),
                jobs::error.eq(Some(err)),
                jobs::run_at.eq(next_run_at),
                jobs::locked_at.eq::<Option<DateTime<Utc>>>(None),
                jobs::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn reclaim_stale_jobs(
        &self,
        job_type: JobType,
        lease: Duration,
        max_attempts: i32,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let current_time = Utc::now();
        let cutoff = lease_cutoff(current_time, lease);

        let reclaimed = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            let stale: Vec<(Uuid, i32)> = jobs::table
                .select((jobs::id, jobs::attempts))
                .filter(jobs::type_.eq(job_type.as_str()))
                .filter(jobs::status.eq(JobStatus::Running.as_str()))
                .filter(jobs::locked_at.le(cutoff))
                .for_update()
                .skip_locked()
                .load::<(Uuid, i32)>(conn)?;

            for &(job_id, attempts) in &stale {
                let new_attempts = attempts + 1;
                let (new_status, next_run_at) =
                    after_failed_attempt(new_attempts, max_attempts, current_time);

                diesel::update(jobs::table.find(job_id))
                    .set((
                        jobs::status.eq(new_status.as_str()),
                        jobs::attempts.eq(new_attempts),
                        jobs::error.eq(Some(LEASE_EXPIRED_ERROR)),
                        jobs::run_at.eq(next_run_at),
                        jobs::locked_at.eq::<Option<DateTime<Utc>>>(None),
                        jobs::locked_by.eq::<Option<String>>(None),
                    ))
                    .execute(conn)?;
            }

            Ok(stale.len())
        })?;

        Ok(reclaimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_by_factor_of_five() {
        assert_eq!(retry_backoff(1, 5), Some(Duration::seconds(5)));
        assert_eq!(retry_backoff(2, 5), Some(Duration::seconds(25)));
        assert_eq!(retry_backoff(3, 5), Some(Duration::seconds(125)));
    }

    #[test]
    fn job_is_dead_after_max_attempts() {
        assert_eq!(retry_backoff(3, 3), None);
        assert_eq!(retry_backoff(4, 3), None);
    }

    #[test]
    fn failed_attempt_requeues_with_backoff_until_dead() {
        let now = Utc::now();

        assert_eq!(
            after_failed_attempt(1, 3, now),
            (JobStatus::Queued, now + Duration::seconds(5))
        );
        assert_eq!(
            after_failed_attempt(2, 3, now),
            (JobStatus::Queued, now + Duration::seconds(25))
        );
        assert_eq!(after_failed_attempt(3, 3, now), (JobStatus::Dead, now));
    }

    #[test]
    fn lock_older_than_lease_is_stale() {
        let now: DateTime<Utc> = "2024-05-01T12:10:00Z".parse().unwrap();
        let cutoff = lease_cutoff(now, Duration::minutes(10));

        let crashed_at: DateTime<Utc> = "2024-05-01T11:59:00Z".parse().unwrap();
        let still_running_at: DateTime<Utc> = "2024-05-01T12:05:00Z".parse().unwrap();
        assert!(crashed_at <= cutoff);
        assert!(still_running_at > cutoff);
    }
}
