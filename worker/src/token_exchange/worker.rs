use anyhow::{Context, Result};
use backend::usecases::tiktok_oauth::TikTokOAuthUseCase;
use crates::{
    domain::{
        entities::jobs::JobEntity,
        repositories::{
            channels::ChannelRepository, job::JobRepository, oauths::OAuthRepository,
        },
        value_objects::{enums::job_types::JobType, jobs::TokenExchangePayload},
    },
    platforms::tiktok_client::TikTokGateway,
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MAX_ATTEMPTS: i32 = 3;

/// How long a `running` job may stay locked before another poll reclaims it.
pub const JOB_LEASE_SECS: i64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPoll {
    Idle,
    Done(Uuid),
    Failed(Uuid),
}

pub async fn run<J, C, O, T>(
    job_repo: Arc<J>,
    usecase: Arc<TikTokOAuthUseCase<J, C, O, T>>,
    poll_interval: Duration,
) -> Result<()>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    info!("token_exchange: starting worker loop");
    loop {
        if let Err(e) = reclaim_stale(job_repo.as_ref()).await {
            error!(error = ?e, "token_exchange: failed to reclaim stale jobs");
        }

        match process_next_job(job_repo.as_ref(), usecase.as_ref()).await {
            Ok(JobPoll::Idle) => tokio::time::sleep(poll_interval).await,
            Ok(_) => {}
            Err(e) => {
                error!(error = ?e, "token_exchange: error polling job queue");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

/// Puts jobs left `running` by a crashed or stopped worker back through the retry path.
pub async fn reclaim_stale<J>(job_repo: &J) -> Result<usize>
where
    J: JobRepository + Send + Sync + 'static,
{
    let reclaimed = job_repo
        .reclaim_stale_jobs(
            JobType::TikTokTokenExchange,
            chrono::Duration::seconds(JOB_LEASE_SECS),
            MAX_ATTEMPTS,
        )
        .await?;

    if reclaimed > 0 {
        warn!(reclaimed, "token_exchange: reclaimed jobs with expired leases");
    }
    Ok(reclaimed)
}

/// Locks one queued exchange job and settles it as done or failed.
pub async fn process_next_job<J, C, O, T>(
    job_repo: &J,
    usecase: &TikTokOAuthUseCase<J, C, O, T>,
) -> Result<JobPoll>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    let Some(job) = job_repo.lock_next_job(JobType::TikTokTokenExchange).await? else {
        return Ok(JobPoll::Idle);
    };

    info!(job_id = %job.id, attempts = job.attempts, "token_exchange: processing job");
    match exchange(usecase, &job).await {
        Ok(()) => {
            job_repo.mark_job_done(job.id).await.map_err(|err| {
                error!(job_id = %job.id, db_error = ?err, "token_exchange: failed to mark job done");
                err
            })?;
            info!(job_id = %job.id, "token_exchange: job processed successfully");
            Ok(JobPoll::Done(job.id))
        }
        Err(e) => {
            error!(
                job_id = %job.id,
                attempts = job.attempts + 1,
                error = ?e,
                "token_exchange: failed to process job"
            );
            job_repo
                .mark_job_failed(job.id, &format!("{:#}", e), MAX_ATTEMPTS)
                .await
                .map_err(|mark_err| {
                    error!(
                        job_id = %job.id,
                        db_error = ?mark_err,
                        "token_exchange: failed to mark job as failed"
                    );
                    mark_err
                })?;
            Ok(JobPoll::Failed(job.id))
        }
    }
}

async fn exchange<J, C, O, T>(usecase: &TikTokOAuthUseCase<J, C, O, T>, job: &JobEntity) -> Result<()>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    let payload: TokenExchangePayload = serde_json::from_value(job.payload.clone())
        .context("token exchange payload is malformed")?;

    usecase
        .exchange_and_store(payload.user_id, &payload.code)
        .await?;
    Ok(())
}
