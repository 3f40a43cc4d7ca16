use anyhow::Result;
use backend::usecases::tiktok_oauth::TikTokOAuthUseCase;
use crates::{
    domain::repositories::{
        channels::ChannelRepository, job::JobRepository, oauths::OAuthRepository,
    },
    platforms::tiktok_client::TikTokGateway,
};
use std::{sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Refreshes every TikTok channel once per `interval`. The first pass runs immediately.
pub async fn run<J, C, O, T>(
    usecase: Arc<TikTokOAuthUseCase<J, C, O, T>>,
    interval: Duration,
) -> Result<()>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    info!(
        interval_secs = interval.as_secs(),
        "token_refresh: starting refresh loop"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match usecase.refresh_all().await {
            Ok(summary) if summary.failed > 0 => error!(
                refreshed = summary.refreshed,
                failed = summary.failed,
                "token_refresh: some channels failed to refresh"
            ),
            Ok(summary) => info!(refreshed = summary.refreshed, "token_refresh: pass complete"),
            Err(e) => error!(error = ?e, "token_refresh: refresh pass aborted"),
        }
    }
}
