use anyhow::Result;
use backend::usecases::tiktok_oauth::TikTokOAuthUseCase;
use crates::{
    infra::db::{
        postgres::postgres_connection,
        repositories::{channels::ChannelPostgres, job::JobPostgres, oauths::OAuthPostgres},
    },
    platforms::tiktok_client::TikTokClient,
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{config, token_exchange, token_refresh};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!(error = ?error, "worker: exited with error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = config::config_loader::load()?;
    info!("worker: ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("worker: Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let job_repository = Arc::new(JobPostgres::new(Arc::clone(&db_pool_arc)));
    let tiktok_client = TikTokClient::new(
        dotenvy_env.tiktok.client_key.clone(),
        dotenvy_env.tiktok.client_secret.clone(),
        &dotenvy_env.domain,
    );

    let tiktok_usecase = Arc::new(TikTokOAuthUseCase::new(
        Arc::clone(&job_repository),
        Arc::new(ChannelPostgres::new(Arc::clone(&db_pool_arc))),
        Arc::new(OAuthPostgres::new(Arc::clone(&db_pool_arc))),
        Arc::new(tiktok_client),
    ));

    let token_exchange_loop = tokio::spawn(token_exchange::worker::run(
        job_repository,
        Arc::clone(&tiktok_usecase),
        dotenvy_env.schedule.job_poll_interval,
    ));

    let token_refresh_loop = tokio::spawn(token_refresh::worker::run(
        tiktok_usecase,
        dotenvy_env.schedule.token_refresh_interval,
    ));

    tokio::select! {
        result = token_exchange_loop => result??,
        result = token_refresh_loop => result??,
        _ = tokio::signal::ctrl_c() => info!("worker: received ctrl+C signal"),
    };
    Ok(())
}
