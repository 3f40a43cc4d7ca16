use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::{
        repositories::{channels::ChannelRepository, dubjobs::DubjobRepository},
        value_objects::dubbing::SubmitDubjobModel,
    },
    dubbing::elevenlabs_client::ElevenLabsClient,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{channels::ChannelPostgres, dubjobs::DubjobPostgres},
    },
};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::dubbing::{DubbingGateway, DubbingUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let dubbing_usecase = DubbingUseCase::new(
        Arc::new(ChannelPostgres::new(Arc::clone(&db_pool))),
        Arc::new(DubjobPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ElevenLabsClient::new(config.elevenlabs.api_key.clone())),
    );

    Router::new()
        .route("/", get(list_dubjobs).post(submit_dubjob))
        .with_state(Arc::new(dubbing_usecase))
}

pub async fn submit_dubjob<C, D, G>(
    State(dubbing_usecase): State<Arc<DubbingUseCase<C, D, G>>>,
    auth: AuthUser,
    Json(submit_model): Json<SubmitDubjobModel>,
) -> Result<impl IntoResponse, AppError>
where
    C: ChannelRepository + Send + Sync + 'static,
    D: DubjobRepository + Send + Sync + 'static,
    G: DubbingGateway + 'static,
{
    let dubjob = dubbing_usecase.submit(auth.user_id, submit_model).await?;
    Ok((StatusCode::CREATED, Json(dubjob)))
}

pub async fn list_dubjobs<C, D, G>(
    State(dubbing_usecase): State<Arc<DubbingUseCase<C, D, G>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    C: ChannelRepository + Send + Sync + 'static,
    D: DubjobRepository + Send + Sync + 'static,
    G: DubbingGateway + 'static,
{
    let dubjobs = dubbing_usecase.list(auth.user_id).await?;
    Ok(Json(dubjobs))
}
