use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::{
        activities::ActivityRepository, channels::ChannelRepository,
        customers::CustomerRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            activities::ActivityPostgres, channels::ChannelPostgres, customers::CustomerPostgres,
        },
    },
};

use crate::{auth::AuthUser, axum_http::error_responses::AppError, usecases::account::AccountUseCase};

pub type AccountPostgresUseCase = AccountUseCase<ChannelPostgres, ActivityPostgres, CustomerPostgres>;

/// Shared by the channel, activity and customer routers.
pub fn account_usecase(db_pool: &Arc<PgPoolSquad>) -> Arc<AccountPostgresUseCase> {
    Arc::new(AccountUseCase::new(
        Arc::new(ChannelPostgres::new(Arc::clone(db_pool))),
        Arc::new(ActivityPostgres::new(Arc::clone(db_pool))),
        Arc::new(CustomerPostgres::new(Arc::clone(db_pool))),
    ))
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    Router::new()
        .route("/", get(list_channels))
        .with_state(account_usecase(&db_pool))
}

pub async fn list_channels<C, A, Cust>(
    State(account_usecase): State<Arc<AccountUseCase<C, A, Cust>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    C: ChannelRepository + Send + Sync + 'static,
    A: ActivityRepository + Send + Sync + 'static,
    Cust: CustomerRepository + Send + Sync + 'static,
{
    let channels = account_usecase.list_channels(auth.user_id).await?;
    Ok(Json(channels))
}
