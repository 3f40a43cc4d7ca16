use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::repositories::{
        activities::ActivityRepository, channels::ChannelRepository,
        customers::CustomerRepository,
    },
    infra::db::postgres::postgres_connection::PgPoolSquad,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, routers::channels::account_usecase},
    usecases::account::AccountUseCase,
};

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub channel_id: Option<Uuid>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    Router::new()
        .route("/", get(list_activities))
        .with_state(account_usecase(&db_pool))
}

pub async fn list_activities<C, A, Cust>(
    State(account_usecase): State<Arc<AccountUseCase<C, A, Cust>>>,
    auth: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, AppError>
where
    C: ChannelRepository + Send + Sync + 'static,
    A: ActivityRepository + Send + Sync + 'static,
    Cust: CustomerRepository + Send + Sync + 'static,
{
    let activities = account_usecase
        .list_activities(auth.user_id, query.channel_id)
        .await?;
    Ok(Json(activities))
}
