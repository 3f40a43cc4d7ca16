use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::{
        activities::ActivityRepository, channels::ChannelRepository,
        customers::CustomerRepository,
    },
    infra::db::postgres::postgres_connection::PgPoolSquad,
};

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, routers::channels::account_usecase},
    usecases::account::AccountUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    Router::new()
        .route("/me", get(current_customer))
        .with_state(account_usecase(&db_pool))
}

pub async fn current_customer<C, A, Cust>(
    State(account_usecase): State<Arc<AccountUseCase<C, A, Cust>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    C: ChannelRepository + Send + Sync + 'static,
    A: ActivityRepository + Send + Sync + 'static,
    Cust: CustomerRepository + Send + Sync + 'static,
{
    let customer = account_usecase.current_customer(auth.user_id).await?;
    Ok(Json(customer))
}
