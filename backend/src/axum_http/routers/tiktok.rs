use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use crates::{
    domain::repositories::{
        channels::ChannelRepository, job::JobRepository, oauths::OAuthRepository,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{channels::ChannelPostgres, job::JobPostgres, oauths::OAuthPostgres},
    },
    platforms::tiktok_client::{TikTokClient, TikTokGateway},
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::tiktok_oauth::{OAuthCallback, TikTokOAuthUseCase},
};

pub const CSRF_COOKIE: &str = "csrfState";
const CSRF_COOKIE_MAX_AGE_SECS: i64 = 60;

pub struct TikTokRouterState<J, C, O, T>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    pub usecase: TikTokOAuthUseCase<J, C, O, T>,
    pub secure_cookie: bool,
    pub frontend_origin: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let tiktok_client = TikTokClient::new(
        config.tiktok.client_key.clone(),
        config.tiktok.client_secret.clone(),
        &config.domains.domain_origin(),
    );
    let usecase = TikTokOAuthUseCase::new(
        Arc::new(JobPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ChannelPostgres::new(Arc::clone(&db_pool))),
        Arc::new(OAuthPostgres::new(Arc::clone(&db_pool))),
        Arc::new(tiktok_client),
    );

    router(TikTokRouterState {
        usecase,
        secure_cookie: config.is_prod,
        frontend_origin: config.domains.frontend_origin(),
    })
}

pub fn router<J, C, O, T>(state: TikTokRouterState<J, C, O, T>) -> Router
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/oauth-request", post(oauth_request))
        .route(
            "/oauth-success",
            get(oauth_success_query).post(oauth_success_form),
        )
        .route("/:channel_id/revoke-token", post(revoke_token))
        .with_state(Arc::new(state))
}

pub fn csrf_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, state))
        .max_age(cookie::time::Duration::seconds(CSRF_COOKIE_MAX_AGE_SECS))
        .http_only(true)
        .path("/")
        .secure(secure)
        .build()
}

pub async fn oauth_request<J, C, O, T>(
    State(state): State<Arc<TikTokRouterState<J, C, O, T>>>,
    auth: AuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    let redirect = state.usecase.initiate(auth.user_id)?;
    let jar = jar.add(csrf_cookie(redirect.csrf_state, state.secure_cookie));

    Ok((jar, Redirect::temporary(redirect.location.as_str())))
}

pub async fn oauth_success_query<J, C, O, T>(
    State(state): State<Arc<TikTokRouterState<J, C, O, T>>>,
    auth: AuthUser,
    jar: CookieJar,
    Query(callback): Query<OAuthCallback>,
) -> Result<impl IntoResponse, AppError>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    complete_oauth(&state, auth, jar, callback).await
}

pub async fn oauth_success_form<J, C, O, T>(
    State(state): State<Arc<TikTokRouterState<J, C, O, T>>>,
    auth: AuthUser,
    jar: CookieJar,
    Form(callback): Form<OAuthCallback>,
) -> Result<impl IntoResponse, AppError>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    complete_oauth(&state, auth, jar, callback).await
}

async fn complete_oauth<J, C, O, T>(
    state: &TikTokRouterState<J, C, O, T>,
    auth: AuthUser,
    jar: CookieJar,
    callback: OAuthCallback,
) -> Result<(CookieJar, Redirect), AppError>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    let cookie_state = jar.get(CSRF_COOKIE).map(|c| c.value().to_string());

    state
        .usecase
        .complete(auth.user_id, callback, cookie_state.as_deref())
        .await?;

    let jar = jar.remove(Cookie::build(CSRF_COOKIE).path("/"));
    let location = format!("{}/user", state.frontend_origin);
    Ok((jar, Redirect::temporary(&location)))
}

pub async fn revoke_token<J, C, O, T>(
    State(state): State<Arc<TikTokRouterState<J, C, O, T>>>,
    auth: AuthUser,
    Path(channel_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError>
where
    J: JobRepository + Send + Sync + 'static,
    C: ChannelRepository + Send + Sync + 'static,
    O: OAuthRepository + Send + Sync + 'static,
    T: TikTokGateway + Send + Sync + 'static,
{
    state.usecase.revoke(auth.user_id, channel_id).await?;
    Ok(StatusCode::OK)
}
