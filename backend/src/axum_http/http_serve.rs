use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::infra::db::postgres::postgres_connection::PgPoolSquad;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let frontend_origin = HeaderValue::from_str(&config.domains.frontend_origin())?;

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/platforms/tiktok",
            routers::tiktok::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest(
            "/webhooks",
            routers::stripe_webhook::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest(
            "/dubjobs",
            routers::dubjobs::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest("/channels", routers::channels::routes(Arc::clone(&db_pool)))
        .nest(
            "/activities",
            routers::activities::routes(Arc::clone(&db_pool)),
        )
        .nest("/customers", routers::customers::routes(Arc::clone(&db_pool)))
        .route("/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(frontend_origin)
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        port = config.backend_server.port,
        stage = %config.stage,
        "http: server is running"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "http: failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("http: received ctrl+C signal"),
        _ = terminate => info!("http: received terminate signal"),
    }
}
