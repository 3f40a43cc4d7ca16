use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use crates::{
    domain::repositories::{customers::CustomerRepository, users::UserRepository},
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{customers::CustomerPostgres, users::UserPostgres},
    },
    payments::stripe_client::{MAX_WEBHOOK_BODY_BYTES, StripeClient},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::{
    axum_http::error_responses::AppError,
    config::config_model::DotEnvyConfig,
    usecases::stripe_webhook::{StripeGateway, StripeWebhookUseCase},
};

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let usecase = StripeWebhookUseCase::new(
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        Arc::new(CustomerPostgres::new(Arc::clone(&db_pool))),
        Arc::new(StripeClient::new(config.stripe.webhook_key.clone())),
    );

    router(Arc::new(usecase))
}

pub fn router<U, C, S>(usecase: Arc<StripeWebhookUseCase<U, C, S>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
    C: CustomerRepository + Send + Sync + 'static,
    S: StripeGateway + 'static,
{
    Router::new()
        .route("/stripe", post(stripe_webhook))
        .layer(RequestBodyLimitLayer::new(MAX_WEBHOOK_BODY_BYTES))
        .with_state(usecase)
}

pub async fn stripe_webhook<U, C, S>(
    State(usecase): State<Arc<StripeWebhookUseCase<U, C, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError>
where
    U: UserRepository + Send + Sync + 'static,
    C: CustomerRepository + Send + Sync + 'static,
    S: StripeGateway + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = usecase.handle_webhook(&body, signature).await?;
    info!(?outcome, "stripe_webhook router: event handled");

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use crates::domain::repositories::{
        customers::MockCustomerRepository, users::MockUserRepository,
    };
    use tower::ServiceExt;

    use crate::usecases::stripe_webhook::MockStripeGateway;

    fn test_router(stripe: MockStripeGateway) -> Router {
        router(Arc::new(StripeWebhookUseCase::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockCustomerRepository::new()),
            Arc::new(stripe),
        )))
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_413() {
        let mut stripe = MockStripeGateway::new();
        stripe.expect_verify_webhook_signature().never();

        let request = Request::builder()
            .method("POST")
            .uri("/stripe")
            .header(SIGNATURE_HEADER, "t=1,v1=00")
            .header("content-length", MAX_WEBHOOK_BODY_BYTES + 1)
            .body(Body::from(vec![b'x'; MAX_WEBHOOK_BODY_BYTES + 1]))
            .unwrap();

        let response = test_router(stripe).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn missing_signature_is_bad_request() {
        let mut stripe = MockStripeGateway::new();
        stripe.expect_verify_webhook_signature().never();

        let request = Request::builder()
            .method("POST")
            .uri("/stripe")
            .body(Body::from("{}"))
            .unwrap();

        let response = test_router(stripe).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejected_signature_is_bad_request() {
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_verify_webhook_signature()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("invalid webhook signature")));

        let request = Request::builder()
            .method("POST")
            .uri("/stripe")
            .header(SIGNATURE_HEADER, "t=1,v1=deadbeef")
            .body(Body::from("{}"))
            .unwrap();

        let response = test_router(stripe).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
