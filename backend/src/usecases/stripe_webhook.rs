use std::sync::Arc;

use anyhow::Result as AnyResult;
use chrono::Utc;
use crates::{
    domain::{
        entities::customers::{CustomerEntity, InsertCustomerEntity},
        repositories::{customers::CustomerRepository, users::UserRepository},
    },
    payments::stripe_client::{
        MAX_WEBHOOK_BODY_BYTES, StripeClient, StripeEvent, StripeSubscription, resolve_tier,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::axum_http::error_responses::AppError;

#[cfg_attr(test, mockall::automock)]
pub trait StripeGateway: Send + Sync {
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;
}

impl StripeGateway for StripeClient {
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        self.verify_webhook_signature(payload, signature)
    }
}

#[derive(Debug, Error)]
pub enum StripeWebhookError {
    #[error("webhook body exceeds {MAX_WEBHOOK_BODY_BYTES} bytes")]
    PayloadTooLarge,
    #[error("missing stripe-signature header")]
    MissingSignature,
    #[error("webhook signature verification failed")]
    InvalidSignature,
    #[error("unhandled stripe event type: {0}")]
    UnhandledEventType(String),
    #[error("data integrity: {0}")]
    DataIntegrity(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StripeWebhookError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            StripeWebhookError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            StripeWebhookError::MissingSignature | StripeWebhookError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            StripeWebhookError::UnhandledEventType(_)
            | StripeWebhookError::DataIntegrity(_)
            | StripeWebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StripeWebhookError> for AppError {
    fn from(err: StripeWebhookError) -> Self {
        match err {
            StripeWebhookError::PayloadTooLarge => AppError::PayloadTooLarge,
            StripeWebhookError::MissingSignature | StripeWebhookError::InvalidSignature => {
                AppError::BadRequest(err.to_string())
            }
            StripeWebhookError::Internal(cause) => AppError::Internal(cause),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, StripeWebhookError>;

/// What a handled event changed.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    CustomerCreated(CustomerEntity),
    CustomerDeleted { stripe_customer_id: String },
    SubscriptionSet(CustomerEntity),
    SubscriptionCleared(CustomerEntity),
    SubscriptionDeleteIgnored { stripe_subscription_id: String },
}

pub struct StripeWebhookUseCase<U, C, Stripe>
where
    U: UserRepository + Send + Sync + 'static,
    C: CustomerRepository + Send + Sync + 'static,
    Stripe: StripeGateway + 'static,
{
    user_repo: Arc<U>,
    customer_repo: Arc<C>,
    stripe_client: Arc<Stripe>,
}

impl<U, C, Stripe> StripeWebhookUseCase<U, C, Stripe>
where
    U: UserRepository + Send + Sync + 'static,
    C: CustomerRepository + Send + Sync + 'static,
    Stripe: StripeGateway + 'static,
{
    pub fn new(user_repo: Arc<U>, customer_repo: Arc<C>, stripe_client: Arc<Stripe>) -> Self {
        Self {
            user_repo,
            customer_repo,
            stripe_client,
        }
    }

    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> UseCaseResult<WebhookOutcome> {
        if payload.len() > MAX_WEBHOOK_BODY_BYTES {
            warn!(
                body_bytes = payload.len(),
                status = StripeWebhookError::PayloadTooLarge.status_code().as_u16(),
                "stripe_webhook: body over limit"
            );
            return Err(StripeWebhookError::PayloadTooLarge);
        }

        let signature = signature.ok_or_else(|| {
            let err = StripeWebhookError::MissingSignature;
            warn!(
                status = err.status_code().as_u16(),
                "stripe_webhook: signature header missing"
            );
            err
        })?;

        let event = self
            .stripe_client
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                let rejected = StripeWebhookError::InvalidSignature;
                warn!(
                    error = %err,
                    status = rejected.status_code().as_u16(),
                    "stripe_webhook: verification failed"
                );
                rejected
            })?;

        info!(
            event_id = ?event.id,
            event_type = %event.type_,
            "stripe_webhook: event verified"
        );

        match event.type_.as_str() {
            "customer.created" => self.on_customer_created(&event).await,
            "customer.deleted" => self.on_customer_deleted(&event).await,
            "customer.subscription.created" => self.on_subscription_created(&event).await,
            "customer.subscription.updated" => self.on_subscription_updated(&event).await,
            "customer.subscription.deleted" => self.on_subscription_deleted(&event).await,
            other => {
                let err = StripeWebhookError::UnhandledEventType(other.to_string());
                error!(
                    event_type = %other,
                    status = err.status_code().as_u16(),
                    "stripe_webhook: unhandled event type"
                );
                Err(err)
            }
        }
    }

    async fn on_customer_created(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let customer = StripeClient::extract_customer(event)?;
        let email = customer.email.clone().ok_or_else(|| {
            StripeWebhookError::DataIntegrity(format!("customer {} has no email", customer.id))
        })?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await
            .map_err(|err| {
                error!(
                    stripe_customer_id = %customer.id,
                    db_error = ?err,
                    "stripe_webhook: failed to look up user by email"
                );
                StripeWebhookError::Internal(err)
            })?
            .ok_or_else(|| {
                StripeWebhookError::DataIntegrity(format!(
                    "no user for stripe customer {}",
                    customer.id
                ))
            })?;

        let now = Utc::now();
        let inserted = self
            .customer_repo
            .insert(InsertCustomerEntity {
                user_id: user.id,
                stripe_customer_id: customer.id.clone(),
                stripe_subscription_id: None,
                tier: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|err| {
                error!(
                    user_id = %user.id,
                    stripe_customer_id = %customer.id,
                    db_error = ?err,
                    "stripe_webhook: failed to insert customer"
                );
                StripeWebhookError::Internal(err)
            })?;

        info!(
            user_id = %user.id,
            stripe_customer_id = %customer.id,
            "stripe_webhook: customer created"
        );
        Ok(WebhookOutcome::CustomerCreated(inserted))
    }

    async fn on_customer_deleted(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let customer = StripeClient::extract_customer(event)?;

        let deleted = self
            .customer_repo
            .delete_by_stripe_customer_id(&customer.id)
            .await
            .map_err(|err| {
                error!(
                    stripe_customer_id = %customer.id,
                    db_error = ?err,
                    "stripe_webhook: failed to delete customer"
                );
                StripeWebhookError::Internal(err)
            })?;

        if deleted == 0 {
            return Err(StripeWebhookError::DataIntegrity(format!(
                "no customer row for stripe customer {}",
                customer.id
            )));
        }

        info!(stripe_customer_id = %customer.id, "stripe_webhook: customer deleted");
        Ok(WebhookOutcome::CustomerDeleted {
            stripe_customer_id: customer.id,
        })
    }

    async fn on_subscription_created(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let subscription = StripeClient::extract_subscription(event)?;
        let tier = resolve_tier(Some(&subscription))?;
        let customer = self
            .customer_by_stripe_id(subscription.customer.id())
            .await?;

        self.set_subscription(customer, &subscription, tier).await
    }

    async fn on_subscription_updated(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let subscription = StripeClient::extract_subscription(event)?;
        let tier = resolve_tier(Some(&subscription))?;

        let customer = self
            .customer_repo
            .find_by_stripe_subscription_id(&subscription.id)
            .await
            .map_err(|err| {
                error!(
                    stripe_subscription_id = %subscription.id,
                    db_error = ?err,
                    "stripe_webhook: failed to look up customer by subscription"
                );
                StripeWebhookError::Internal(err)
            })?
            .ok_or_else(|| {
                StripeWebhookError::DataIntegrity(format!(
                    "no customer holds subscription {}",
                    subscription.id
                ))
            })?;

        self.set_subscription(customer, &subscription, tier).await
    }

    async fn on_subscription_deleted(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let subscription = StripeClient::extract_subscription(event)?;
        let stripe_customer_id = subscription.customer.id();

        let cleared = self
            .customer_repo
            .clear_subscription_if_current(stripe_customer_id, &subscription.id)
            .await
            .map_err(|err| {
                error!(
                    %stripe_customer_id,
                    stripe_subscription_id = %subscription.id,
                    db_error = ?err,
                    "stripe_webhook: failed to clear subscription"
                );
                StripeWebhookError::Internal(err)
            })?;

        if let Some(updated) = cleared {
            info!(customer_id = %updated.id, "stripe_webhook: subscription cleared");
            return Ok(WebhookOutcome::SubscriptionCleared(updated));
        }

        let customer = self.customer_by_stripe_id(stripe_customer_id).await?;
        info!(
            customer_id = %customer.id,
            stripe_subscription_id = %subscription.id,
            "stripe_webhook: deleted subscription is not the current one; keeping customer"
        );
        Ok(WebhookOutcome::SubscriptionDeleteIgnored {
            stripe_subscription_id: subscription.id,
        })
    }

    async fn customer_by_stripe_id(&self, stripe_customer_id: &str) -> UseCaseResult<CustomerEntity> {
        self.customer_repo
            .find_by_stripe_customer_id(stripe_customer_id)
            .await
            .map_err(|err| {
                error!(
                    %stripe_customer_id,
                    db_error = ?err,
                    "stripe_webhook: failed to look up customer"
                );
                StripeWebhookError::Internal(err)
            })?
            .ok_or_else(|| {
                StripeWebhookError::DataIntegrity(format!(
                    "no customer row for stripe customer {}",
                    stripe_customer_id
                ))
            })
    }

    async fn set_subscription(
        &self,
        customer: CustomerEntity,
        subscription: &StripeSubscription,
        tier: i32,
    ) -> UseCaseResult<WebhookOutcome> {
        let updated = self
            .customer_repo
            .update_subscription(customer.id, Some(subscription.id.clone()), tier)
            .await
            .map_err(|err| {
                error!(
                    customer_id = %customer.id,
                    stripe_subscription_id = %subscription.id,
                    db_error = ?err,
                    "stripe_webhook: failed to store subscription"
                );
                StripeWebhookError::Internal(err)
            })?;

        info!(
            customer_id = %customer.id,
            stripe_subscription_id = %subscription.id,
            tier,
            "stripe_webhook: subscription stored"
        );
        Ok(WebhookOutcome::SubscriptionSet(updated))
    }
}
