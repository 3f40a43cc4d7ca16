use std::sync::Arc;

use crates::domain::{
    entities::{activities::ActivityEntity, customers::CustomerEntity},
    repositories::{
        activities::ActivityRepository, channels::ChannelRepository,
        customers::CustomerRepository,
    },
    value_objects::channels::ChannelModel,
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::axum_http::error_responses::AppError;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("customer not found")]
    CustomerNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::CustomerNotFound => AppError::NotFound,
            AccountError::Internal(cause) => AppError::Internal(cause),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AccountError>;

/// Read-only views of the caller's own rows.
pub struct AccountUseCase<C, A, Cust>
where
    C: ChannelRepository + Send + Sync + 'static,
    A: ActivityRepository + Send + Sync + 'static,
    Cust: CustomerRepository + Send + Sync + 'static,
{
    channel_repo: Arc<C>,
    activity_repo: Arc<A>,
    customer_repo: Arc<Cust>,
}

impl<C, A, Cust> AccountUseCase<C, A, Cust>
where
    C: ChannelRepository + Send + Sync + 'static,
    A: ActivityRepository + Send + Sync + 'static,
    Cust: CustomerRepository + Send + Sync + 'static,
{
    pub fn new(channel_repo: Arc<C>, activity_repo: Arc<A>, customer_repo: Arc<Cust>) -> Self {
        Self {
            channel_repo,
            activity_repo,
            customer_repo,
        }
    }

    pub async fn list_channels(&self, user_id: Uuid) -> UseCaseResult<Vec<ChannelModel>> {
        let channels = self.channel_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "account: failed to list channels");
            AccountError::Internal(err)
        })?;

        Ok(channels.into_iter().map(ChannelModel::from).collect())
    }

    pub async fn list_activities(
        &self,
        user_id: Uuid,
        channel_id: Option<Uuid>,
    ) -> UseCaseResult<Vec<ActivityEntity>> {
        self.activity_repo
            .list_by_user(user_id, channel_id)
            .await
            .map_err(|err| {
                error!(%user_id, ?channel_id, db_error = ?err, "account: failed to list activities");
                AccountError::Internal(err)
            })
    }

    pub async fn current_customer(&self, user_id: Uuid) -> UseCaseResult<CustomerEntity> {
        self.customer_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "account: failed to load customer");
                AccountError::Internal(err)
            })?
            .ok_or(AccountError::CustomerNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::channels::ChannelEntity,
        repositories::{
            activities::MockActivityRepository, channels::MockChannelRepository,
            customers::MockCustomerRepository,
        },
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn channels_are_listed_without_tokens() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let channel = ChannelEntity {
            id: Uuid::new_v4(),
            user_id,
            platform_name: "tiktok".to_string(),
            external_id: "open-1".to_string(),
            access_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut channel_repo = MockChannelRepository::new();
        let listed = channel.clone();
        channel_repo
            .expect_list_by_user()
            .with(eq(user_id))
            .returning(move |_| {
                let listed = vec![listed.clone()];
                Box::pin(async move { Ok(listed) })
            });

        let usecase = AccountUseCase::new(
            Arc::new(channel_repo),
            Arc::new(MockActivityRepository::new()),
            Arc::new(MockCustomerRepository::new()),
        );

        let channels = usecase.list_channels(user_id).await.unwrap();
        assert_eq!(channels, vec![ChannelModel::from(channel)]);
    }

    #[tokio::test]
    async fn activity_filter_is_passed_through() {
        let user_id = Uuid::new_v4();
        let channel_id = Uuid::new_v4();

        let mut activity_repo = MockActivityRepository::new();
        activity_repo
            .expect_list_by_user()
            .with(eq(user_id), eq(Some(channel_id)))
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(Vec::new()) }));

        let usecase = AccountUseCase::new(
            Arc::new(MockChannelRepository::new()),
            Arc::new(activity_repo),
            Arc::new(MockCustomerRepository::new()),
        );

        assert!(
            usecase
                .list_activities(user_id, Some(channel_id))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn missing_customer_is_not_found() {
        let mut customer_repo = MockCustomerRepository::new();
        customer_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async move { Ok(None) }));

        let usecase = AccountUseCase::new(
            Arc::new(MockChannelRepository::new()),
            Arc::new(MockActivityRepository::new()),
            Arc::new(customer_repo),
        );

        let err = usecase.current_customer(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(AppError::from(err), AppError::NotFound));
    }
}
