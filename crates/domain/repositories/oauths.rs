use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::oauths::OAuthEntity;

#[async_trait]
#[automock]
pub trait OAuthRepository {
    async fn find_by_channel(&self, channel_id: Uuid) -> Result<Option<OAuthEntity>>;

    async fn find_by_user_and_channel(
        &self,
        user_id: Uuid,
        channel_id: Uuid,
    ) -> Result<Option<OAuthEntity>>;
}
