use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::channels::ChannelEntity,
    value_objects::tiktok::{ChannelUpsertOutcome, TokenGrant},
};

#[async_trait]
#[automock]
pub trait ChannelRepository {
    /// Creates or updates the channel named by `grant.open_id` together with its
    /// OAuth row and a success activity, all in one transaction.
    async fn apply_token_grant(
        &self,
        user_id: Uuid,
        grant: TokenGrant,
    ) -> Result<ChannelUpsertOutcome>;

    async fn find_by_id_for_user(
        &self,
        channel_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ChannelEntity>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ChannelEntity>>;

    async fn list_by_platform(&self, platform_name: &str) -> Result<Vec<ChannelEntity>>;
}
