use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::activities::{ActivityEntity, InsertActivityEntity};

/// Activities are append-only.
#[async_trait]
#[automock]
pub trait ActivityRepository {
    async fn insert(&self, activity: InsertActivityEntity) -> Result<ActivityEntity>;

    /// Newest first. `channel_id` narrows the log to one channel.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        channel_id: Option<Uuid>,
    ) -> Result<Vec<ActivityEntity>>;
}
