use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::UserEntity;

#[async_trait]
#[automock]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;
}
