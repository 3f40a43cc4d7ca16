use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::dubjobs::{DubjobEntity, InsertDubjobEntity};

#[async_trait]
#[automock]
pub trait DubjobRepository {
    async fn insert(&self, dubjob: InsertDubjobEntity) -> Result<DubjobEntity>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<DubjobEntity>>;
}
