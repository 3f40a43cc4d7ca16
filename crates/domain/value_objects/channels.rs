use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::channels::ChannelEntity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelModel {
    pub id: Uuid,
    pub platform_name: String,
    pub external_id: String,
    pub access_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChannelEntity> for ChannelModel {
    fn from(entity: ChannelEntity) -> Self {
        Self {
            id: entity.id,
            platform_name: entity.platform_name,
            external_id: entity.external_id,
            access_expires_at: entity.access_expires_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
