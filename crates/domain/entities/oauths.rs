use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::oauths;

/// Token pair for a channel. Never serialized: tokens stay server-side.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = oauths)]
pub struct OAuthEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub channel_id: Uuid,
    pub scope: String,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = oauths)]
pub struct InsertOAuthEntity {
    pub user_id: Uuid,
    pub channel_id: Uuid,
    pub scope: String,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = oauths)]
pub struct UpdateOAuthEntity {
    pub scope: String,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
