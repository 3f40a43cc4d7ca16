use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::dubjobs;

#[derive(Debug, Clone, PartialEq, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = dubjobs)]
pub struct DubjobEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub channel_id: Uuid,
    pub source_url: String,
    pub target_language: String,
    pub external_id: String,
    pub expected_ready_at: DateTime<Utc>,
    pub output_url: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = dubjobs)]
pub struct InsertDubjobEntity {
    pub user_id: Uuid,
    pub channel_id: Uuid,
    pub source_url: String,
    pub target_language: String,
    pub external_id: String,
    pub expected_ready_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
