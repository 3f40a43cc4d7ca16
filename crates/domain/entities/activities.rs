use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::activities;

#[derive(Debug, Clone, PartialEq, Serialize, Identifiable, Selectable, Queryable)]
#[diesel(table_name = activities)]
pub struct ActivityEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub channel_id: Uuid,
    pub title: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = activities)]
pub struct InsertActivityEntity {
    pub user_id: Uuid,
    pub channel_id: Uuid,
    pub title: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
