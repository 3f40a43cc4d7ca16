use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::activities::{ActivityEntity, InsertActivityEntity},
        repositories::activities::ActivityRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::activities},
};

pub struct ActivityPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ActivityPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ActivityRepository for ActivityPostgres {
    async fn insert(&self, activity: InsertActivityEntity) -> Result<ActivityEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = diesel::insert_into(activities::table)
            .values(&activity)
            .returning(ActivityEntity::as_select())
            .get_result::<ActivityEntity>(&mut conn)?;

        Ok(inserted)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        channel_id: Option<Uuid>,
    ) -> Result<Vec<ActivityEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = activities::table
            .filter(activities::user_id.eq(user_id))
            .select(ActivityEntity::as_select())
            .order(activities::created_at.desc())
            .into_boxed();

        if let Some(channel_id) = channel_id {
            query = query.filter(activities::channel_id.eq(channel_id));
        }

        let items = query.load::<ActivityEntity>(&mut conn)?;

        Ok(items)
    }
}
