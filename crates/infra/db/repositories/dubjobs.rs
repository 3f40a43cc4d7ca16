use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::dubjobs::{DubjobEntity, InsertDubjobEntity},
        repositories::dubjobs::DubjobRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::dubjobs},
};

pub struct DubjobPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DubjobPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DubjobRepository for DubjobPostgres {
    async fn insert(&self, dubjob: InsertDubjobEntity) -> Result<DubjobEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = diesel::insert_into(dubjobs::table)
            .values(&dubjob)
            .returning(DubjobEntity::as_select())
            .get_result::<DubjobEntity>(&mut conn)?;

        Ok(inserted)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<DubjobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let items = dubjobs::table
            .filter(dubjobs::user_id.eq(user_id))
            .select(DubjobEntity::as_select())
            .order(dubjobs::created_at.desc())
            .load::<DubjobEntity>(&mut conn)?;

        Ok(items)
    }
}
