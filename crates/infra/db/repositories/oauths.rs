use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{entities::oauths::OAuthEntity, repositories::oauths::OAuthRepository},
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::oauths},
};

pub struct OAuthPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OAuthPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OAuthRepository for OAuthPostgres {
    async fn find_by_channel(&self, channel_id: Uuid) -> Result<Option<OAuthEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let oauth = oauths::table
            .filter(oauths::channel_id.eq(channel_id))
            .select(OAuthEntity::as_select())
            .first::<OAuthEntity>(&mut conn)
            .optional()?;

        Ok(oauth)
    }

    async fn find_by_user_and_channel(
        &self,
        user_id: Uuid,
        channel_id: Uuid,
    ) -> Result<Option<OAuthEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let oauth = oauths::table
            .filter(oauths::user_id.eq(user_id))
            .filter(oauths::channel_id.eq(channel_id))
            .select(OAuthEntity::as_select())
            .first::<OAuthEntity>(&mut conn)
            .optional()?;

        Ok(oauth)
    }
}
