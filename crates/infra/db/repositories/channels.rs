use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            activities::InsertActivityEntity,
            channels::{ChannelEntity, InsertChannelEntity},
            oauths::{InsertOAuthEntity, UpdateOAuthEntity},
        },
        repositories::channels::ChannelRepository,
        value_objects::tiktok::{ChannelUpsertOutcome, ChannelUpsertPlan, TokenGrant},
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{activities, channels, oauths},
    },
};

pub struct ChannelPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ChannelPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Row writes an upsert needs, all issued inside one transaction.
trait GrantWrites {
    fn lock_channel_by_external_id(&mut self, external_id: &str) -> Result<Option<ChannelEntity>>;
    fn update_channel_expiry(
        &mut self,
        channel_id: Uuid,
        access_expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ChannelEntity>;
    fn insert_channel(&mut self, channel: &InsertChannelEntity) -> Result<ChannelEntity>;
    /// Returns the number of rows updated.
    fn update_oauth(&mut self, channel_id: Uuid, changes: &UpdateOAuthEntity) -> Result<usize>;
    fn insert_oauth(&mut self, oauth: &InsertOAuthEntity) -> Result<()>;
    fn insert_activity(&mut self, activity: &InsertActivityEntity) -> Result<()>;
}

/// Any error leaves the caller's transaction to roll back every earlier write.
fn write_grant<W: GrantWrites>(
    writes: &mut W,
    user_id: Uuid,
    grant: &TokenGrant,
    now: DateTime<Utc>,
) -> Result<ChannelUpsertOutcome> {
    let existing = writes.lock_channel_by_external_id(&grant.open_id)?;
    let plan = ChannelUpsertPlan::resolve(user_id, existing.as_ref())?;

    let outcome = match plan {
        ChannelUpsertPlan::Update { channel_id } => {
            let channel =
                writes.update_channel_expiry(channel_id, grant.access_token_expires_at, now)?;

            // A channel left without its token row heals on the next grant.
            if writes.update_oauth(channel_id, &grant.to_oauth_changes(now))? == 0 {
                writes.insert_oauth(&grant.to_oauth_entity(user_id, channel_id, now))?;
            }

            ChannelUpsertOutcome::Updated(channel)
        }
        ChannelUpsertPlan::Insert => {
            let channel = writes.insert_channel(&grant.to_channel_entity(user_id, now))?;
            writes.insert_oauth(&grant.to_oauth_entity(user_id, channel.id, now))?;
            ChannelUpsertOutcome::Created(channel)
        }
    };

    writes.insert_activity(&plan.activity(user_id, outcome.channel().id, &grant.scope, now))?;
    Ok(outcome)
}

impl GrantWrites for PgConnection {
    fn lock_channel_by_external_id(&mut self, external_id: &str) -> Result<Option<ChannelEntity>> {
        let channel = channels::table
            .filter(channels::external_id.eq(external_id))
            .select(ChannelEntity::as_select())
            .for_update()
            .first::<ChannelEntity>(self)
            .optional()?;
        Ok(channel)
    }

    fn update_channel_expiry(
        &mut self,
        channel_id: Uuid,
        access_expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<ChannelEntity> {
        let channel = diesel::update(channels::table.find(channel_id))
            .set((
                channels::access_expires_at.eq(Some(access_expires_at)),
                channels::updated_at.eq(now),
            ))
            .returning(ChannelEntity::as_select())
            .get_result::<ChannelEntity>(self)?;
        Ok(channel)
    }

    fn insert_channel(&mut self, channel: &InsertChannelEntity) -> Result<ChannelEntity> {
        let channel = diesel::insert_into(channels::table)
            .values(channel)
            .returning(ChannelEntity::as_select())
            .get_result::<ChannelEntity>(self)?;
        Ok(channel)
    }

    fn update_oauth(&mut self, channel_id: Uuid, changes: &UpdateOAuthEntity) -> Result<usize> {
        let updated = diesel::update(oauths::table.filter(oauths::channel_id.eq(channel_id)))
            .set(changes)
            .execute(self)?;
        Ok(updated)
    }

    fn insert_oauth(&mut self, oauth: &InsertOAuthEntity) -> Result<()> {
        diesel::insert_into(oauths::table).values(oauth).execute(self)?;
        Ok(())
    }

    fn insert_activity(&mut self, activity: &InsertActivityEntity) -> Result<()> {
        diesel::insert_into(activities::table)
            .values(activity)
            .execute(self)?;
        Ok(())
    }
}

#[async_trait]
impl ChannelRepository for ChannelPostgres {
    async fn apply_token_grant(
        &self,
        user_id: Uuid,
        grant: TokenGrant,
    ) -> Result<ChannelUpsertOutcome> {
        let mut pooled = Arc::clone(&self.db_pool).get()?;
        let conn: &mut PgConnection = &mut pooled;
        let now = Utc::now();

        let outcome = conn.transaction::<ChannelUpsertOutcome, anyhow::Error, _>(|conn| {
            write_grant(conn, user_id, &grant, now)
        })?;

        Ok(outcome)
    }

    async fn find_by_id_for_user(
        &self,
        channel_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ChannelEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let channel = channels::table
            .filter(channels::id.eq(channel_id))
            .filter(channels::user_id.eq(user_id))
            .select(ChannelEntity::as_select())
            .first::<ChannelEntity>(&mut conn)
            .optional()?;

        Ok(channel)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<ChannelEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let channels = channels::table
            .filter(channels::user_id.eq(user_id))
            .select(ChannelEntity::as_select())
            .order(channels::created_at.asc())
            .load::<ChannelEntity>(&mut conn)?;

        Ok(channels)
    }

    async fn list_by_platform(&self, platform_name: &str) -> Result<Vec<ChannelEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let channels = channels::table
            .filter(channels::platform_name.eq(platform_name))
            .select(ChannelEntity::as_select())
            .order(channels::created_at.asc())
            .load::<ChannelEntity>(&mut conn)?;

        Ok(channels)
    }
}
