use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::customers::{CustomerEntity, InsertCustomerEntity},
        repositories::customers::CustomerRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::customers},
};

pub struct CustomerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CustomerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CustomerRepository for CustomerPostgres {
    async fn insert(&self, customer: InsertCustomerEntity) -> Result<CustomerEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = diesel::insert_into(customers::table)
            .values(&customer)
            .returning(CustomerEntity::as_select())
            .get_result::<CustomerEntity>(&mut conn)?;

        Ok(inserted)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<CustomerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let customer = customers::table
            .filter(customers::user_id.eq(user_id))
            .select(CustomerEntity::as_select())
            .first::<CustomerEntity>(&mut conn)
            .optional()?;

        Ok(customer)
    }

    async fn find_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> Result<Option<CustomerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let customer = customers::table
            .filter(customers::stripe_customer_id.eq(stripe_customer_id))
            .select(CustomerEntity::as_select())
            .first::<CustomerEntity>(&mut conn)
            .optional()?;

        Ok(customer)
    }

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<CustomerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let customer = customers::table
            .filter(customers::stripe_subscription_id.eq(stripe_subscription_id))
            .select(CustomerEntity::as_select())
            .first::<CustomerEntity>(&mut conn)
            .optional()?;

        Ok(customer)
    }

    async fn delete_by_stripe_customer_id(&self, stripe_customer_id: &str) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = diesel::delete(
            customers::table.filter(customers::stripe_customer_id.eq(stripe_customer_id)),
        )
        .execute(&mut conn)?;

        Ok(deleted)
    }

    async fn update_subscription(
        &self,
        customer_id: Uuid,
        stripe_subscription_id: Option<String>,
        tier: i32,
    ) -> Result<CustomerEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = diesel::update(customers::table.find(customer_id))
            .set((
                customers::stripe_subscription_id.eq(stripe_subscription_id),
                customers::tier.eq(tier),
                customers::updated_at.eq(Utc::now()),
            ))
            .returning(CustomerEntity::as_select())
            .get_result::<CustomerEntity>(&mut conn)?;

        Ok(updated)
    }

    async fn clear_subscription_if_current(
        &self,
        stripe_customer_id: &str,
        stripe_subscription_id: &str,
    ) -> Result<Option<CustomerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let cleared = diesel::update(
            customers::table
                .filter(customers::stripe_customer_id.eq(stripe_customer_id))
                .filter(customers::stripe_subscription_id.eq(stripe_subscription_id)),
        )
        .set((
            customers::stripe_subscription_id.eq(None::<String>),
            customers::tier.eq(0),
            customers::updated_at.eq(Utc::now()),
        ))
        .returning(CustomerEntity::as_select())
        .get_result::<CustomerEntity>(&mut conn)
        .optional()?;

        Ok(cleared)
    }
}
