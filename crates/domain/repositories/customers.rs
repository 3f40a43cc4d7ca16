use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::customers::{CustomerEntity, InsertCustomerEntity};

#[async_trait]
#[automock]
pub trait CustomerRepository {
    async fn insert(&self, customer: InsertCustomerEntity) -> Result<CustomerEntity>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<CustomerEntity>>;

    async fn find_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> Result<Option<CustomerEntity>>;

    async fn find_by_stripe_subscription_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<CustomerEntity>>;

    /// Returns the number of rows removed.
    async fn delete_by_stripe_customer_id(&self, stripe_customer_id: &str) -> Result<usize>;

    async fn update_subscription(
        &self,
        customer_id: Uuid,
        stripe_subscription_id: Option<String>,
        tier: i32,
    ) -> Result<CustomerEntity>;

    /// Clears the subscription and resets the tier only while
    /// `stripe_subscription_id` is still the customer's current one.
    /// `None` means no row matched both ids.
    async fn clear_subscription_if_current(
        &self,
        stripe_customer_id: &str,
        stripe_subscription_id: &str,
    ) -> Result<Option<CustomerEntity>>;
}
