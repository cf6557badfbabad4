use async_trait::async_trait;

use super::RepoError;
use crate::domain::order::{Order, OrderFields, OrderId};

/// Writes fail with [`RepoError::Constraint`] when `customer_id` or
/// `executor_id` is set but names no user.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create_order(&self, fields: OrderFields) -> Result<Order, RepoError>;
    async fn insert_order(&self, order: Order) -> Result<Order, RepoError>;
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError>;
    async fn list_orders(&self) -> Result<Vec<Order>, RepoError>;
    async fn replace_order(
        &self,
        id: OrderId,
        fields: OrderFields,
    ) -> Result<Option<Order>, RepoError>;
    async fn delete_order(&self, id: OrderId) -> Result<bool, RepoError>;
}
