use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use market_types::domain::offer::{Offer, OfferId};
use market_types::domain::order::{Order, OrderFields, OrderId};
use market_types::domain::user::{User, UserFields, UserId};
use market_types::ports::offer_repository::OfferRepository;
use market_types::ports::order_repository::OrderRepository;
use market_types::ports::user_repository::UserRepository;
use market_types::ports::RepoError;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub users: Arc<DashMap<UserId, User>>,
    pub orders: Arc<DashMap<OrderId, Order>>,
    pub offers: Arc<DashMap<OfferId, Offer>>,
    next_user_id: Arc<AtomicI64>,
    next_order_id: Arc<AtomicI64>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            offers: Arc::new(DashMap::new()),
            next_user_id: Arc::new(AtomicI64::new(1)),
            next_order_id: Arc::new(AtomicI64::new(1)),
        }
    }

    fn check_user_refs(&self, fields: &OrderFields) -> Result<(), RepoError> {
        for (column, id) in fields.user_refs() {
            self.check_ref(&self.users, "users", column, id)?;
        }
        Ok(())
    }

    fn check_ref<V>(
        &self,
        table: &DashMap<i64, V>,
        table_name: &str,
        column: &str,
        id: Option<i64>,
    ) -> Result<(), RepoError> {
        match id {
            Some(id) if !table.contains_key(&id) => Err(RepoError::Constraint(format!(
                "{column} references missing {table_name} row {id}"
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts under `id`, keeping `next_id` past every id ever stored so
/// generated ids stay fresh after explicit inserts and deletes.
fn insert_unique<V: Clone>(
    table: &DashMap<i64, V>,
    next_id: &AtomicI64,
    table_name: &str,
    id: i64,
    value: V,
) -> Result<V, RepoError> {
    match table.entry(id) {
        Entry::Occupied(_) => Err(RepoError::Constraint(format!(
            "duplicate id {id} in {table_name}"
        ))),
        Entry::Vacant(slot) => {
            let next = id.checked_add(1).ok_or_else(|| exhausted(table_name))?;
            slot.insert(value.clone());
            next_id.fetch_max(next, Ordering::SeqCst);
            Ok(value)
        }
    }
}

fn exhausted(table_name: &str) -> RepoError {
    RepoError::Constraint(format!("id space exhausted in {table_name}"))
}

/// Hands out the next generated id. The counter never moves past
/// `i64::MAX`, so once it sits there every caller gets an error.
fn next_generated(next_id: &AtomicI64, table_name: &str) -> Result<i64, RepoError> {
    next_id
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
        .map_err(|_| exhausted(table_name))
}

fn sorted<V: Clone>(table: &DashMap<i64, V>) -> Vec<V> {
    let mut rows: Vec<(i64, V)> = table
        .iter()
        .map(|kv| (*kv.key(), kv.value().clone()))
        .collect();
    rows.sort_by_key(|(id, _)| *id);
    rows.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl UserRepository for InMemoryRepo {
    async fn create_user(&self, fields: UserFields) -> Result<User, RepoError> {
        let id = next_generated(&self.next_user_id, "users")?;
        insert_unique(
            &self.users,
            &self.next_user_id,
            "users",
            id,
            User::new(id, fields),
        )
    }

    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        insert_unique(&self.users, &self.next_user_id, "users", user.id, user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(&id).map(|r| r.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        Ok(sorted(&self.users))
    }

    async fn replace_user(
        &self,
        id: UserId,
        fields: UserFields,
    ) -> Result<Option<User>, RepoError> {
        if let Some(mut v) = self.users.get_mut(&id) {
            v.fields = fields;
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepoError> {
        Ok(self.users.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create_order(&self, fields: OrderFields) -> Result<Order, RepoError> {
        self.check_user_refs(&fields)?;
        let id = next_generated(&self.next_order_id, "orders")?;
        insert_unique(
            &self.orders,
            &self.next_order_id,
            "orders",
            id,
            Order::new(id, fields),
        )
    }

    async fn insert_order(&self, order: Order) -> Result<Order, RepoError> {
        self.check_user_refs(&order.fields)?;
        insert_unique(&self.orders, &self.next_order_id, "orders", order.id, order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        Ok(sorted(&self.orders))
    }

    async fn replace_order(
        &self,
        id: OrderId,
        fields: OrderFields,
    ) -> Result<Option<Order>, RepoError> {
        if !self.orders.contains_key(&id) {
            return Ok(None);
        }
        self.check_user_refs(&fields)?;
        if let Some(mut v) = self.orders.get_mut(&id) {
            v.fields = fields;
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepoError> {
        Ok(self.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl OfferRepository for InMemoryRepo {
    async fn insert_offer(&self, offer: Offer) -> Result<Offer, RepoError> {
        self.check_ref(&self.orders, "orders", "order_id", offer.order_id)?;
        self.check_ref(&self.users, "users", "executor_id", offer.executor_id)?;
        match self.offers.entry(offer.id) {
            Entry::Occupied(_) => Err(RepoError::Constraint(format!(
                "duplicate id {} in offers",
                offer.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(offer.clone());
                Ok(offer)
            }
        }
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, RepoError> {
        Ok(self.offers.get(&id).map(|r| r.clone()))
    }

    async fn list_offers(&self) -> Result<Vec<Offer>, RepoError> {
        Ok(sorted(&self.offers))
    }
}
