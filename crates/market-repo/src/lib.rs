#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use market_types::domain::offer::{Offer, OfferId};
use market_types::domain::order::{Order, OrderFields, OrderId};
use market_types::domain::user::{User, UserFields, UserId};
use market_types::ports::offer_repository::OfferRepository;
use market_types::ports::order_repository::OrderRepository;
use market_types::ports::user_repository::UserRepository;
use market_types::ports::RepoError;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// `DATABASE_URL` value selecting the DashMap store.
pub const MEMORY_URL: &str = "memory://";
/// Default store: a private in-memory SQLite database, empty on every start.
pub const DEFAULT_SQLITE_URL: &str = "sqlite::memory:";

macro_rules! dispatch {
    ($self:ident, $r:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($r) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($r) => $call,
        }
    };
}

#[derive(Clone)]
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_SQLITE_URL);
        Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // If both features are enabled the URL decides.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(MEMORY_URL) => Ok(Self::Memory(memory::InMemoryRepo::new())),
            other => {
                let url = other.unwrap_or(DEFAULT_SQLITE_URL);
                Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Self::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for Repo {
    async fn create_user(&self, fields: UserFields) -> Result<User, RepoError> {
        dispatch!(self, r => r.create_user(fields).await)
    }

    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        dispatch!(self, r => r.insert_user(user).await)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.get_user(id).await)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        dispatch!(self, r => r.list_users().await)
    }

    async fn replace_user(
        &self,
        id: UserId,
        fields: UserFields,
    ) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.replace_user(id, fields).await)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_user(id).await)
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create_order(&self, fields: OrderFields) -> Result<Order, RepoError> {
        dispatch!(self, r => r.create_order(fields).await)
    }

    async fn insert_order(&self, order: Order) -> Result<Order, RepoError> {
        dispatch!(self, r => r.insert_order(order).await)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get_order(id).await)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders().await)
    }

    async fn replace_order(
        &self,
        id: OrderId,
        fields: OrderFields,
    ) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.replace_order(id, fields).await)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepoError> {
        dispatch!(self, r => r.delete_order(id).await)
    }
}

#[async_trait::async_trait]
impl OfferRepository for Repo {
    async fn insert_offer(&self, offer: Offer) -> Result<Offer, RepoError> {
        dispatch!(self, r => r.insert_offer(offer).await)
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, RepoError> {
        dispatch!(self, r => r.get_offer(id).await)
    }

    async fn list_offers(&self) -> Result<Vec<Offer>, RepoError> {
        dispatch!(self, r => r.list_offers().await)
    }
}
