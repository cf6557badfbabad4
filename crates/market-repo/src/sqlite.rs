use async_trait::async_trait;
use market_types::domain::offer::{Offer, OfferId};
use market_types::domain::order::{Order, OrderFields, OrderId};
use market_types::domain::user::{User, UserFields, UserId};
use market_types::ports::offer_repository::OfferRepository;
use market_types::ports::order_repository::OrderRepository;
use market_types::ports::user_repository::UserRepository;
use market_types::ports::RepoError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

const MIGRATIONS: [&str; 3] = [
    include_str!("../migrations/0001_create_users.sql"),
    include_str!("../migrations/0002_create_orders.sql"),
    include_str!("../migrations/0003_create_offers.sql"),
];

const USER_COLUMNS: &str = "id, first_name, last_name, age, email, role, phone";
const ORDER_COLUMNS: &str =
    "id, name, description, start_date, end_date, address, price, customer_id, executor_id";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbUser {
    id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    age: Option<i64>,
    email: Option<String>,
    role: Option<String>,
    phone: Option<String>,
}

impl From<DbUser> for User {
    fn from(r: DbUser) -> Self {
        User::new(
            r.id,
            UserFields {
                first_name: r.first_name,
                last_name: r.last_name,
                age: r.age,
                email: r.email,
                role: r.role,
                phone: r.phone,
            },
        )
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: i64,
    name: Option<String>,
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    address: Option<String>,
    price: Option<i64>,
    customer_id: Option<i64>,
    executor_id: Option<i64>,
}

impl From<DbOrder> for Order {
    fn from(r: DbOrder) -> Self {
        Order::new(
            r.id,
            OrderFields {
                name: r.name,
                description: r.description,
                start_date: r.start_date,
                end_date: r.end_date,
                address: r.address,
                price: r.price,
                customer_id: r.customer_id,
                executor_id: r.executor_id,
            },
        )
    }
}

#[derive(FromRow)]
struct DbOffer {
    id: i64,
    order_id: Option<i64>,
    executor_id: Option<i64>,
}

impl From<DbOffer> for Offer {
    fn from(r: DbOffer) -> Self {
        Offer {
            id: r.id,
            order_id: r.order_id,
            executor_id: r.executor_id,
        }
    }
}

fn db_err(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Constraint(db.message().to_string())
        }
        _ => RepoError::DbError(e.to_string()),
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Foreign keys are checked here rather than by SQLite so that deleting a
/// referenced row is still allowed.
async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    id: Option<i64>,
) -> Result<(), RepoError> {
    let Some(id) = id else {
        return Ok(());
    };
    let found: Option<(i64,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;
    if found.is_none() {
        return Err(RepoError::Constraint(format!(
            "{column} references missing {table} row {id}"
        )));
    }
    Ok(())
}

async fn ensure_user_refs(
    conn: &mut SqliteConnection,
    fields: &OrderFields,
) -> Result<(), RepoError> {
    for (column, id) in fields.user_refs() {
        ensure_exists(&mut *conn, "users", column, id).await?;
    }
    Ok(())
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = is_in_memory(database_url);
        // Ensure on-disk SQLite target directory exists.
        if !in_memory {
            if let Some(path) = database_url.strip_prefix("sqlite://") {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(false);

        // Every connection to `:memory:` opens its own database, so pin one.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePool::connect_with(options).await?
        };

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }
        tracing::debug!(database_url, in_memory, "sqlite store ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserRepository for SqliteRepo {
    async fn create_user(&self, fields: UserFields) -> Result<User, RepoError> {
        let res = sqlx::query(
            "INSERT INTO users (first_name, last_name, age, email, role, phone)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(fields.first_name.as_deref())
        .bind(fields.last_name.as_deref())
        .bind(fields.age)
        .bind(fields.email.as_deref())
        .bind(fields.role.as_deref())
        .bind(fields.phone.as_deref())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(User::new(res.last_insert_rowid(), fields))
    }

    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let f = &user.fields;
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, age, email, role, phone)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(f.first_name.as_deref())
        .bind(f.last_name.as_deref())
        .bind(f.age)
        .bind(f.email.as_deref())
        .bind(f.role.as_deref())
        .bind(f.phone.as_deref())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let rows: Vec<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn replace_user(
        &self,
        id: UserId,
        fields: UserFields,
    ) -> Result<Option<User>, RepoError> {
        let updated = sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, age = ?, email = ?, role = ?, phone = ?
             WHERE id = ?",
        )
        .bind(fields.first_name.as_deref())
        .bind(fields.last_name.as_deref())
        .bind(fields.age)
        .bind(fields.email.as_deref())
        .bind(fields.role.as_deref())
        .bind(fields.phone.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(User::new(id, fields)))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create_order(&self, fields: OrderFields) -> Result<Order, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        ensure_user_refs(&mut *tx, &fields).await?;
        let res = sqlx::query(
            "INSERT INTO orders (name, description, start_date, end_date, address, price, customer_id, executor_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fields.name.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.start_date.as_deref())
        .bind(fields.end_date.as_deref())
        .bind(fields.address.as_deref())
        .bind(fields.price)
        .bind(fields.customer_id)
        .bind(fields.executor_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(Order::new(res.last_insert_rowid(), fields))
    }

    async fn insert_order(&self, order: Order) -> Result<Order, RepoError> {
        let f = &order.fields;
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        ensure_user_refs(&mut *tx, f).await?;
        sqlx::query(
            "INSERT INTO orders (id, name, description, start_date, end_date, address, price, customer_id, executor_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id)
        .bind(f.name.as_deref())
        .bind(f.description.as_deref())
        .bind(f.start_date.as_deref())
        .bind(f.end_date.as_deref())
        .bind(f.address.as_deref())
        .bind(f.price)
        .bind(f.customer_id)
        .bind(f.executor_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(row.map(Order::from))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn replace_order(
        &self,
        id: OrderId,
        fields: OrderFields,
    ) -> Result<Option<Order>, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if exists.is_none() {
            return Ok(None);
        }
        ensure_user_refs(&mut *tx, &fields).await?;
        sqlx::query(
            "UPDATE orders SET name = ?, description = ?, start_date = ?, end_date = ?, address = ?,
                 price = ?, customer_id = ?, executor_id = ?
             WHERE id = ?",
        )
        .bind(fields.name.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.start_date.as_deref())
        .bind(fields.end_date.as_deref())
        .bind(fields.address.as_deref())
        .bind(fields.price)
        .bind(fields.customer_id)
        .bind(fields.executor_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(Some(Order::new(id, fields)))
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl OfferRepository for SqliteRepo {
    async fn insert_offer(&self, offer: Offer) -> Result<Offer, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        ensure_exists(&mut *tx, "orders", "order_id", offer.order_id).await?;
        ensure_exists(&mut *tx, "users", "executor_id", offer.executor_id).await?;
        sqlx::query("INSERT INTO offers (id, order_id, executor_id) VALUES (?, ?, ?)")
            .bind(offer.id)
            .bind(offer.order_id)
            .bind(offer.executor_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(offer)
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, RepoError> {
        let row: Option<DbOffer> =
            sqlx::query_as("SELECT id, order_id, executor_id FROM offers WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(row.map(Offer::from))
    }

    async fn list_offers(&self) -> Result<Vec<Offer>, RepoError> {
        let rows: Vec<DbOffer> =
            sqlx::query_as("SELECT id, order_id, executor_id FROM offers ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(rows.into_iter().map(Offer::from).collect())
    }
}
