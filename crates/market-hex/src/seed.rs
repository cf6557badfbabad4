//! Startup fixtures.
//!
//! Users, then orders, then offers are written one row at a time with the
//! ids from the fixture file, so references between them resolve. The first
//! failing row aborts the whole run. A store that already holds rows, such
//! as a SQLite file from an earlier start, is left untouched.

use anyhow::Context;
use market_types::domain::offer::Offer;
use market_types::domain::order::Order;
use market_types::domain::user::User;
use market_types::ports::MarketStore;
use serde::Deserialize;
use std::path::Path;

const BUILTIN: &str = include_str!("../fixtures/seed.json");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

impl Fixtures {
    pub fn builtin() -> anyhow::Result<Self> {
        serde_json::from_str(BUILTIN).context("built-in fixtures are malformed")
    }

    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading fixtures from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing fixtures from {}", path.display()))
    }
}

/// Rows written per collection, plus the highest fixture id of each
/// mutable collection so later snapshots can tell seeded rows apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub orders: usize,
    pub offers: usize,
    pub max_user_id: i64,
    pub max_order_id: i64,
}

impl SeedReport {
    fn for_fixtures(fixtures: &Fixtures) -> Self {
        Self {
            max_user_id: fixtures.users.iter().map(|u| u.id).max().unwrap_or(0),
            max_order_id: fixtures.orders.iter().map(|o| o.id).max().unwrap_or(0),
            ..Self::default()
        }
    }
}

async fn is_populated<R: MarketStore>(repo: &R) -> anyhow::Result<bool> {
    Ok(!repo.list_users().await?.is_empty()
        || !repo.list_orders().await?.is_empty()
        || !repo.list_offers().await?.is_empty())
}

pub async fn seed<R: MarketStore>(repo: &R, fixtures: &Fixtures) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::for_fixtures(fixtures);

    if is_populated(repo)
        .await
        .context("checking store before seeding")?
    {
        tracing::info!("store already holds rows, seed skipped");
        return Ok(report);
    }

    for user in &fixtures.users {
        repo.insert_user(user.clone())
            .await
            .with_context(|| format!("seeding user {}", user.id))?;
        report.users += 1;
    }
    for order in &fixtures.orders {
        repo.insert_order(order.clone())
            .await
            .with_context(|| format!("seeding order {}", order.id))?;
        report.orders += 1;
    }
    for offer in &fixtures.offers {
        repo.insert_offer(offer.clone())
            .await
            .with_context(|| format!("seeding offer {}", offer.id))?;
        report.offers += 1;
    }

    tracing::info!(
        users = report.users,
        orders = report.orders,
        offers = report.offers,
        "seed data loaded"
    );
    Ok(report)
}
