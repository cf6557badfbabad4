pub mod offer_repository;
pub mod order_repository;
pub mod user_repository;

use offer_repository::OfferRepository;
use order_repository::OrderRepository;
use user_repository::UserRepository;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    /// A foreign key names a missing row, or an explicit id is already taken.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

/// A single store holding all three collections.
pub trait MarketStore: UserRepository + OrderRepository + OfferRepository {}

impl<T> MarketStore for T where T: UserRepository + OrderRepository + OfferRepository {}
