use async_trait::async_trait;

use super::RepoError;
use crate::domain::offer::{Offer, OfferId};

#[async_trait]
pub trait OfferRepository: Send + Sync + 'static {
    async fn insert_offer(&self, offer: Offer) -> Result<Offer, RepoError>;
    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, RepoError>;
    async fn list_offers(&self) -> Result<Vec<Offer>, RepoError>;
}
