use crate::errors::AppError;
use market_types::domain::offer::{Offer, OfferId};
use market_types::ports::offer_repository::OfferRepository;

/// Read-only view over offers; rows only arrive through the seeder.
pub struct OfferService<R: OfferRepository> {
    repo: R,
}

impl<R: OfferRepository> OfferService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn get_offer(&self, id: OfferId) -> Result<Offer, AppError> {
        self.repo
            .get_offer(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("offer {}", id)))
    }

    pub async fn list_offers(&self) -> Result<Vec<Offer>, AppError> {
        Ok(self.repo.list_offers().await?)
    }
}
