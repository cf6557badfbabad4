pub mod offer_service;
pub mod order_service;
pub mod snapshot;
pub mod user_service;
