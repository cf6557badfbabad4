use serde::{Deserialize, Serialize};

use super::order::OrderId;
use super::user::UserId;

pub type OfferId = i64;

/// An executor's bid on an order. Only written by the seed loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Offer {
    pub id: OfferId,
    pub order_id: Option<OrderId>,
    pub executor_id: Option<UserId>,
}
