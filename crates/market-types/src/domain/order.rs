use serde::{Deserialize, Serialize};

use super::fields::{self, FieldError, FieldMap};
use super::user::UserId;

pub type OrderId = i64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub address: Option<String>,
    pub price: Option<i64>,
    pub customer_id: Option<UserId>,
    pub executor_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub fields: OrderFields,
}

impl OrderFields {
    pub fn from_map(map: &FieldMap) -> Result<Self, FieldError> {
        let mut out = Self::default();
        out.apply(map)?;
        Ok(out)
    }

    pub fn apply(&mut self, map: &FieldMap) -> Result<(), FieldError> {
        if map.contains_key("name") {
            self.name = fields::text(map, "name")?;
        }
        if map.contains_key("description") {
            self.description = fields::text(map, "description")?;
        }
        if map.contains_key("start_date") {
            self.start_date = fields::date(map, "start_date")?;
        }
        if map.contains_key("end_date") {
            self.end_date = fields::date(map, "end_date")?;
        }
        if map.contains_key("address") {
            self.address = fields::text(map, "address")?;
        }
        if map.contains_key("price") {
            self.price = fields::integer(map, "price")?;
        }
        if map.contains_key("customer_id") {
            self.customer_id = fields::integer(map, "customer_id")?;
        }
        if map.contains_key("executor_id") {
            self.executor_id = fields::integer(map, "executor_id")?;
        }
        Ok(())
    }

    /// User references that must resolve, paired with the column name.
    pub fn user_refs(&self) -> [(&'static str, Option<UserId>); 2] {
        [
            ("customer_id", self.customer_id),
            ("executor_id", self.executor_id),
        ]
    }
}

impl Order {
    pub fn new(id: OrderId, fields: OrderFields) -> Self {
        Self { id, fields }
    }
}
