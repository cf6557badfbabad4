use serde::{Deserialize, Serialize};

use super::fields::{self, FieldError, FieldMap};

pub type UserId = i64;

/// Every mutable column of a user row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    #[serde(flatten)]
    pub fields: UserFields,
}

impl UserFields {
    /// Builds a full record; keys missing from `map` become null.
    pub fn from_map(map: &FieldMap) -> Result<Self, FieldError> {
        let mut out = Self::default();
        out.apply(map)?;
        Ok(out)
    }

    /// Overwrites only the columns present in `map`.
    pub fn apply(&mut self, map: &FieldMap) -> Result<(), FieldError> {
        if map.contains_key("first_name") {
            self.first_name = fields::text(map, "first_name")?;
        }
        if map.contains_key("last_name") {
            self.last_name = fields::text(map, "last_name")?;
        }
        if map.contains_key("age") {
            self.age = fields::integer(map, "age")?;
        }
        if map.contains_key("email") {
            self.email = fields::text(map, "email")?;
        }
        if map.contains_key("role") {
            self.role = fields::text(map, "role")?;
        }
        if map.contains_key("phone") {
            self.phone = fields::text(map, "phone")?;
        }
        Ok(())
    }
}

impl User {
    pub fn new(id: UserId, fields: UserFields) -> Self {
        Self { id, fields }
    }
}
