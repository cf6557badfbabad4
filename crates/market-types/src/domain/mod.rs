pub mod fields;
pub mod offer;
pub mod order;
pub mod user;
