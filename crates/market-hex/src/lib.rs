//! market-hex: marketplace CRUD library (core + inbound HTTP)

pub mod config;
pub mod errors;

pub mod application;
pub mod seed;

pub use market_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
