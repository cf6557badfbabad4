mod payload;
mod server;

pub use payload::Fields;
pub use server::{AppState, HttpServer, HttpServerConfig};
