pub mod schema;

pub use schema::{Config, RoutingConfig, SessionConfig};
