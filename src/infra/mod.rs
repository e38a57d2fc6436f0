pub mod config;
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod mongo;
pub mod recipes;
pub mod reviews;
mod routes;
pub mod session;
pub mod store;

pub use config::{Config, ConfigError};
pub use mongo::MongoRep;
pub use routes::*;
pub use store::{RecipeStore, Store, StoreError};
