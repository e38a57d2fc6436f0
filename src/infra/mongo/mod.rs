mod api;
mod dates;
pub mod types;

pub use api::MongoRep;
