mod config;
mod error;
mod insert;
mod open;
mod query;
mod schema;

pub use config::*;
pub use error::{Result, StoreError};
pub use insert::*;
pub use open::Store;
pub use query::*;
pub use schema::{SchemaVersion, SCHEMA_NAMESPACE, SCHEMA_VERSION, SCHEMA_VERSION_NAME};
