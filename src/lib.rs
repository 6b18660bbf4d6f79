pub mod config;
pub mod modules;
pub mod services;

pub use config::database::Connector;
pub use modules::dedup::controller::{cleanup, deduplicate, run_plan};
pub use services::store::{DocumentStore, StoreError, WriteBatch};
