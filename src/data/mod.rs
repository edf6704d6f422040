//! Data layer: record types and the SQLite persistence gateway.

mod error;
mod models;
mod storage;

pub use error::StoreError;
pub use models::{Gender, Run, Runner, MARATHON_DISTANCE_KM, NAME_MAX_CHARS};
pub use storage::Storage;
