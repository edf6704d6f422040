//! runlog: SQLite-backed persistence for runner profiles and recorded runs.
//!
//! A [`Runner`] owns zero or more [`Run`]s (date, distance, duration). The
//! [`Storage`] gateway exposes the whole contract: list all runners, fetch
//! one by id with its runs eagerly loaded, compute a duration-weighted
//! average speed, find everyone who has finished a marathon, and upsert
//! runners and runs. Saving a run cascades an upsert of its runner inside
//! the same transaction.
//!
//! Every call is synchronous and hits the database directly; nothing is
//! cached in-process.

mod data;

pub use data::{Gender, Run, Runner, Storage, StoreError, MARATHON_DISTANCE_KM, NAME_MAX_CHARS};
