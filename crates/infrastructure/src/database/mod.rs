pub mod manager;
pub mod postgres;
pub mod sqlite;

pub use manager::{DatabasePool, DatabaseType, SqlxStore, UnconfiguredStore};
