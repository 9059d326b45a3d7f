pub mod cache;
pub mod database;

pub use cache::*;
pub use database::*;
