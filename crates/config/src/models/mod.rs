pub mod api;
pub mod app_config;
pub mod cache;
pub mod database;
pub mod observability;

pub use api::*;
pub use app_config::*;
pub use cache::*;
pub use database::*;
pub use observability::*;
