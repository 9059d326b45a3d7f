//! Application settings for the sector configuration service.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `ORGAIR__SECTION__KEY` environment variables, then `DATABASE_URL`.
//! Every section validates its own ranges after loading.

pub mod models;

pub use models::{
    ApiConfig, AppConfig, AppEnvironment, AppSection, CacheConfig, DatabaseConfig, LogFormat,
    ObservabilityConfig, SectorsConfig,
};

#[cfg(test)]
mod tests;
