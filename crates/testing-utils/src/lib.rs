//! # OrgAir Testing Utils
//!
//! Shared testing utilities for the sector configuration service.
//!
//! - **Mock Store**: in-memory `StoreAccessPort` answering the sector queries
//! - **Fixtures**: sector builders with realistic weights and calibrations
//! - **SQLite Helpers**: in-memory database seeded from the same fixtures
//!
//! ```toml
//! [dev-dependencies]
//! orgair-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
