pub mod queries;
pub mod services;

pub use services::*;
