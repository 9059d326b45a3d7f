pub mod contract;
pub mod entities;
pub mod ports;
pub mod validation;

pub use contract::*;
pub use entities::*;
pub use orgair_errors::{ContractViolation, OrgAirError, OrgAirResult};
pub use ports::*;
pub use validation::*;
