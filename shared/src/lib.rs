//! Shared types for the solver fleet supervisor
//!
//! Domain snapshots read from the solver registry and the hosting platform,
//! token amounts, and the logging conventions used by every component.

pub mod amount;
pub mod errors;
pub mod logging;
pub mod types;

pub use amount::{Balance, NEAR_DECIMALS};
pub use errors::*;
pub use logging::Component;
pub use types::*;
