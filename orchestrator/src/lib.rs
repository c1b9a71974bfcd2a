//! Solver fleet supervisor
//!
//! Keeps one TEE-hosted solver deployment running for every liquidity pool in
//! the NEAR solver registry. A reconcile pass deploys solvers for pools that
//! have no registered worker; a funding pass tops up the accounts those
//! solvers generate so they can register themselves.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use cli::Args;
pub use config::SupervisorConfig;
pub use crate::core::{FundingReport, FundingSupervisor, ReconcileReport, Reconciler, Scheduler};
pub use error::{OrchestratorError, OrchestratorResult};
pub use traits::{DeploymentDirectory, FundsTransfer, RegistryClient};
