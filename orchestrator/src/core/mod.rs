//! Reconciliation and funding control loop
//!
//! Everything here is stateless between passes: desired state comes from the
//! solver registry and actual state from the deployment directory, both read
//! fresh on every pass.

pub mod deployment;
pub mod funding;
pub mod gate;
pub mod paging;
pub mod reconciler;
pub mod scheduler;

pub use deployment::SolverDeploymentParams;
pub use funding::{DeploymentFunding, FundingOutcome, FundingReport, FundingSupervisor};
pub use gate::{BalanceGate, GateDecision, GateToken};
pub use paging::WorkerPager;
pub use reconciler::{PoolOutcome, ReconcileReport, Reconciler, SkipReason};
pub use scheduler::Scheduler;
