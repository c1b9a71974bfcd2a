//! Service implementations
//!
//! Production implementations of the collaborator traits. These do the actual
//! I/O: NEAR JSON-RPC, the hosting platform API and CLI, and solver endpoints.

pub mod hosting;
pub mod near_rpc;
pub mod registry;
pub mod transfer;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use hosting::{RealDeploymentDirectory, SolverEnvironment};
pub use near_rpc::NearRpcClient;
pub use registry::RealRegistryClient;
pub use transfer::{RealFundsTransfer, TransactionSigner};
