//! Collaborator trait definitions with mockall annotations for testing
//!
//! The supervisor core only talks to the outside world through these traits:
//! the solver registry (on-chain views), the hosting platform's deployment
//! directory, and the native funds transfer client. Production implementations
//! live in `services`; tests inject the generated mocks.

use shared::{AccountId, Balance, Deployment, DeploymentName, Pool, PoolId, TokenId, Worker};
use url::Url;

use crate::core::deployment::SolverDeploymentParams;
use crate::error::OrchestratorResult;

/// Outcome of a submitted native transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub receiver: AccountId,
    pub amount: Balance,
}

/// Read-only views over the solver registry and the intents balance ledger
#[mockall::automock]
#[async_trait::async_trait]
pub trait RegistryClient: Send + Sync {
    /// Enumerate registered pools in registry order
    async fn list_pools(&self) -> OrchestratorResult<Vec<PoolId>>;

    /// Fetch full pool detail, `None` if the registry has no such pool
    async fn get_pool(&self, pool_id: PoolId) -> OrchestratorResult<Option<Pool>>;

    /// Ledger balances held by the pool account, one entry per requested token
    async fn pool_balances(&self, pool_id: PoolId, token_ids: &[TokenId]) -> OrchestratorResult<Vec<Balance>>;

    /// Number of registered workers
    async fn worker_len(&self) -> OrchestratorResult<u32>;

    /// One page of registered workers
    async fn list_workers(&self, offset: u32, limit: u32) -> OrchestratorResult<Vec<Worker>>;

    /// Worker registered under `account_id`, if any
    async fn get_worker(&self, account_id: &AccountId) -> OrchestratorResult<Option<Worker>>;
}

/// Solver deployments on the confidential compute hosting platform
#[mockall::automock]
#[async_trait::async_trait]
pub trait DeploymentDirectory: Send + Sync {
    /// All solver deployments currently known to the platform
    async fn list_deployments(&self) -> OrchestratorResult<Vec<Deployment>>;

    /// Provision a new solver instance
    async fn create_deployment(
        &self,
        name: &DeploymentName,
        params: &SolverDeploymentParams,
    ) -> OrchestratorResult<Deployment>;

    /// Externally reachable endpoint of the solver running in `deployment`
    fn resolve_endpoint(&self, deployment: &Deployment) -> OrchestratorResult<Url>;

    /// Account the solver generated for itself inside its enclave
    async fn query_runtime_address(&self, endpoint: &Url) -> OrchestratorResult<AccountId>;
}

/// Native currency balance and transfer
#[mockall::automock]
#[async_trait::async_trait]
pub trait FundsTransfer: Send + Sync {
    /// Native balance in base units; accounts that do not exist yet read as zero
    async fn get_native_balance(&self, account_id: &AccountId) -> OrchestratorResult<Balance>;

    async fn transfer_native(
        &self,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Balance,
    ) -> OrchestratorResult<TransferReceipt>;
}
