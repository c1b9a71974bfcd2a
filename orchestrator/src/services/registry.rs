//! Solver registry and intents ledger views over NEAR RPC

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use shared::{fleet_debug, AccountId, Balance, Component, Pool, PoolId, TokenId, Worker};

use crate::config::NearConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::services::near_rpc::NearRpcClient;
use crate::traits::RegistryClient;

/// `get_pool` view as returned by the registry contract
#[derive(Debug, Deserialize)]
struct PoolView {
    token_ids: Vec<String>,
    amounts: Vec<Balance>,
    fee: u32,
    shares_total_supply: Balance,
}

impl PoolView {
    fn into_pool(self, id: PoolId) -> Pool {
        Pool {
            id,
            token_ids: self.token_ids.into_iter().map(TokenId::new).collect(),
            amounts: self.amounts,
            fee: self.fee,
            shares_total_supply: self.shares_total_supply,
        }
    }
}

pub struct RealRegistryClient {
    rpc: NearRpcClient,
    registry_contract: AccountId,
    intents_contract: AccountId,
}

impl RealRegistryClient {
    pub fn new(rpc: NearRpcClient, registry_contract: AccountId, intents_contract: AccountId) -> Self {
        Self {
            rpc,
            registry_contract,
            intents_contract,
        }
    }

    pub fn from_config(config: &NearConfig) -> Self {
        Self::new(
            NearRpcClient::new(config.rpc_url.clone()),
            config.solver_registry_contract.clone(),
            config.intents_contract.clone(),
        )
    }

    /// Ledger account holding a pool's liquidity
    pub fn pool_account(&self, pool_id: PoolId) -> OrchestratorResult<AccountId> {
        Ok(format!("pool-{}.{}", pool_id, self.registry_contract).parse::<AccountId>()?)
    }
}

#[async_trait]
impl RegistryClient for RealRegistryClient {
    async fn list_pools(&self) -> OrchestratorResult<Vec<PoolId>> {
        let len: u32 = self
            .rpc
            .view_function(&self.registry_contract, "get_pool_len", &json!({}))
            .await?;
        fleet_debug!(Component::Registry, "Registry reports {} pools", len);
        Ok((0..len).map(PoolId).collect())
    }

    async fn get_pool(&self, pool_id: PoolId) -> OrchestratorResult<Option<Pool>> {
        let view: Option<PoolView> = self
            .rpc
            .view_function(&self.registry_contract, "get_pool", &json!({ "pool_id": pool_id }))
            .await?;
        Ok(view.map(|view| view.into_pool(pool_id)))
    }

    async fn pool_balances(&self, pool_id: PoolId, token_ids: &[TokenId]) -> OrchestratorResult<Vec<Balance>> {
        let ledger_ids: Vec<String> = token_ids.iter().map(TokenId::ledger_id).collect();
        let account_id = self.pool_account(pool_id)?;

        let balances: Vec<Balance> = self
            .rpc
            .view_function(
                &self.intents_contract,
                "mt_batch_balance_of",
                &json!({ "account_id": account_id, "token_ids": ledger_ids }),
            )
            .await?;

        if balances.len() != token_ids.len() {
            return Err(OrchestratorError::malformed(
                "mt_batch_balance_of",
                format!("expected {} balances, got {}", token_ids.len(), balances.len()),
            ));
        }
        Ok(balances)
    }

    async fn worker_len(&self) -> OrchestratorResult<u32> {
        self.rpc
            .view_function(&self.registry_contract, "get_worker_len", &json!({}))
            .await
    }

    async fn list_workers(&self, offset: u32, limit: u32) -> OrchestratorResult<Vec<Worker>> {
        self.rpc
            .view_function(
                &self.registry_contract,
                "get_workers",
                &json!({ "offset": offset, "limit": limit }),
            )
            .await
    }

    async fn get_worker(&self, account_id: &AccountId) -> OrchestratorResult<Option<Worker>> {
        self.rpc
            .view_function(&self.registry_contract, "get_worker", &json!({ "account_id": account_id }))
            .await
    }
}
