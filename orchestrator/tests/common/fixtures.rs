//! Test fixtures and data for supervisor tests

use orchestrator::config::{build_gate, FundingConfig, ReconcilerConfig, ScheduleConfig};
use shared::{AccountId, Balance, Deployment, DeploymentName, Pool, PoolId, TokenId, Worker};
use std::time::Duration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const WNEAR: &'static str = "wrap.near";
    pub const USDC: &'static str = "17208628f84f5d6ad33f0da3bbbeb27ffcb398eac501a31bd6ad2011e36133a1";
    pub const USDT: &'static str = "usdt.tether-token.near";

    pub const OPERATOR: &'static str = "solver-master.testnet";

    /// One NEAR in yocto
    pub const NEAR: u128 = 1_000_000_000_000_000_000_000_000;
    /// One unit of a 6 decimal stablecoin
    pub const STABLE: u128 = 1_000_000;

    pub fn near(amount: u128) -> Balance {
        Balance(amount * Self::NEAR)
    }

    pub fn stable(amount: u128) -> Balance {
        Balance(amount * Self::STABLE)
    }

    pub fn account(id: &str) -> AccountId {
        id.parse().expect("valid test account id")
    }

    pub fn operator() -> AccountId {
        Self::account(Self::OPERATOR)
    }

    pub fn pool(id: u32, tokens: &[&str], fee: u32) -> Pool {
        Pool {
            id: PoolId(id),
            token_ids: tokens.iter().map(|token| TokenId::new(*token)).collect(),
            amounts: vec![Balance::ZERO; tokens.len()],
            fee,
            shares_total_supply: Balance::ZERO,
        }
    }

    /// Registry record for a worker serving `pool_id`
    pub fn worker(pool_id: u32) -> Worker {
        Worker {
            pool_id: PoolId(pool_id),
            checksum: "checksum".to_string(),
            compose_hash: "compose-hash".to_string(),
            public_key: "ed25519:6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp".to_string(),
        }
    }

    /// Hosted deployment for a pool; the app id doubles as the solver address suffix
    pub fn deployment(pool_id: u32, app_id: &str) -> Deployment {
        Deployment {
            name: DeploymentName::for_pool(PoolId(pool_id)),
            app_id: Some(app_id.to_string()),
            node_name: "prod7".to_string(),
            status: "running".to_string(),
        }
    }

    /// Solver account a deployment with `app_id` reports
    pub fn solver_address(app_id: &str) -> AccountId {
        Self::account(&format!("solver-{}.testnet", app_id))
    }

    pub fn reconciler_config() -> ReconcilerConfig {
        ReconcilerConfig {
            gate: build_gate("5", "10").expect("valid gate minimums"),
            worker_page_size: 100,
        }
    }

    pub fn funding_config() -> FundingConfig {
        FundingConfig {
            operator: Self::operator(),
            minimum_balance: Balance(Self::NEAR / 10),
        }
    }

    pub fn schedule(poll_secs: u64, funding_delay_secs: u64, retry_secs: u64) -> ScheduleConfig {
        ScheduleConfig {
            poll_interval: Duration::from_secs(poll_secs),
            funding_delay: Duration::from_secs(funding_delay_secs),
            funding_retry_delay: Duration::from_secs(retry_secs),
            max_funding_retries: None,
            fund_on_startup: false,
        }
    }
}
