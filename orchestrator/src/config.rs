//! Supervisor configuration
//!
//! Arguments are resolved once at startup into an immutable `SupervisorConfig`;
//! the core components only ever see the narrow config they need.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use shared::{AccountId, Balance, NetworkId, TokenId, NEAR_DECIMALS};
use url::Url;

use crate::cli::Args;
use crate::core::gate::{BalanceGate, GateToken};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Wrapped NEAR, the native token as held on the intents ledger
pub const NATIVE_TOKEN: (&str, u32) = ("wrap.near", NEAR_DECIMALS);

/// Stablecoins that can satisfy the pool gate on their own
pub const STABLE_TOKENS: [(&str, u32); 2] = [
    ("17208628f84f5d6ad33f0da3bbbeb27ffcb398eac501a31bd6ad2011e36133a1", 6),
    ("usdt.tether-token.near", 6),
];

/// Per-network defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkPreset {
    pub rpc_url: &'static str,
    pub intents_contract: &'static str,
    pub solver_registry_contract: &'static str,
    /// `None` means the operator account must be configured explicitly
    pub funding_account_id: Option<&'static str>,
}

impl NetworkPreset {
    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Mainnet => Self {
                rpc_url: "https://near.lava.build",
                intents_contract: "intents.near",
                solver_registry_contract: "solver-registry-dev.near",
                funding_account_id: None,
            },
            NetworkId::Testnet => Self {
                rpc_url: "https://neart.lava.build",
                intents_contract: "mock-intents.testnet",
                solver_registry_contract: "solver-registry-dev.testnet",
                funding_account_id: Some("solver-master.testnet"),
            },
        }
    }
}

/// String that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub gate: BalanceGate,
    pub worker_page_size: u32,
}

#[derive(Debug, Clone)]
pub struct FundingConfig {
    /// Account funding is sent from
    pub operator: AccountId,
    /// Native amount sent to each unfunded solver, in yocto
    pub minimum_balance: Balance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub poll_interval: Duration,
    pub funding_delay: Duration,
    pub funding_retry_delay: Duration,
    pub max_funding_retries: Option<u32>,
    pub fund_on_startup: bool,
}

/// NEAR endpoints and contracts the RPC backed clients talk to
#[derive(Debug, Clone)]
pub struct NearConfig {
    pub network: NetworkId,
    pub rpc_url: Url,
    pub intents_contract: AccountId,
    pub solver_registry_contract: AccountId,
    pub operator_private_key: Secret,
}

#[derive(Debug, Clone)]
pub struct HostingConfig {
    pub api_url: Url,
    pub api_key: Secret,
    pub compose_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub near: NearConfig,
    pub hosting: HostingConfig,
    pub reconciler: ReconcilerConfig,
    pub funding: FundingConfig,
    pub schedule: ScheduleConfig,
    pub log_level: String,
    pub log_json: bool,
    pub once: bool,
}

impl SupervisorConfig {
    pub fn from_args(args: &Args) -> OrchestratorResult<Self> {
        let network: NetworkId = args.network.parse()?;
        let preset = NetworkPreset::for_network(network);

        let rpc_url = parse_url("rpc_url", args.rpc_url.as_deref().unwrap_or(preset.rpc_url))?;
        let intents_contract = parse_account(
            "intents_contract",
            args.intents_contract.as_deref().unwrap_or(preset.intents_contract),
        )?;
        let solver_registry_contract = parse_account(
            "solver_registry_contract",
            args.solver_registry_contract
                .as_deref()
                .unwrap_or(preset.solver_registry_contract),
        )?;

        let operator = args
            .funding_account_id
            .as_deref()
            .or(preset.funding_account_id)
            .ok_or_else(|| OrchestratorError::config("funding_account_id", format!("required on {}", network)))
            .and_then(|id| parse_account("funding_account_id", id))?;

        let operator_private_key = args
            .funding_account_private_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| OrchestratorError::config("funding_account_private_key", "required"))?;
        if !operator_private_key.starts_with("ed25519:") {
            return Err(OrchestratorError::config(
                "funding_account_private_key",
                "expected an ed25519:<base58> key",
            ));
        }

        let api_key = args
            .phala_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| OrchestratorError::config("phala_api_key", "required"))?;

        let reconciler = ReconcilerConfig {
            gate: build_gate(&args.pool_minimum_native_balance, &args.pool_minimum_stable_balance)?,
            worker_page_size: nonzero("worker_page_size", args.worker_page_size)?,
        };

        let funding = FundingConfig {
            operator,
            minimum_balance: parse_amount(
                "funding_minimum_balance",
                &args.funding_minimum_balance,
                NEAR_DECIMALS,
            )?,
        };

        let schedule = ScheduleConfig {
            poll_interval: Duration::from_secs(nonzero("poll_interval_secs", args.poll_interval_secs)?),
            funding_delay: Duration::from_secs(args.funding_delay_secs),
            funding_retry_delay: Duration::from_secs(nonzero("funding_retry_secs", args.funding_retry_secs)?),
            max_funding_retries: args.max_funding_retries,
            fund_on_startup: args.fund_on_startup,
        };

        Ok(Self {
            near: NearConfig {
                network,
                rpc_url,
                intents_contract,
                solver_registry_contract,
                operator_private_key: Secret::new(operator_private_key),
            },
            hosting: HostingConfig {
                api_url: parse_url("phala_api_url", &args.phala_api_url)?,
                api_key: Secret::new(api_key),
                compose_file: PathBuf::from(&args.compose_file),
            },
            reconciler,
            funding,
            schedule,
            log_level: args.log_level.clone(),
            log_json: args.log_json,
            once: args.once,
        })
    }
}

/// Gate over the native token and every stablecoin, minimums given in whole units
pub fn build_gate(native_minimum: &str, stable_minimum: &str) -> OrchestratorResult<BalanceGate> {
    let (native_id, native_decimals) = NATIVE_TOKEN;
    let native = GateToken::new(
        TokenId::new(native_id),
        parse_amount("pool_minimum_native_balance", native_minimum, native_decimals)?,
    );

    let stables = STABLE_TOKENS
        .iter()
        .map(|(token_id, decimals)| {
            parse_amount("pool_minimum_stable_balance", stable_minimum, *decimals)
                .map(|minimum| GateToken::new(TokenId::new(*token_id), minimum))
        })
        .collect::<OrchestratorResult<Vec<_>>>()?;

    Ok(BalanceGate::new(native, stables))
}

fn parse_amount(field: &str, input: &str, decimals: u32) -> OrchestratorResult<Balance> {
    Balance::parse_units(input, decimals).map_err(|e| OrchestratorError::config(field, e.to_string()))
}

fn parse_account(field: &str, input: &str) -> OrchestratorResult<AccountId> {
    input
        .parse()
        .map_err(|e: shared::SharedError| OrchestratorError::config(field, e.to_string()))
}

fn parse_url(field: &str, input: &str) -> OrchestratorResult<Url> {
    Url::parse(input).map_err(|e| OrchestratorError::config(field, format!("{}: {}", input, e)))
}

fn nonzero<T: PartialEq + Default>(field: &str, value: T) -> OrchestratorResult<T> {
    if value == T::default() {
        return Err(OrchestratorError::config(field, "must be greater than zero"));
    }
    Ok(value)
}
