//! Command line arguments with environment fallbacks

use clap::Parser;

/// Keeps a solver deployment running for every liquidity pool in the solver registry
#[derive(Parser, Debug, Clone)]
#[command(name = "solver-supervisor")]
#[command(about = "Deploys and funds TEE solvers for unserved solver registry pools")]
pub struct Args {
    /// NEAR network (mainnet, testnet)
    #[arg(long, env = "NEAR_NETWORK_ID", default_value = "testnet")]
    pub network: String,

    /// NEAR JSON-RPC endpoint, defaults to the network preset
    #[arg(long, env = "NEAR_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Intents ledger contract, defaults to the network preset
    #[arg(long, env = "INTENTS_CONTRACT")]
    pub intents_contract: Option<String>,

    /// Solver registry contract, defaults to the network preset
    #[arg(long, env = "SOLVER_REGISTRY_CONTRACT")]
    pub solver_registry_contract: Option<String>,

    /// Operator account that pays for solver funding
    #[arg(long, env = "FUNDING_ACCOUNT_ID")]
    pub funding_account_id: Option<String>,

    /// Operator key in `ed25519:<base58>` form
    #[arg(long, env = "FUNDING_ACCOUNT_PRIVATE_KEY", hide_env_values = true)]
    pub funding_account_private_key: Option<String>,

    /// Hosting platform API key
    #[arg(long, env = "PHALA_CLOUD_API_KEY", hide_env_values = true)]
    pub phala_api_key: Option<String>,

    /// Hosting platform API base URL
    #[arg(long, env = "CLOUD_API_URL", default_value = "https://cloud-api.phala.network")]
    pub phala_api_url: String,

    /// Compose file describing the solver container
    #[arg(long, env = "SOLVER_COMPOSE_FILE", default_value = "docker-compose.yaml")]
    pub compose_file: String,

    /// Seconds between the end of one reconcile pass and the start of the next
    #[arg(long, env = "POLL_INTERVAL_SECONDS", default_value = "60")]
    pub poll_interval_secs: u64,

    /// Seconds to wait after a deployment before funding it
    #[arg(long, env = "FUNDING_DELAY_SECONDS", default_value = "60")]
    pub funding_delay_secs: u64,

    /// Seconds to wait before retrying a funding pass that had failures
    #[arg(long, env = "FUNDING_RETRY_SECONDS", default_value = "60")]
    pub funding_retry_secs: u64,

    /// Retry bound for failed funding passes (unbounded if not set)
    #[arg(long, env = "MAX_FUNDING_RETRIES")]
    pub max_funding_retries: Option<u32>,

    /// Run a funding pass at startup for deployments created before a restart
    #[arg(long, env = "FUND_ON_STARTUP")]
    pub fund_on_startup: bool,

    /// NEAR sent to each new solver account
    #[arg(long, env = "WORKER_MINIMUM_BALANCE", default_value = "0.1")]
    pub funding_minimum_balance: String,

    /// Minimum wNEAR a pool must hold before it gets a solver
    #[arg(long, env = "POOL_MINIMUM_NEAR_BALANCE", default_value = "5")]
    pub pool_minimum_native_balance: String,

    /// Minimum stablecoin amount a pool must hold before it gets a solver
    #[arg(long, env = "POOL_MINIMUM_STABLE_BALANCE", default_value = "10")]
    pub pool_minimum_stable_balance: String,

    /// Workers requested per registry page
    #[arg(long, env = "WORKER_PAGE_SIZE", default_value = "100")]
    pub worker_page_size: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Run a single reconcile and funding pass, then exit
    #[arg(long)]
    pub once: bool,
}
