//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::Balance;
use crate::errors::SharedError;

/// Prefix shared by every solver deployment name
pub const SOLVER_DEPLOYMENT_PREFIX: &str = "solver-pool-";

/// Ordinal index of a pool in the solver registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(pub u32);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PoolId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// NEAR account identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), SharedError> {
        let invalid = |reason: &str| SharedError::InvalidAccountId {
            input: value.to_string(),
            reason: reason.to_string(),
        };

        if value.len() < 2 || value.len() > 64 {
            return Err(invalid("length must be between 2 and 64"));
        }

        let mut previous_separator = true;
        for c in value.chars() {
            let separator = matches!(c, '.' | '-' | '_');
            if separator {
                if previous_separator {
                    return Err(invalid("separators must sit between alphanumerics"));
                }
            } else if !(c.is_ascii_lowercase() || c.is_ascii_digit()) {
                return Err(invalid("only lowercase alphanumerics and . - _ are allowed"));
            }
            previous_separator = separator;
        }
        if previous_separator {
            return Err(invalid("must not end with a separator"));
        }

        Ok(())
    }
}

impl FromStr for AccountId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for AccountId {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fungible token contract id as stored on a pool (e.g. `wrap.near`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Multi-token id used by the intents ledger for this NEP-141 token
    pub fn ledger_id(&self) -> String {
        format!("nep141:{}", self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a pool as read from the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub id: PoolId,
    pub token_ids: Vec<TokenId>,
    pub amounts: Vec<Balance>,
    /// Swap fee in basis points
    pub fee: u32,
    pub shares_total_supply: Balance,
}

/// Registered solver worker as the registry reports it
///
/// The registry keys workers by account but does not repeat the account in
/// the record; callers already know which account they asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub pool_id: PoolId,
    pub checksum: String,
    #[serde(alias = "codehash")]
    pub compose_hash: String,
    /// `ed25519:<base58>` key the worker signs with
    pub public_key: String,
}

/// Name of a solver deployment, derived from the pool it serves
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentName(String);

impl DeploymentName {
    pub fn for_pool(pool_id: PoolId) -> Self {
        Self(format!("{SOLVER_DEPLOYMENT_PREFIX}{}", pool_id.0))
    }

    /// Wrap a name reported by the hosting platform
    pub fn from_hosted(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pool id encoded in a solver deployment name, if this is one
    pub fn pool_id(&self) -> Option<PoolId> {
        self.0
            .strip_prefix(SOLVER_DEPLOYMENT_PREFIX)
            .and_then(|id| id.parse::<u32>().ok())
            .map(PoolId)
    }

    pub fn is_solver(&self) -> bool {
        self.0.starts_with(SOLVER_DEPLOYMENT_PREFIX)
    }
}

impl fmt::Display for DeploymentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A hosted compute instance running a solver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: DeploymentName,
    /// Hosting-assigned application id, absent until the instance is hosted
    pub app_id: Option<String>,
    /// Node the instance is scheduled on
    pub node_name: String,
    pub status: String,
}

/// NEAR network the supervisor operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Mainnet,
    Testnet,
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::Mainnet => write!(f, "mainnet"),
            NetworkId::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for NetworkId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(NetworkId::Mainnet),
            "testnet" => Ok(NetworkId::Testnet),
            _ => Err(SharedError::InvalidConfig {
                field: "network".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
