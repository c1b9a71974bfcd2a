//! Supervisor error types

use shared::{AccountId, PoolId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("NEAR RPC {method} failed: {message}")]
    RpcError { method: String, message: String },

    #[error("Worker enumeration incomplete: expected {expected} workers, received {received}")]
    IncompleteEnumeration { expected: u32, received: u32 },

    #[error("Hosting platform operation failed: {operation}: {message}")]
    HostingError { operation: String, message: String },

    #[error("Solver endpoint {endpoint} failed: {message}")]
    EndpointError { endpoint: String, message: String },

    #[error("Transfer to {receiver} failed: {message}")]
    TransferError { receiver: AccountId, message: String },

    #[error("Fee {fee} bps is outside [0, 10000]")]
    InvalidFee { fee: i64 },

    #[error("Pool {pool_id} must hold exactly two tokens, found {count}")]
    InvalidTokenPair { pool_id: PoolId, count: usize },

    #[error("Malformed response from {source_name}: {message}")]
    MalformedResponse { source_name: String, message: String },

    #[error("Configuration error: {field}: {message}")]
    ConfigurationError { field: String, message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn rpc(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RpcError {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Validation errors are raised for one item and never retried by the item itself
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFee { .. } | Self::InvalidTokenPair { .. } | Self::MalformedResponse { .. }
        )
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
