//! Minimal NEAR JSON-RPC client
//!
//! Covers the handful of calls the supervisor needs: contract view calls,
//! account and access key views, and committing a signed transaction.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use shared::AccountId;
use url::Url;

use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

/// Error object reported by the node
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cause: Option<RpcErrorCause>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorCause {
    pub name: String,
}

impl RpcErrorBody {
    pub fn is_unknown_account(&self) -> bool {
        let cause_unknown = self
            .cause
            .as_ref()
            .is_some_and(|cause| cause.name == "UNKNOWN_ACCOUNT");
        let data_unknown = self
            .data
            .as_ref()
            .and_then(Value::as_str)
            .is_some_and(|data| data.contains("does not exist"));
        cause_unknown || data_unknown
    }

    fn describe(&self) -> String {
        let cause = self.cause.as_ref().map(|cause| cause.name.as_str());
        let data = self.data.as_ref().map(Value::to_string);
        [self.name.as_deref(), cause, self.message.as_deref(), data.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(": ")
    }
}

#[derive(Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

/// `view_account` result, only the fields the supervisor reads
#[derive(Debug, Clone, Deserialize)]
pub struct AccountView {
    pub amount: String,
    #[serde(default)]
    pub locked: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessKeyView {
    pub nonce: u64,
    /// Base58 hash of the block the view was taken at
    pub block_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionOutcome {
    pub status: Value,
    pub transaction: TransactionView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionView {
    pub hash: String,
}

impl ExecutionOutcome {
    /// Failure payload when the transaction did not succeed
    pub fn failure(&self) -> Option<&Value> {
        self.status.get("Failure")
    }
}

#[derive(Debug, Clone)]
pub struct NearRpcClient {
    http: reqwest::Client,
    rpc_url: Url,
}

impl NearRpcClient {
    pub fn new(rpc_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url,
        }
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    async fn send<T: DeserializeOwned>(&self, method: &str, params: Value) -> OrchestratorResult<Result<T, RpcErrorBody>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: "dontcare",
            method,
            params,
        };

        let response: RpcResponse<Value> = self
            .http
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.result, response.error) {
            (_, Some(error)) => Ok(Err(error)),
            (Some(result), None) => serde_json::from_value(result)
                .map(Ok)
                .map_err(|e| OrchestratorError::malformed(method, e.to_string())),
            (None, None) => Err(OrchestratorError::malformed(method, "response has neither result nor error")),
        }
    }

    /// Call a view method and decode its JSON return value
    pub async fn view_function<A, T>(&self, contract: &AccountId, method_name: &str, args: &A) -> OrchestratorResult<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let params = json!({
            "request_type": "call_function",
            "finality": "final",
            "account_id": contract,
            "method_name": method_name,
            "args_base64": BASE64.encode(serde_json::to_vec(args)?),
        });

        match self.send::<CallFunctionResult>("query", params).await? {
            Ok(CallFunctionResult { result: Some(bytes), .. }) => serde_json::from_slice(&bytes)
                .map_err(|e| OrchestratorError::malformed(format!("{}.{}", contract, method_name), e.to_string())),
            Ok(CallFunctionResult { error: Some(error), .. }) => {
                Err(OrchestratorError::rpc(format!("{}.{}", contract, method_name), error))
            }
            Ok(_) => Err(OrchestratorError::malformed(
                format!("{}.{}", contract, method_name),
                "call_function returned no result",
            )),
            Err(error) => Err(OrchestratorError::rpc(
                format!("{}.{}", contract, method_name),
                error.describe(),
            )),
        }
    }

    /// Account view, `None` if the account does not exist yet
    pub async fn view_account(&self, account_id: &AccountId) -> OrchestratorResult<Option<AccountView>> {
        let params = json!({
            "request_type": "view_account",
            "finality": "final",
            "account_id": account_id,
        });

        // Some nodes report query errors inside `result` instead of `error`
        match self.send::<Value>("query", params).await? {
            Ok(result) => match result.get("error").and_then(Value::as_str) {
                Some(error) if error.contains("does not exist") => Ok(None),
                Some(error) => Err(OrchestratorError::rpc("view_account", error)),
                None => serde_json::from_value(result)
                    .map(Some)
                    .map_err(|e| OrchestratorError::malformed("view_account", e.to_string())),
            },
            Err(error) if error.is_unknown_account() => Ok(None),
            Err(error) => Err(OrchestratorError::rpc("view_account", error.describe())),
        }
    }

    pub async fn view_access_key(&self, account_id: &AccountId, public_key: &str) -> OrchestratorResult<AccessKeyView> {
        let params = json!({
            "request_type": "view_access_key",
            "finality": "final",
            "account_id": account_id,
            "public_key": public_key,
        });

        match self.send::<Value>("query", params).await? {
            Ok(result) => {
                if let Some(error) = result.get("error").and_then(Value::as_str) {
                    return Err(OrchestratorError::rpc("view_access_key", error));
                }
                serde_json::from_value(result).map_err(|e| OrchestratorError::malformed("view_access_key", e.to_string()))
            }
            Err(error) => Err(OrchestratorError::rpc("view_access_key", error.describe())),
        }
    }

    /// Submit a borsh encoded signed transaction and wait for its final outcome
    pub async fn broadcast_tx_commit(&self, signed_transaction: &[u8]) -> OrchestratorResult<ExecutionOutcome> {
        let params = json!([BASE64.encode(signed_transaction)]);
        self.send("broadcast_tx_commit", params)
            .await?
            .map_err(|error| OrchestratorError::rpc("broadcast_tx_commit", error.describe()))
    }
}
