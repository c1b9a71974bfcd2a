//! Tests for native balance reads and signed transfers

use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer};

use super::common::{rpc_client, rpc_error, rpc_result};
use crate::config::Secret;
use crate::error::OrchestratorError;
use crate::services::transfer::{RealFundsTransfer, TransactionSigner};
use crate::traits::FundsTransfer;
use shared::{AccountId, Balance};

fn operator() -> AccountId {
    "ops.testnet".parse().unwrap()
}

fn transfer_client(server: &MockServer) -> RealFundsTransfer {
    let secret = Secret::new(format!("ed25519:{}", bs58::encode([9u8; 32]).into_string()));
    let signer = TransactionSigner::from_secret(operator(), &secret).unwrap();
    RealFundsTransfer::new(rpc_client(server), signer)
}

async fn mount_access_key(server: &MockServer, nonce: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "params": { "request_type": "view_access_key" } })))
        .respond_with(rpc_result(json!({
            "nonce": nonce,
            "permission": "FullAccess",
            "block_height": 100,
            "block_hash": bs58::encode([5u8; 32]).into_string(),
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_unknown_account_has_zero_balance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_error(json!({ "cause": { "name": "UNKNOWN_ACCOUNT" } })))
        .mount(&server)
        .await;

    let balance = transfer_client(&server)
        .get_native_balance(&"fresh.testnet".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(balance, Balance::ZERO);
}

#[tokio::test]
async fn test_existing_account_balance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(json!({ "amount": "42", "locked": "0" })))
        .mount(&server)
        .await;

    let balance = transfer_client(&server)
        .get_native_balance(&"solver.testnet".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(balance, Balance(42));
}

/// A transfer looks up the access key, then commits one signed transaction
#[tokio::test]
async fn test_transfer_submits_signed_transaction() {
    let server = MockServer::start().await;
    mount_access_key(&server, 11).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "broadcast_tx_commit" })))
        .respond_with(rpc_result(json!({
            "status": { "SuccessValue": "" },
            "transaction": { "hash": "HashOfTransfer" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let receiver: AccountId = "solver.testnet".parse().unwrap();
    let receipt = transfer_client(&server)
        .transfer_native(&operator(), &receiver, Balance(10u128.pow(23)))
        .await
        .unwrap();

    assert_eq!(receipt.tx_hash, "HashOfTransfer");
    assert_eq!(receipt.receiver, receiver);
    assert_eq!(receipt.amount, Balance(10u128.pow(23)));
}

#[tokio::test]
async fn test_transfer_failure_status_is_an_error() {
    let server = MockServer::start().await;
    mount_access_key(&server, 11).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "broadcast_tx_commit" })))
        .respond_with(rpc_result(json!({
            "status": { "Failure": { "InvalidTxError": "InvalidNonce" } },
            "transaction": { "hash": "Rejected" },
        })))
        .mount(&server)
        .await;

    let err = transfer_client(&server)
        .transfer_native(&operator(), &"solver.testnet".parse().unwrap(), Balance(1))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::TransferError { ref message, .. } if message.contains("InvalidNonce")));
}

/// Only the account the key belongs to can send
#[tokio::test]
async fn test_transfer_from_foreign_sender_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = transfer_client(&server)
        .transfer_native(&"someone.testnet".parse().unwrap(), &"solver.testnet".parse().unwrap(), Balance(1))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::TransferError { .. }));
}
