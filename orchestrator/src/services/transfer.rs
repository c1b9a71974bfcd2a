//! Native NEAR balance lookups and signed transfers from the operator account

use std::io::Write;

use async_trait::async_trait;
use borsh::BorshSerialize;
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use shared::{fleet_debug, AccountId, Balance, Component};

use crate::config::{NearConfig, Secret};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::services::near_rpc::NearRpcClient;
use crate::traits::{FundsTransfer, TransferReceipt};

const ED25519_PREFIX: &str = "ed25519:";
const ED25519_KEY_TYPE: u8 = 0;
const TRANSFER_ACTION_TAG: u8 = 3;

#[derive(BorshSerialize)]
struct PublicKey {
    key_type: u8,
    data: [u8; 32],
}

#[derive(BorshSerialize)]
struct Signature {
    key_type: u8,
    data: [u8; 64],
}

/// The only action the supervisor ever submits
enum Action {
    Transfer { deposit: u128 },
}

impl BorshSerialize for Action {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Action::Transfer { deposit } => {
                writer.write_all(&[TRANSFER_ACTION_TAG])?;
                deposit.serialize(writer)
            }
        }
    }
}

#[derive(BorshSerialize)]
struct Transaction {
    signer_id: String,
    public_key: PublicKey,
    nonce: u64,
    receiver_id: String,
    block_hash: [u8; 32],
    actions: Vec<Action>,
}

#[derive(BorshSerialize)]
struct SignedTransaction {
    transaction: Transaction,
    signature: Signature,
}

/// Full-access key of the account transfers are sent from
pub struct TransactionSigner {
    account_id: AccountId,
    key: SigningKey,
}

impl TransactionSigner {
    /// Parse an `ed25519:<base58>` secret key; both 32 byte seeds and 64 byte keypairs are accepted
    pub fn from_secret(account_id: AccountId, secret: &Secret) -> OrchestratorResult<Self> {
        let encoded = secret
            .expose()
            .strip_prefix(ED25519_PREFIX)
            .ok_or_else(|| OrchestratorError::config("funding_account_private_key", "expected ed25519: prefix"))?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| OrchestratorError::config("funding_account_private_key", e.to_string()))?;
        if bytes.len() != 32 && bytes.len() != 64 {
            return Err(OrchestratorError::config(
                "funding_account_private_key",
                format!("expected 32 or 64 key bytes, got {}", bytes.len()),
            ));
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        Ok(Self {
            account_id,
            key: SigningKey::from_bytes(&seed),
        })
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn public_key_bytes(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Public key in `ed25519:<base58>` form
    pub fn public_key(&self) -> String {
        format!("{}{}", ED25519_PREFIX, bs58::encode(self.public_key_bytes()).into_string())
    }

    /// Borsh encoded signed transfer and its base58 transaction hash
    fn sign_transfer(
        &self,
        receiver: &AccountId,
        amount: Balance,
        nonce: u64,
        block_hash: [u8; 32],
    ) -> OrchestratorResult<(Vec<u8>, String)> {
        let transaction = Transaction {
            signer_id: self.account_id.to_string(),
            public_key: PublicKey {
                key_type: ED25519_KEY_TYPE,
                data: self.public_key_bytes(),
            },
            nonce,
            receiver_id: receiver.to_string(),
            block_hash,
            actions: vec![Action::Transfer { deposit: amount.0 }],
        };

        let hash: [u8; 32] = Sha256::digest(borsh::to_vec(&transaction)?).into();
        let signature = self.key.sign(&hash);

        let signed = SignedTransaction {
            transaction,
            signature: Signature {
                key_type: ED25519_KEY_TYPE,
                data: signature.to_bytes(),
            },
        };
        Ok((borsh::to_vec(&signed)?, bs58::encode(hash).into_string()))
    }
}

pub struct RealFundsTransfer {
    rpc: NearRpcClient,
    signer: TransactionSigner,
    /// Serializes transfers so concurrent sends never reuse a nonce
    send_lock: Mutex<()>,
}

impl RealFundsTransfer {
    pub fn new(rpc: NearRpcClient, signer: TransactionSigner) -> Self {
        Self {
            rpc,
            signer,
            send_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &NearConfig, operator: AccountId) -> OrchestratorResult<Self> {
        let signer = TransactionSigner::from_secret(operator, &config.operator_private_key)?;
        Ok(Self::new(NearRpcClient::new(config.rpc_url.clone()), signer))
    }
}

fn decode_block_hash(encoded: &str) -> OrchestratorResult<[u8; 32]> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| OrchestratorError::malformed("view_access_key", e.to_string()))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| OrchestratorError::malformed("view_access_key", format!("block hash has {} bytes", bytes.len())))
}

#[async_trait]
impl FundsTransfer for RealFundsTransfer {
    async fn get_native_balance(&self, account_id: &AccountId) -> OrchestratorResult<Balance> {
        match self.rpc.view_account(account_id).await? {
            Some(view) => Ok(view.amount.parse::<Balance>()?),
            None => {
                fleet_debug!(Component::Transfer, "Account {} does not exist yet", account_id);
                Ok(Balance::ZERO)
            }
        }
    }

    async fn transfer_native(
        &self,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Balance,
    ) -> OrchestratorResult<TransferReceipt> {
        if sender != self.signer.account_id() {
            return Err(OrchestratorError::TransferError {
                receiver: receiver.clone(),
                message: format!("no signing key for sender {}", sender),
            });
        }

        let _guard = self.send_lock.lock().await;

        let access_key = self
            .rpc
            .view_access_key(sender, &self.signer.public_key())
            .await?;
        let block_hash = decode_block_hash(&access_key.block_hash)?;
        let (signed, tx_hash) = self
            .signer
            .sign_transfer(receiver, amount, access_key.nonce + 1, block_hash)?;

        fleet_debug!(Component::Transfer, "Submitting transfer {} of {} to {}", tx_hash, amount, receiver);
        let outcome = self.rpc.broadcast_tx_commit(&signed).await?;
        if let Some(failure) = outcome.failure() {
            return Err(OrchestratorError::TransferError {
                receiver: receiver.clone(),
                message: failure.to_string(),
            });
        }

        Ok(TransferReceipt {
            tx_hash: outcome.transaction.hash,
            receiver: receiver.clone(),
            amount,
        })
    }
}
