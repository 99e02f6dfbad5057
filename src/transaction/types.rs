/// Transaction types for powledger
use crate::crypto::{parse_public_key, sha256_digest, verify_signature};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};

/// A value transfer between two wallets, identified by its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub amount: u64,
    /// Hex-encoded uncompressed public key of the payer.
    pub sender: String,
    pub recipient: String,
    pub message: String,
    /// Unix time in milliseconds.
    pub timestamp: i64,
    /// Hex DER signature; `None` until the transaction is signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// The fields covered by the signature, in canonical order.
#[derive(Serialize)]
struct SignablePayload<'a> {
    amount: u64,
    sender: &'a str,
    recipient: &'a str,
    message: &'a str,
    timestamp: i64,
}

impl Transaction {
    pub fn new(amount: u64, sender: &str, recipient: &str, message: &str, timestamp: i64) -> Self {
        Transaction {
            amount,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            message: message.to_string(),
            timestamp,
            transaction_id: None,
        }
    }

    /// Canonical JSON of every field except `transaction_id`.
    pub fn signable_message(&self) -> Result<Vec<u8>, ChainError> {
        let payload = SignablePayload {
            amount: self.amount,
            sender: &self.sender,
            recipient: &self.recipient,
            message: &self.message,
            timestamp: self.timestamp,
        };
        Ok(serde_json::to_vec(&payload)?)
    }

    /// SHA-256 of [`Self::signable_message`]; this is what gets signed.
    pub fn digest(&self) -> Result<[u8; 32], ChainError> {
        Ok(sha256_digest(&self.signable_message()?))
    }

    pub fn is_signed(&self) -> bool {
        self.transaction_id.is_some()
    }

    /// Checks `transaction_id` against the sender's public key.
    pub fn verify_signature(&self) -> Result<(), ChainError> {
        let signature_hex = self
            .transaction_id
            .as_deref()
            .ok_or_else(|| ChainError::SignatureFailure("transaction not signed".to_string()))?;
        let signature = hex::decode(signature_hex)
            .map_err(|e| ChainError::SignatureFailure(format!("signature is not hex: {}", e)))?;
        let public_key = parse_public_key(&self.sender).map_err(|e| {
            ChainError::SignatureFailure(format!("sender is not a public key: {}", e))
        })?;

        verify_signature(&public_key, &self.digest()?, &signature)
            .map_err(|e| ChainError::SignatureFailure(e.to_string()))
    }
}
