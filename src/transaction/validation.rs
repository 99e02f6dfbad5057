/// Creation, signing and self-verification of transactions against the ledger
use crate::blockchain::Blockchain;
use crate::crypto::{parse_private_key, KeyPair};
use crate::error::ChainError;
use crate::transaction::types::Transaction;
use tracing::debug;

impl Blockchain {
    /// Builds and signs a transaction after checking the key, the wallets and
    /// the sender's confirmed balance.
    ///
    /// The balance check only sees sealed blocks. Transactions already waiting
    /// in the pending pool are not subtracted, so several admissions from one
    /// sender between two seals can overdraw it.
    pub fn create_transaction(
        &self,
        amount: u64,
        sender: &str,
        recipient: &str,
        message: &str,
        private_key_hex: &str,
    ) -> Result<Transaction, ChainError> {
        let keypair = KeyPair::from_secret_key(parse_private_key(private_key_hex)?);

        let wallet_is_pending = self.is_pending(sender) || self.is_pending(recipient);
        let wallet_is_registered = self.is_registered(sender) || self.is_registered(recipient);
        if !(wallet_is_pending || wallet_is_registered) {
            return Err(ChainError::InvalidWallet);
        }

        let balance = self.address_history(sender).balance;
        if balance <= 0 && self.is_genesis_ready() {
            return Err(ChainError::InsufficientBalance {
                address: sender.to_string(),
                balance,
            });
        }

        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut transaction = Transaction::new(amount, sender, recipient, message, timestamp);
        let digest = transaction.digest()?;
        transaction.transaction_id = Some(hex::encode(keypair.sign_digest(&digest)));

        // The key may not belong to `sender`; only a successful verification
        // against the sender's own public key proves it does.
        transaction.verify_signature().map_err(|e| {
            debug!(sender, "freshly signed transaction failed verification: {}", e);
            ChainError::SignatureFailure(
                "Can't sign this transaction, verify the address or the private key".to_string(),
            )
        })?;

        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use crate::blockchain::Blockchain;
    use crate::error::ChainError;

    #[test]
    fn test_zero_key_rejected_before_wallet_check() {
        let ledger = Blockchain::new().unwrap();
        let result = ledger.create_transaction(10, "a", "b", "m", &"00".repeat(32));
        assert!(matches!(result, Err(ChainError::InvalidPrivateKey(_))));
    }

    #[test]
    fn test_wrong_length_key_rejected() {
        let ledger = Blockchain::new().unwrap();
        let result = ledger.create_transaction(10, "a", "b", "m", "0102");
        assert!(matches!(result, Err(ChainError::InvalidPrivateKey(_))));
    }

    #[test]
    fn test_unknown_wallets_rejected() {
        let mut ledger = Blockchain::new().unwrap();
        let wallet = ledger.create_wallet();
        let result = ledger.create_transaction(10, "a", "b", "m", &wallet.private_key);
        assert_eq!(result, Err(ChainError::InvalidWallet));
    }

    #[test]
    fn test_recipient_alone_satisfies_wallet_check() {
        let mut ledger = Blockchain::new().unwrap();
        let alice = ledger.create_wallet();
        let recipient = ledger.create_wallet();
        ledger.pending_wallets.retain(|w| w != &alice.public_key);

        let tx = ledger
            .create_transaction(
                5,
                &alice.public_key,
                &recipient.public_key,
                "m",
                &alice.private_key,
            )
            .unwrap();
        assert!(tx.is_signed());
    }

    #[test]
    fn test_key_of_another_wallet_fails_self_verification() {
        let mut ledger = Blockchain::new().unwrap();
        let alice = ledger.create_wallet();
        let bob = ledger.create_wallet();

        let result =
            ledger.create_transaction(5, &alice.public_key, &bob.public_key, "m", &bob.private_key);
        assert!(matches!(result, Err(ChainError::SignatureFailure(_))));
    }

    #[test]
    fn test_signed_transaction_carries_fields() {
        let mut ledger = Blockchain::new().unwrap();
        let alice = ledger.create_wallet();
        let bob = ledger.create_wallet();

        let tx = ledger
            .create_transaction(42, &alice.public_key, &bob.public_key, "rent", &alice.private_key)
            .unwrap();
        assert_eq!(tx.amount, 42);
        assert_eq!(tx.sender, alice.public_key);
        assert_eq!(tx.recipient, bob.public_key);
        assert_eq!(tx.message, "rent");
        assert!(tx.timestamp > 0);
        assert!(tx.verify_signature().is_ok());
    }
}
