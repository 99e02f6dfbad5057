// Wallet registry: pending wallets live in the ledger's pool until the next
// seal, after which they are registered through the block's `wallets` list.
use super::chain::Blockchain;
use crate::error::ChainError;
use crate::wallet::Wallet;
use tracing::{debug, info};

pub const GENESIS_ALLOCATION_MESSAGE: &str = "genesis allocation";

impl Blockchain {
    /// Generates a wallet and queues its public key for the next block.
    /// The private key is returned to the caller and never stored.
    pub fn create_wallet(&mut self) -> Wallet {
        let wallet = Wallet::generate();
        self.pending_wallets.push(wallet.public_key.clone());
        debug!(public_key = %wallet.public_key, "Created pending wallet");
        wallet
    }

    pub fn is_registered(&self, public_key: &str) -> bool {
        self.chain
            .iter()
            .any(|block| block.wallets.iter().any(|w| w == public_key))
    }

    pub fn is_pending(&self, public_key: &str) -> bool {
        self.pending_wallets.iter().any(|w| w == public_key)
    }

    /// Creates `count` wallets and queues a transfer of `amount` to each from
    /// a throwaway treasury wallet, then closes the bootstrap window.
    ///
    /// Only a ledger that sealed its own genesis block can do this. The
    /// allocation is confirmed by the next sealed block; the treasury's
    /// private key is dropped and its balance stays negative.
    pub fn fund_genesis_wallets(
        &mut self,
        count: usize,
        amount: u64,
    ) -> Result<Vec<Wallet>, ChainError> {
        if self.last_block().is_none() {
            return Err(ChainError::NoGenesisBlock);
        }
        if self.is_genesis_ready() {
            return Err(ChainError::GenesisClosed);
        }

        let treasury = self.create_wallet();
        let mut wallets = Vec::with_capacity(count);
        for _ in 0..count {
            let wallet = self.create_wallet();
            let transaction = self.create_transaction(
                amount,
                &treasury.public_key,
                &wallet.public_key,
                GENESIS_ALLOCATION_MESSAGE,
                &treasury.private_key,
            )?;
            self.admit_transaction(transaction)?;
            wallets.push(wallet);
        }
        self.mark_genesis_ready();
        info!(wallets = count, amount, "Queued genesis allocation");
        Ok(wallets)
    }
}
