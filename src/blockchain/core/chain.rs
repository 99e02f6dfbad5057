use crate::error::ChainError;
use crate::persistence::{
    load_latest_valid_chain, snapshot_name, InMemorySnapshotStore, SnapshotStore,
};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const GENESIS_NONCE: u64 = 100;
pub const GENESIS_HASH: &str = "0";
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    /// Wallets introduced while this block was pending.
    pub wallets: Vec<String>,
    pub nonce: u64,
    pub hash: String,
    pub previous_block_hash: String,
}

/// The part of a block covered by proof-of-work. Wallets and timestamp are
/// not covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub transactions: Vec<Transaction>,
    pub index: u64,
}

impl BlockData {
    pub fn of_block(block: &Block) -> Self {
        BlockData {
            transactions: block.transactions.clone(),
            index: block.index,
        }
    }

    pub fn canonical_json(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Confirmed activity of one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressHistory {
    pub transactions: Vec<Transaction>,
    pub balance: i128,
}

pub struct Blockchain {
    pub chain: Vec<Block>,
    pub pending_transactions: Vec<Transaction>,
    pub pending_wallets: Vec<String>,
    pub current_node_url: String,
    network_nodes: Vec<String>,
    genesis_ready: bool,
    store: Box<dyn SnapshotStore>,
    last_snapshot_millis: i64,
}

impl Blockchain {
    /// Create a new `Blockchain` backed by an in-memory snapshot store.
    pub fn new() -> Result<Self, ChainError> {
        Self::new_with_store(Box::new(InMemorySnapshotStore::new()))
    }

    /// Create a `Blockchain` seeded from `store`, sealing a genesis block when
    /// the store holds no snapshots at all.
    pub fn new_with_store(store: Box<dyn SnapshotStore>) -> Result<Self, ChainError> {
        let mut blockchain = Blockchain {
            chain: Vec::new(),
            pending_transactions: Vec::new(),
            pending_wallets: Vec::new(),
            current_node_url: String::new(),
            network_nodes: Vec::new(),
            genesis_ready: false,
            store,
            last_snapshot_millis: 0,
        };
        blockchain.bootstrap()?;
        Ok(blockchain)
    }

    fn bootstrap(&mut self) -> Result<(), ChainError> {
        let names = self.store.list()?;
        if names.is_empty() {
            info!("No snapshots found, creating genesis block");
            self.seal_block(GENESIS_NONCE, GENESIS_PREVIOUS_HASH, GENESIS_HASH);
            return Ok(());
        }
        self.last_snapshot_millis = names
            .iter()
            .filter_map(|n| n.split('-').next()?.parse::<i64>().ok())
            .max()
            .unwrap_or(0);

        match load_latest_valid_chain(self.store.as_ref(), &names) {
            Some((name, chain)) => {
                info!(snapshot = %name, blocks = chain.len(), "Loaded chain from snapshot");
                self.chain = chain;
            }
            None => warn!(
                snapshots = names.len(),
                "No trusted snapshot found; starting with an empty chain"
            ),
        }
        self.genesis_ready = true;
        Ok(())
    }

    /// False until a snapshot scan has completed. While false, senders
    /// without a confirmed balance may still create transactions.
    pub fn is_genesis_ready(&self) -> bool {
        self.genesis_ready
    }

    pub fn mark_genesis_ready(&mut self) {
        self.genesis_ready = true;
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Payload that proof-of-work must cover for the next sealed block.
    pub fn pending_block_data(&self) -> BlockData {
        BlockData {
            transactions: self.pending_transactions.clone(),
            index: self.next_index(),
        }
    }

    fn next_index(&self) -> u64 {
        self.last_block().map_or(1, |b| b.index + 1)
    }

    /// Seals the pending pool into a new block.
    ///
    /// `hash` is stored as given. It must come from `hash_block` over
    /// [`Self::pending_block_data`] with the same `nonce` and
    /// `previous_block_hash`, otherwise the chain will fail validation.
    pub fn seal_block(&mut self, nonce: u64, previous_block_hash: &str, hash: &str) -> Block {
        let block = Block {
            index: self.next_index(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            transactions: std::mem::take(&mut self.pending_transactions),
            wallets: std::mem::take(&mut self.pending_wallets),
            nonce,
            hash: hash.to_string(),
            previous_block_hash: previous_block_hash.to_string(),
        };
        self.chain.push(block.clone());
        info!(
            index = block.index,
            transactions = block.transactions.len(),
            wallets = block.wallets.len(),
            "Sealed block"
        );

        if let Err(e) = self.save_snapshot() {
            warn!(index = block.index, "Failed to write chain snapshot: {}", e);
        }
        block
    }

    fn save_snapshot(&mut self) -> Result<(), ChainError> {
        let content = serde_json::to_vec(&self.chain)?;
        // Names must sort in seal order even when two seals share a millisecond.
        let millis = chrono::Utc::now()
            .timestamp_millis()
            .max(self.last_snapshot_millis + 1);
        self.store.append(&snapshot_name(millis, &content), &content)?;
        self.last_snapshot_millis = millis;
        Ok(())
    }

    /// Queues `transaction` for the next block and returns that block's index.
    pub fn admit_transaction(&mut self, transaction: Transaction) -> Result<u64, ChainError> {
        let next_index = self.last_block().ok_or(ChainError::NoGenesisBlock)?.index + 1;
        self.pending_transactions.push(transaction);
        Ok(next_index)
    }

    /// Scans sealed blocks only; the pending pool is not counted.
    pub fn address_history(&self, address: &str) -> AddressHistory {
        let mut history = AddressHistory::default();
        for tx in self.chain.iter().flat_map(|b| b.transactions.iter()) {
            if tx.sender != address && tx.recipient != address {
                continue;
            }
            if tx.recipient == address {
                history.balance += tx.amount as i128;
            }
            if tx.sender == address {
                history.balance -= tx.amount as i128;
            }
            history.transactions.push(tx.clone());
        }
        history
    }

    pub fn get_block(&self, hash: &str) -> Option<&Block> {
        self.chain.iter().find(|b| b.hash == hash)
    }

    /// Looks up a sealed transaction by id, together with its block.
    pub fn get_transaction(&self, transaction_id: &str) -> Option<(&Transaction, &Block)> {
        self.chain.iter().find_map(|block| {
            block
                .transactions
                .iter()
                .find(|tx| tx.transaction_id.as_deref() == Some(transaction_id))
                .map(|tx| (tx, block))
        })
    }

    /// Records a peer URL. Returns false for duplicates and for our own URL.
    pub fn register_node(&mut self, url: &str) -> bool {
        if url.is_empty()
            || url == self.current_node_url
            || self.network_nodes.iter().any(|n| n == url)
        {
            return false;
        }
        self.network_nodes.push(url.to_string());
        true
    }

    pub fn network_nodes(&self) -> &[String] {
        &self.network_nodes
    }
}
