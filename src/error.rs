//! Error types for powledger

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid wallet from recipient or sender")]
    InvalidWallet,
    #[error("Insufficient balance: sender {address} has {balance}")]
    InsufficientBalance { address: String, balance: i128 },
    #[error("Signature failure: {0}")]
    SignatureFailure(String),
    #[error("No genesis block: the chain is empty")]
    NoGenesisBlock,
    #[error("Genesis allocation is only possible before the chain is reloaded")]
    GenesisClosed,
    #[error("Chain validation failed: {}", .0.join("; "))]
    ChainValidationFailure(Vec<String>),
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Snapshot error: {0}")]
    SnapshotError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Worker error: {0}")]
    WorkerError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

impl From<hex::FromHexError> for ChainError {
    fn from(err: hex::FromHexError) -> Self {
        ChainError::CryptoError(format!("Invalid hex: {}", err))
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
