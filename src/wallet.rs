//! Wallet key material handed to callers at creation time

use crate::crypto::KeyPair;
use serde::{Deserialize, Serialize};

/// A freshly generated wallet. The ledger only ever keeps `public_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Hex-encoded 32-byte secret scalar.
    pub private_key: String,
    /// Hex-encoded 65-byte uncompressed public point.
    pub public_key: String,
}

impl Wallet {
    pub fn generate() -> Self {
        Self::from_keypair(&KeyPair::generate())
    }

    pub fn from_keypair(keypair: &KeyPair) -> Self {
        Wallet {
            private_key: keypair.secret_key_hex(),
            public_key: keypair.public_key_hex(),
        }
    }
}
