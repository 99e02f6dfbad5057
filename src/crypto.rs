//! Cryptographic primitives for powledger

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{CURVE_ORDER, SECRET_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

const ZERO_SCALAR: [u8; SECRET_KEY_SIZE] = [0u8; SECRET_KEY_SIZE];

/// SHA-256 of `data`.
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// True when `bytes` is a 32-byte big-endian scalar in `(0, n)`.
///
/// Equal-length big-endian byte strings order the same way as the integers
/// they encode, so slice comparison is enough.
pub fn is_valid_private_key(bytes: &[u8]) -> bool {
    bytes.len() == SECRET_KEY_SIZE && bytes > &ZERO_SCALAR[..] && bytes < &CURVE_ORDER[..]
}

/// Decodes a hex private key, rejecting anything outside the scalar range.
pub fn parse_private_key(private_key_hex: &str) -> Result<SecretKey, ChainError> {
    let bytes = hex::decode(private_key_hex)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("not hex: {}", e)))?;
    if bytes.len() != SECRET_KEY_SIZE {
        return Err(ChainError::InvalidPrivateKey(format!(
            "must be {} bytes, got {}",
            SECRET_KEY_SIZE,
            bytes.len()
        )));
    }
    if !is_valid_private_key(&bytes) {
        return Err(ChainError::InvalidPrivateKey(
            "scalar must be non-zero and below the secp256k1 group order".to_string(),
        ));
    }
    SecretKey::from_slice(&bytes).map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
}

/// Decodes a hex public key (compressed or uncompressed encoding).
pub fn parse_public_key(public_key_hex: &str) -> Result<PublicKey, ChainError> {
    let bytes = hex::decode(public_key_hex)?;
    PublicKey::from_slice(&bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key: {}", e)))
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        // `SecretKey::new` rejection-samples until the scalar is in range.
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_hex(private_key_hex: &str) -> Result<Self, ChainError> {
        Ok(Self::from_secret_key(parse_private_key(private_key_hex)?))
    }

    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Uncompressed (65-byte) public point.
    pub fn public_key_bytes(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE] {
        self.public_key.serialize_uncompressed()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Signs a precomputed 32-byte digest and returns the DER-encoded signature.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Vec<u8> {
        let message = Message::from_digest(*digest);
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        signature.serialize_der().to_vec()
    }
}

/// Verifies a DER-encoded ECDSA signature over `digest` for `public_key`.
pub fn verify_signature(
    public_key: &PublicKey,
    digest: &[u8; 32],
    signature_der: &[u8],
) -> Result<(), ChainError> {
    let signature = Signature::from_der(signature_der)
        .map_err(|e| ChainError::CryptoError(format!("Invalid signature: {}", e)))?;
    let message = Message::from_digest(*digest);

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, public_key)
        .map_err(|_| ChainError::CryptoError("Signature verification failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.public_key_bytes().len(), UNCOMPRESSED_PUBLIC_KEY_SIZE);
        assert_eq!(keypair.public_key_bytes()[0], 0x04);
        assert_eq!(keypair.secret_key_hex().len(), 64);
        assert!(is_valid_private_key(&keypair.secret_key.secret_bytes()));
    }

    #[test]
    fn test_scalar_range() {
        assert!(!is_valid_private_key(&[0u8; 32]));
        assert!(!is_valid_private_key(&CURVE_ORDER));
        assert!(!is_valid_private_key(&[0xffu8; 32]));
        assert!(!is_valid_private_key(&[1u8; 31]));

        let mut one = [0u8; 32];
        one[31] = 1;
        assert!(is_valid_private_key(&one));

        let mut order_minus_one = CURVE_ORDER;
        order_minus_one[31] -= 1;
        assert!(is_valid_private_key(&order_minus_one));
    }

    #[test]
    fn test_parse_private_key_errors() {
        assert!(matches!(
            parse_private_key(&"00".repeat(32)),
            Err(ChainError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            parse_private_key("abcd"),
            Err(ChainError::InvalidPrivateKey(msg)) if msg.contains("32 bytes")
        ));
        assert!(matches!(
            parse_private_key("zz"),
            Err(ChainError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_secret_hex_roundtrips_to_same_public_key() {
        let keypair = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&keypair.secret_key_hex()).unwrap();
        assert_eq!(restored.public_key_hex(), keypair.public_key_hex());
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate();
        let digest = sha256_digest(b"Hello, ledger!");

        let signature = keypair.sign_digest(&digest);
        assert!(verify_signature(&keypair.public_key, &digest, &signature).is_ok());
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let keypair1 = KeyPair::generate();
        let keypair2 = KeyPair::generate();
        let digest = sha256_digest(b"Test message");

        let signature = keypair1.sign_digest(&digest);
        let result = verify_signature(&keypair2.public_key, &digest, &signature);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Cryptographic error: Signature verification failed"
        );
    }

    #[test]
    fn test_tampered_digest_fails_verification() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign_digest(&sha256_digest(b"Original message"));
        let result = verify_signature(
            &keypair.public_key,
            &sha256_digest(b"Tampered message"),
            &signature,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_public_key_accepts_uncompressed_hex() {
        let keypair = KeyPair::generate();
        let parsed = parse_public_key(&keypair.public_key_hex()).unwrap();
        assert_eq!(parsed, keypair.public_key);
        assert!(parse_public_key("04deadbeef").is_err());
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
