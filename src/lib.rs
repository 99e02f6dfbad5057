//! powledger - a single-process proof-of-work ledger
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Chain, pending pool, sealing, validation and wallet registry
//! - [`transaction`] - Transaction type and the signing factory
//!
//! ## Cryptography
//! - [`crypto`] - secp256k1 keys, ECDSA signatures and SHA-256 helpers
//! - [`wallet`] - Wallet key material returned at creation time
//!
//! ## State Management
//! - [`persistence`] - Chain snapshots and startup scan
//! - [`node`] - Shared ledger handle and off-thread mining
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;
pub mod wallet;

// ============================================================================
// State Management
// ============================================================================
pub mod node;
pub mod persistence;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
