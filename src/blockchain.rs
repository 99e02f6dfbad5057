// Thin re-export module: implementation lives in `blockchain/core.rs`, split
// into chain management, sealing, validation and the wallet registry.

pub mod core;
pub use core::*;
