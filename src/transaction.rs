//! Transaction module split into types and the signing factory

pub mod types;
pub mod validation;

pub use types::*;
