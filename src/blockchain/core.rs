// core.rs splits ledger responsibilities into submodules.
pub mod chain;
pub mod registry;
pub mod sealer;
pub mod validation;

pub use chain::*;
pub use registry::*;
pub use sealer::*;
pub use validation::*;
