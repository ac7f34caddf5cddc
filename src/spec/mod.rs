//! Contract model, loading and contract-level checks.

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
