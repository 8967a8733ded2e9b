//! fxlist Core - Record types and errors shared across the workspace

mod error;
mod types;

pub use error::*;
pub use types::*;
