//! Schema module - Parameter, strategy and result types for map search runs.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
