//! Compute module - Grid primitives and the evolutionary map search.

mod grid;
mod kernel;
mod pool;

pub mod evolution;

pub use grid::*;
pub use kernel::*;
pub use pool::*;
