//! Tile Evolver - Genetic search for constrained tile-map layouts.
//!
//! This crate evolves game-level layouts on a small tile grid: a single
//! connected trail from one border to another, balanced terrain, no
//! isolated tiles and a bounded number of water and obstacle pools.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Parameter structs, strategy selection and result types
//! - `compute`: Grid primitives, pool extraction and the evolutionary search
//!
//! # Example
//!
//! ```rust,no_run
//! use tile_evolver::{
//!     compute::evolution::EvolutionEngine,
//!     schema::{EvolutionConfig, MapParameters},
//! };
//!
//! // Create configuration
//! let config = EvolutionConfig {
//!     map: MapParameters::new(12, 12, 3)?,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! // Run the search
//! let mut engine = EvolutionEngine::new(config)?;
//! let result = engine.run();
//!
//! println!("Best fitness after {} generations: {:.3}",
//!     result.stats.generations, result.best_fitness);
//! print!("{}", result.best_grid);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, Individual};
pub use compute::{Grid, Tile};
pub use schema::{EvolutionConfig, EvolutionResult};
