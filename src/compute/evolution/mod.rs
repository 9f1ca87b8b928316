//! Evolutionary search for tile maps.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Genome** (`genome`): seedable RNG, border trail walk and the
//!   Random / Greedy / Pools initialization strategies
//! - **Fitness** (`fitness`): regional kernel scores plus global balance
//!   and structure penalties
//! - **Operators** (`selection`, `crossover`, `mutation`, `repair`):
//!   strategy enums from [`crate::schema`] dispatched by `match`
//! - **Search** (`search`): the generational loop with elitism and stop
//!   conditions
//!
//! # Example
//!
//! ```rust,no_run
//! use tile_evolver::compute::evolution::EvolutionEngine;
//! use tile_evolver::schema::EvolutionConfig;
//!
//! let config = EvolutionConfig {
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let mut engine = EvolutionEngine::new(config)?;
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best fitness = {:.3}",
//!         progress.generation, progress.best_fitness);
//! });
//!
//! print!("{}", result.best_grid);
//! # Ok::<(), tile_evolver::schema::EvolutionConfigError>(())
//! ```

mod crossover;
mod fitness;
mod genome;
mod mutation;
mod repair;
mod search;
mod selection;

pub use crossover::{
    FitnessBias, Segment, cycle_crossover, find_value_position, ordered_crossover, overlay_pool,
    swap_weighted_crossover, weighted_index,
};
pub use fitness::{
    AVAILABLE_ON_BORDER_WEIGHT, FitnessBreakdown, FitnessEvaluator, L_SHAPE_BONUS,
    NO_L_SHAPE_VALUE, TILE_RATIO_IMBALANCE_WEIGHT, TILE_RATIO_WEIGHT, WRONG_POOL_AREA_PENALTY,
    WRONG_POOL_COUNT_PENALTY, evaluate_path_connectivity, evaluate_tile_ratios,
    penalize_available_on_border, penalize_in_out_paths, penalize_incorrect_pooling,
    penalize_solo_tiles, regional_fitness, weigh_tile_ratios,
};
pub use genome::{MapRng, generate_trail, random_endpoints};
pub use mutation::{inverse_mutation, random_mutation, reverse_block, swap_mutation};
pub use repair::{
    connect_standalone, erode_dead_ends, keep_two_entrances, normalize_border_paths,
    standalone_paths, trim_dead_ends,
};
pub use search::{EvolutionEngine, Individual};
pub use selection::{roulette_select, tournament_from_indices, tournament_select};
