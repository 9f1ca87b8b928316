//! Evolution configuration types for map search.
//!
//! This module provides the strategy selection, fitness options and the
//! top-level run configuration, plus the progress and result types a run
//! reports back.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    AlgorithmParameters, ConfigError, MapParameters, PoolingParameters, StopConditionParameters,
};
use crate::compute::Grid;

/// Top-level configuration for a map search run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Map size and kernel window.
    #[serde(default)]
    pub map: MapParameters,
    /// Generation and time limits.
    #[serde(default)]
    pub stop: StopConditionParameters,
    /// Population size and operator rates.
    #[serde(default)]
    pub algorithm: AlgorithmParameters,
    /// Pool targets for initialization and fitness.
    #[serde(default)]
    pub pooling: PoolingParameters,
    /// Strategy chosen for each operator family.
    #[serde(default)]
    pub methods: MethodSelection,
    /// Fitness function options.
    #[serde(default)]
    pub fitness: FitnessConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// How the first population is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitializationMethod {
    /// Every cell drawn uniformly from the four tiles.
    Random,
    /// A random trail between two border sides, random terrain elsewhere.
    Greedy,
    /// A trail, then flood-grown water and unavailable pools.
    #[default]
    Pools,
}

/// How parents are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMethod {
    #[default]
    Tournament,
    /// Fitness-proportionate selection.
    Roulette,
}

/// How two parents combine into a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossoverMethod {
    /// Rectangle of parent 1 pasted over parent 2.
    #[default]
    Ordered,
    /// Cycle crossover over the flattened grid.
    Cycle,
    /// High-fitness window of parent 1 over a low-fitness window of parent 2.
    SwapWeighted,
    /// One whole pool of parent 1 stamped onto parent 2.
    OverlayPools,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MutationMethod {
    /// Exchange two random cells.
    #[default]
    Swap,
    /// Reverse a random rectangle in row-major order.
    Inverse,
    /// Re-roll every tile in a kernel window.
    Random,
}

/// Post-reproduction cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepairMethod {
    /// Keep two border entrances and erode path dead ends to a fixed point.
    #[default]
    #[serde(alias = "Whatever1")]
    TrimDeadEnds,
    /// Walk isolated path tiles into the trail, then fix border entrances.
    #[serde(alias = "Whatever2")]
    ConnectStandalone,
}

/// How the next population is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReproductionMethod {
    /// Clone the top individuals, then add a full batch of offspring.
    #[default]
    Elitism,
    /// Offspring only.
    NoElitism,
}

/// Strategy choice for every operator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MethodSelection {
    #[serde(default)]
    pub initialization: InitializationMethod,
    #[serde(default)]
    pub selection: SelectionMethod,
    #[serde(default)]
    pub crossover: CrossoverMethod,
    #[serde(default)]
    pub mutation: MutationMethod,
    #[serde(default)]
    pub repair: RepairMethod,
    #[serde(default)]
    pub reproduction: ReproductionMethod,
}

/// Which tile groups the ratio term balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileRatioMode {
    /// Path, available, unavailable and water each count separately.
    #[default]
    FourTypes,
    /// Unavailable ground and water are merged into one obstacle class.
    ThreeClasses,
}

/// Fitness function options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessConfig {
    #[serde(default)]
    pub tile_ratio_mode: TileRatioMode,
    /// Width of the edge band for the border-available penalty.
    #[serde(default = "default_border_size")]
    pub border_size: usize,
    /// Apply the pool count and area penalty.
    #[serde(default = "default_pooling_penalty")]
    pub pooling_penalty: bool,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            tile_ratio_mode: TileRatioMode::default(),
            border_size: default_border_size(),
            pooling_penalty: default_pooling_penalty(),
        }
    }
}

fn default_border_size() -> usize {
    1
}
fn default_pooling_penalty() -> bool {
    true
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Progress update sent after each evaluated generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation number (0-based).
    pub generation: usize,
    /// Total generations planned.
    pub total_generations: usize,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Best fitness this generation.
    pub generation_best: f64,
    /// Average fitness of the current population.
    pub avg_fitness: f64,
    /// Individuals evaluated this generation.
    pub population_size: usize,
    /// Seconds since the run started.
    pub elapsed_seconds: f64,
}

/// Per-generation history for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f64>,
}

/// Final result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best map found across all generations.
    pub best_grid: Grid,
    /// Its fitness.
    pub best_fitness: f64,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations evaluated.
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Average fitness of the final population.
    pub final_avg_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason a run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Wall-clock limit reached.
    TimeLimit,
    /// Cancelled through the engine's cancel handle.
    Cancelled,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Invalid parameters: {0}")]
    Parameters(#[from] ConfigError),
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EvolutionConfig {
    /// Validate every parameter struct.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.map.validate()?;
        self.stop.validate()?;
        self.algorithm.validate()?;
        self.pooling.validate()?;
        Ok(())
    }

    /// Load a JSON config and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EvolutionConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.methods.initialization, InitializationMethod::Pools);
        assert_eq!(config.methods.repair, RepairMethod::TrimDeadEnds);
        assert_eq!(config.algorithm.population_size, 500);
    }

    #[test]
    fn test_serialization() {
        let config = EvolutionConfig {
            random_seed: Some(9),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.methods, config.methods);
        assert_eq!(parsed.random_seed, Some(9));
    }

    #[test]
    fn test_repair_aliases() {
        let repair: RepairMethod = serde_json::from_str("\"Whatever2\"").unwrap();
        assert_eq!(repair, RepairMethod::ConnectStandalone);
        let repair: RepairMethod = serde_json::from_str("\"Whatever1\"").unwrap();
        assert_eq!(repair, RepairMethod::TrimDeadEnds);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "map": {{ "width": 12, "height": 8, "kernel_size": 3 }},
                "methods": {{ "crossover": "Cycle", "repair": "Whatever2" }},
                "random_seed": 42
            }}"#
        )
        .unwrap();

        let config = EvolutionConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.map.width, 12);
        assert_eq!(config.methods.crossover, CrossoverMethod::Cycle);
        assert_eq!(config.methods.selection, SelectionMethod::Tournament);
        assert_eq!(config.stop, StopConditionParameters::default());
        assert!(config.fitness.pooling_penalty);
    }

    #[test]
    fn test_from_json_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "algorithm": {{ "population_size": 4, "mutation_rate": 0.2,
                 "tournament_size": 4, "elites_percentage": 0.1 }} }}"#
        )
        .unwrap();

        let err = EvolutionConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            EvolutionConfigError::Parameters(ConfigError::InvalidTournamentSize { .. })
        ));

        let missing = EvolutionConfig::from_json_file("/nonexistent/tile-evolver.json");
        assert!(matches!(missing, Err(EvolutionConfigError::Io(_))));
    }
}
