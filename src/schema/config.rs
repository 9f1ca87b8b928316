//! Parameter structs for a map search run.
//!
//! Every struct is validated before a run starts. The `new` constructors
//! validate eagerly; deserialized values are checked through `validate()`.

use serde::{Deserialize, Serialize};

/// Map dimensions and the kernel window used by regional fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapParameters {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Side of the square kernel window (normally odd).
    pub kernel_size: usize,
}

impl Default for MapParameters {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            kernel_size: 3,
        }
    }
}

impl MapParameters {
    pub fn new(width: usize, height: usize, kernel_size: usize) -> Result<Self, ConfigError> {
        let params = Self {
            width,
            height,
            kernel_size,
        };
        params.validate()?;
        Ok(params)
    }

    /// Total cells in the map.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.width * self.height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.kernel_size == 0 {
            return Err(ConfigError::InvalidKernelSize);
        }
        if self.kernel_size > self.width.min(self.height) {
            return Err(ConfigError::KernelTooLarge {
                kernel_size: self.kernel_size,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// When the generation loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopConditionParameters {
    /// Generations to evaluate.
    pub max_generations: usize,
    /// Wall-clock limit in seconds, checked between generations.
    pub time_limit_seconds: u64,
}

impl Default for StopConditionParameters {
    fn default() -> Self {
        Self {
            max_generations: 10,
            time_limit_seconds: 6,
        }
    }
}

impl StopConditionParameters {
    pub fn new(max_generations: usize, time_limit_seconds: u64) -> Result<Self, ConfigError> {
        let params = Self {
            max_generations,
            time_limit_seconds,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_generations == 0 {
            return Err(ConfigError::InvalidMaxGenerations);
        }
        if self.time_limit_seconds == 0 {
            return Err(ConfigError::InvalidTimeLimit);
        }
        Ok(())
    }
}

/// Population size and operator rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmParameters {
    pub population_size: usize,
    /// Probability that a child is mutated (0.0-1.0).
    pub mutation_rate: f64,
    /// Candidates per tournament half; must be below the population size.
    pub tournament_size: usize,
    /// Share of the population cloned as elites (0.0-1.0).
    pub elites_percentage: f64,
}

impl Default for AlgorithmParameters {
    fn default() -> Self {
        Self {
            population_size: 500,
            mutation_rate: 0.2,
            tournament_size: 2,
            elites_percentage: 0.05,
        }
    }
}

impl AlgorithmParameters {
    pub fn new(
        population_size: usize,
        mutation_rate: f64,
        tournament_size: usize,
        elites_percentage: f64,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            population_size,
            mutation_rate,
            tournament_size,
            elites_percentage,
        };
        params.validate()?;
        Ok(params)
    }

    /// Number of elites cloned into each new generation.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elites_percentage).floor() as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidPopulationSize);
        }
        check_fraction("mutation_rate", self.mutation_rate)?;
        check_fraction("elites_percentage", self.elites_percentage)?;
        if self.tournament_size == 0 || self.tournament_size >= self.population_size {
            return Err(ConfigError::InvalidTournamentSize {
                size: self.tournament_size,
                population: self.population_size,
            });
        }
        Ok(())
    }
}

/// Inclusive band for the share of the map covered by one terrain type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub min: f64,
    pub max: f64,
}

impl AreaBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `fraction` lies within `[min, max]`.
    #[inline]
    pub fn contains(&self, fraction: f64) -> bool {
        self.min <= fraction && fraction <= self.max
    }

    /// Smallest cell count meeting the band on a map of `cells` cells.
    pub fn min_cells(&self, cells: usize) -> usize {
        (cells as f64 * self.min).ceil() as usize
    }

    /// Largest cell count within the band on a map of `cells` cells.
    pub fn max_cells(&self, cells: usize) -> usize {
        (cells as f64 * self.max).floor() as usize
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        check_fraction(name, self.min)?;
        check_fraction(name, self.max)?;
        if self.min > self.max {
            return Err(ConfigError::InvalidAreaBounds {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Target pool layout used by pool initialization and the pooling penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolingParameters {
    pub unavailable_ground_pool_count: usize,
    pub water_pool_count: usize,
    pub unavailable_ground_area: AreaBounds,
    pub water_area: AreaBounds,
    pub path_area: AreaBounds,
}

impl Default for PoolingParameters {
    fn default() -> Self {
        Self {
            unavailable_ground_pool_count: 2,
            water_pool_count: 2,
            unavailable_ground_area: AreaBounds::new(0.1, 0.3),
            water_area: AreaBounds::new(0.1, 0.25),
            path_area: AreaBounds::new(0.05, 0.2),
        }
    }
}

impl PoolingParameters {
    pub fn new(
        unavailable_ground_pool_count: usize,
        water_pool_count: usize,
        unavailable_ground_area: AreaBounds,
        water_area: AreaBounds,
        path_area: AreaBounds,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            unavailable_ground_pool_count,
            water_pool_count,
            unavailable_ground_area,
            water_area,
            path_area,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.unavailable_ground_area
            .validate("unavailable_ground_area")?;
        self.water_area.validate("water_area")?;
        self.path_area.validate("path_area")?;

        let bands = [self.unavailable_ground_area, self.water_area, self.path_area];
        let min_sum: f64 = bands.iter().map(|b| b.min).sum();
        let max_sum: f64 = bands.iter().map(|b| b.max).sum();
        if min_sum > 1.0 {
            return Err(ConfigError::AreaSumExceeded {
                bound: "min",
                sum: min_sum,
            });
        }
        if max_sum > 1.0 {
            return Err(ConfigError::AreaSumExceeded {
                bound: "max",
                sum: max_sum,
            });
        }
        Ok(())
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::FractionOutOfRange { name, value })
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Map dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Kernel size must be non-zero")]
    InvalidKernelSize,
    #[error("Kernel size {kernel_size} exceeds map {width}x{height}")]
    KernelTooLarge {
        kernel_size: usize,
        width: usize,
        height: usize,
    },
    #[error("Max generations must be positive")]
    InvalidMaxGenerations,
    #[error("Time limit must be positive")]
    InvalidTimeLimit,
    #[error("Population size must be positive")]
    InvalidPopulationSize,
    #[error("{name} must be within [0, 1], got {value}")]
    FractionOutOfRange { name: &'static str, value: f64 },
    #[error("Tournament size {size} must be in 1..{population}")]
    InvalidTournamentSize { size: usize, population: usize },
    #[error("{name}: min ({min}) > max ({max})")]
    InvalidAreaBounds {
        name: &'static str,
        min: f64,
        max: f64,
    },
    #[error("Sum of {bound} area fractions is {sum}, must not exceed 1")]
    AreaSumExceeded { bound: &'static str, sum: f64 },
}
