//! Fitness function for candidate maps.
//!
//! The score is a sum of regional rewards (computed on a kernel window
//! around every cell) and global terms, minus structural penalties.
//! Evaluation is pure: the same grid always yields the same score and matrix.

use crate::compute::grid::{FitnessMatrix, Grid, Matrix, Region, Tile};
use crate::compute::kernel::{contains_l_shape, extract_kernel, is_connected_to_path, is_solo_cell};
use crate::compute::pool::extract_all_pools;
use crate::schema::{AreaBounds, FitnessConfig, PoolingParameters, TileRatioMode};

/// Scale of the tile-ratio reward (a perfectly even split scores this much).
pub const TILE_RATIO_WEIGHT: f64 = 10.0;
/// Extra weight on the largest ratio's distance from the mean.
pub const TILE_RATIO_IMBALANCE_WEIGHT: f64 = 5.0;
/// Penalty when every available tile sits on the border band.
pub const AVAILABLE_ON_BORDER_WEIGHT: f64 = 10.0;
/// Regional bonus for a window containing an L shape of path tiles.
pub const L_SHAPE_BONUS: f64 = 1.0;
/// Regional value for a window with no L shape.
pub const NO_L_SHAPE_VALUE: f64 = 0.0;
/// Penalty per terrain type with the wrong number of pools.
pub const WRONG_POOL_COUNT_PENALTY: f64 = 10.0;
/// Penalty per terrain type whose pooled area is outside its band.
pub const WRONG_POOL_AREA_PENALTY: f64 = 5.0;

/// Border path tiles expected on a valid map (entrance and exit).
const EXPECTED_BORDER_PATHS: f64 = 2.0;

/// Individual terms of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitnessBreakdown {
    /// Sum of regional fitness over all cells.
    pub regional: f64,
    /// Tile-ratio balance reward.
    pub tile_ratio: f64,
    /// Number of tiles with no same-type neighbor.
    pub solo_tiles: f64,
    /// Weighted share of available ground lying on the border band.
    pub border_available: f64,
    /// Border path tiles beyond the expected two.
    pub entrances: f64,
    /// Pool count and area penalty (zero when pooling is disabled).
    pub pooling: f64,
}

impl FitnessBreakdown {
    /// Combined score. Not clamped; may be negative.
    pub fn total(&self) -> f64 {
        self.regional + self.tile_ratio
            - self.solo_tiles
            - self.border_available
            - self.entrances
            - self.pooling
    }
}

/// Scores grids for a fixed kernel size and pooling target.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    kernel_size: usize,
    config: FitnessConfig,
    pooling: PoolingParameters,
}

impl FitnessEvaluator {
    /// Create a new fitness evaluator.
    pub fn new(kernel_size: usize, config: FitnessConfig, pooling: PoolingParameters) -> Self {
        Self {
            kernel_size,
            config,
            pooling,
        }
    }

    /// Score a grid, returning the total and the per-cell regional fitness.
    pub fn evaluate(&self, grid: &Grid) -> (f64, FitnessMatrix) {
        let (breakdown, matrix) = self.breakdown(grid);
        (breakdown.total(), matrix)
    }

    /// Score a grid term by term.
    pub fn breakdown(&self, grid: &Grid) -> (FitnessBreakdown, FitnessMatrix) {
        let matrix = Matrix::from_fn(grid.width(), grid.height(), |x, y| {
            regional_fitness(&extract_kernel(grid, x, y, self.kernel_size))
        });
        let regional = matrix.as_slice().iter().sum();

        let available = grid.count(Tile::AvailableGround);
        let pooling = if self.config.pooling_penalty {
            penalize_incorrect_pooling(grid, &self.pooling)
        } else {
            0.0
        };

        let breakdown = FitnessBreakdown {
            regional,
            tile_ratio: evaluate_tile_ratios(grid, self.config.tile_ratio_mode),
            solo_tiles: penalize_solo_tiles(grid),
            border_available: penalize_available_on_border(
                grid,
                available,
                self.config.border_size,
            ),
            entrances: penalize_in_out_paths(grid),
            pooling,
        };

        (breakdown, matrix)
    }
}

/// Regional fitness of one kernel window: connected path tiles plus the L bonus.
pub fn regional_fitness(window: &Region) -> f64 {
    evaluate_path_connectivity(window) + promote_l_shape(window)
}

/// Number of path tiles in `window` touching another path tile.
pub fn evaluate_path_connectivity(window: &Region) -> f64 {
    window
        .cells()
        .filter(|&(x, y, c)| *c == Some(Tile::Path) && is_connected_to_path(window, x, y))
        .count() as f64
}

fn promote_l_shape(window: &Region) -> f64 {
    if contains_l_shape(window) {
        L_SHAPE_BONUS
    } else {
        NO_L_SHAPE_VALUE
    }
}

/// Reward for an even spread of terrain; [`TILE_RATIO_WEIGHT`] is perfect.
pub fn evaluate_tile_ratios(grid: &Grid, mode: TileRatioMode) -> f64 {
    let total = grid.len() as f64;
    let ratio = |tile: Tile| grid.count(tile) as f64 / total;

    match mode {
        TileRatioMode::FourTypes => weigh_tile_ratios(&Tile::ALL.map(ratio)),
        TileRatioMode::ThreeClasses => weigh_tile_ratios(&[
            ratio(Tile::Path),
            ratio(Tile::AvailableGround),
            ratio(Tile::UnavailableGround) + ratio(Tile::Water),
        ]),
    }
}

/// `weight / (1 + spread + imbalance_weight * (max - mean))`.
///
/// The spread term is the sum of squared deviations from the mean.
pub fn weigh_tile_ratios(ratios: &[f64]) -> f64 {
    if ratios.is_empty() {
        return 0.0;
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let spread: f64 = ratios.iter().map(|r| (r - mean).powi(2)).sum();
    let max = ratios.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    TILE_RATIO_WEIGHT / (1.0 + spread + TILE_RATIO_IMBALANCE_WEIGHT * (max - mean))
}

/// One point per tile with no 4-neighbor of the same type.
pub fn penalize_solo_tiles(grid: &Grid) -> f64 {
    grid.cells()
        .filter(|&(x, y, &tile)| is_solo_cell(grid, x, y, tile))
        .count() as f64
}

/// Share of available ground within `border_size` cells of an edge, weighted.
///
/// Zero when the grid has no available ground at all.
pub fn penalize_available_on_border(grid: &Grid, available: usize, border_size: usize) -> f64 {
    if available == 0 {
        return 0.0;
    }
    let (w, h) = (grid.width(), grid.height());
    let in_band = |x: usize, y: usize| {
        x < border_size || y < border_size || x + border_size >= w || y + border_size >= h
    };

    let on_border = grid
        .cells()
        .filter(|&(x, y, &t)| t == Tile::AvailableGround && in_band(x, y))
        .count();

    on_border as f64 / available as f64 * AVAILABLE_ON_BORDER_WEIGHT
}

/// Border path tiles minus two.
///
/// Fewer than two border paths yields a negative value, i.e. a bonus.
pub fn penalize_in_out_paths(grid: &Grid) -> f64 {
    let border_paths = grid
        .border_positions()
        .into_iter()
        .filter(|&(x, y)| *grid.get(x, y) == Tile::Path)
        .count();
    border_paths as f64 - EXPECTED_BORDER_PATHS
}

/// Pool count and area penalty for unavailable ground, water and path.
///
/// Path must form exactly one pool.
pub fn penalize_incorrect_pooling(grid: &Grid, pooling: &PoolingParameters) -> f64 {
    let cells = grid.len() as f64;
    let targets: [(Tile, usize, AreaBounds); 3] = [
        (
            Tile::UnavailableGround,
            pooling.unavailable_ground_pool_count,
            pooling.unavailable_ground_area,
        ),
        (Tile::Water, pooling.water_pool_count, pooling.water_area),
        (Tile::Path, 1, pooling.path_area),
    ];

    targets
        .into_iter()
        .map(|(tile, expected_pools, band)| {
            let pools = extract_all_pools(grid, &tile);
            let area = pools.iter().map(Vec::len).sum::<usize>() as f64 / cells;

            let mut penalty = 0.0;
            if pools.len() != expected_pools {
                penalty += WRONG_POOL_COUNT_PENALTY;
            }
            if !band.contains(area) {
                penalty += WRONG_POOL_AREA_PENALTY;
            }
            penalty
        })
        .sum()
}
