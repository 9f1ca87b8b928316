//! Random map generation for the initial population.
//!
//! Provides the seedable generator shared by every operator, the border
//! trail walk and the three initialization strategies.

use rand::prelude::*;

use crate::compute::grid::{Grid, Matrix, Region, Tile};
use crate::compute::pool::place_pools_by_flood;
use crate::schema::{InitializationMethod, MapParameters, PoolingParameters};

/// Chance per step that the trail walk also offers every direction.
const WANDER_PROBABILITY: f64 = 0.3;

/// Random number generator wrapper for map operations.
pub struct MapRng {
    rng: StdRng,
}

impl MapRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::random, Self::new)
    }
}

impl RngCore for MapRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Two distinct indices in `0..len`, or the same index twice when `len == 1`.
pub(crate) fn distinct_pair<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (usize, usize) {
    let picked = rand::seq::index::sample(rng, len, len.min(2));
    let first = picked.index(0);
    (first, if picked.len() > 1 { picked.index(1) } else { first })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

const SIDES: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

/// Random offset along an edge of `len` cells, avoiding the corners when possible.
fn edge_offset<R: Rng + ?Sized>(len: usize, rng: &mut R) -> usize {
    if len >= 3 {
        rng.gen_range(1..len - 1)
    } else {
        rng.gen_range(0..len)
    }
}

fn point_on_side<R: Rng + ?Sized>(
    side: Side,
    width: usize,
    height: usize,
    rng: &mut R,
) -> (usize, usize) {
    match side {
        Side::Top => (edge_offset(width, rng), 0),
        Side::Bottom => (edge_offset(width, rng), height - 1),
        Side::Left => (0, edge_offset(height, rng)),
        Side::Right => (width - 1, edge_offset(height, rng)),
    }
}

/// Start and end points on two distinct, uniformly chosen border sides.
pub fn random_endpoints<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    rng: &mut R,
) -> ((usize, usize), (usize, usize)) {
    let start = rng.gen_range(0..SIDES.len());
    let end = (start + rng.gen_range(1..SIDES.len())) % SIDES.len();
    log::trace!("Trail sides: {:?} -> {:?}", SIDES[start], SIDES[end]);

    (
        point_on_side(SIDES[start], width, height, rng),
        point_on_side(SIDES[end], width, height, rng),
    )
}

/// Biased random walk from `start` to `end`.
///
/// Each step offers the moves that reduce the distance to `end`; with
/// probability 0.3 it also offers every direction that keeps the walk at
/// least one cell off the border. Cells are recorded on first visit only.
/// A walk that runs out of moves or steps is returned truncated.
pub fn generate_trail<R: Rng + ?Sized>(
    start: (usize, usize),
    end: (usize, usize),
    width: usize,
    height: usize,
    rng: &mut R,
) -> Vec<(usize, usize)> {
    let (w, h) = (width as isize, height as isize);
    let (ex, ey) = (end.0 as isize, end.1 as isize);
    let (mut x, mut y) = (start.0 as isize, start.1 as isize);

    let mut visited = Matrix::filled(width, height, false);
    visited.set(start.0, start.1, true);
    let mut trail = vec![start];

    let max_steps = 64 * width * height;
    let mut moves = Vec::with_capacity(8);

    for _ in 0..max_steps {
        if (x, y) == (ex, ey) {
            return trail;
        }

        moves.clear();
        if x < ex {
            moves.push((1, 0));
        }
        if x > ex {
            moves.push((-1, 0));
        }
        if y < ey {
            moves.push((0, 1));
        }
        if y > ey {
            moves.push((0, -1));
        }

        if rng.gen_bool(WANDER_PROBABILITY) {
            if y > 1 {
                moves.push((0, -1));
            }
            if y < h - 2 {
                moves.push((0, 1));
            }
            if x > 1 {
                moves.push((-1, 0));
            }
            if x < w - 2 {
                moves.push((1, 0));
            }
        }

        let Some(&(dx, dy)) = moves.choose(rng) else {
            log::debug!("Trail dead end at ({}, {})", x, y);
            return trail;
        };

        x = (x + dx).clamp(0, w - 1);
        y = (y + dy).clamp(0, h - 1);

        let cell = (x as usize, y as usize);
        if !*visited.get(cell.0, cell.1) {
            visited.set(cell.0, cell.1, true);
            trail.push(cell);
        }
    }

    if (x, y) != (ex, ey) {
        log::debug!("Trail truncated after {} steps", max_steps);
    }
    trail
}

/// Random trail between two border sides, as a region with the rest unset.
fn trail_region<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Region {
    let (start, end) = random_endpoints(width, height, rng);
    let mut region = Region::unset(width, height);
    for (x, y) in generate_trail(start, end, width, height, rng) {
        region.set(x, y, Some(Tile::Path));
    }
    region
}

impl InitializationMethod {
    /// Build one map.
    pub fn create_individual<R: Rng + ?Sized>(
        &self,
        map: &MapParameters,
        pooling: &PoolingParameters,
        rng: &mut R,
    ) -> Grid {
        let (w, h) = (map.width, map.height);
        match self {
            Self::Random => Matrix::from_fn(w, h, |_, _| rng.r#gen()),
            Self::Greedy => {
                let region = trail_region(w, h, rng);
                Matrix::from_fn(w, h, |x, y| {
                    region
                        .get(x, y)
                        .unwrap_or_else(|| Tile::random_non_path(rng))
                })
            }
            Self::Pools => {
                let mut region = trail_region(w, h, rng);
                let cells = map.grid_size();

                place_pools_by_flood(
                    &mut region,
                    pooling.water_pool_count,
                    Tile::Water,
                    pooling.water_area.min_cells(cells),
                    pooling.water_area.max_cells(cells),
                    rng,
                );
                place_pools_by_flood(
                    &mut region,
                    pooling.unavailable_ground_pool_count,
                    Tile::UnavailableGround,
                    pooling.unavailable_ground_area.min_cells(cells),
                    pooling.unavailable_ground_area.max_cells(cells),
                    rng,
                );

                region.fill_unset(Tile::AvailableGround)
            }
        }
    }

    /// Build `size` maps.
    pub fn initialize_population<R: Rng + ?Sized>(
        &self,
        size: usize,
        map: &MapParameters,
        pooling: &PoolingParameters,
        rng: &mut R,
    ) -> Vec<Grid> {
        (0..size)
            .map(|_| self.create_individual(map, pooling, rng))
            .collect()
    }
}
