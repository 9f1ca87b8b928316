//! Pool (connected component) extraction and flood-based pool placement.
//!
//! A pool is a maximal 4-connected set of cells holding the same value.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;

use super::grid::{Matrix, Region, Tile};
use super::kernel::neighbors;

/// Coordinates `(x, y)` of one pool.
pub type Pool = Vec<(usize, usize)>;

/// Seed placement attempts per pool before the pool is skipped.
const SEED_ATTEMPTS: usize = 10;

/// Breadth-first fill from a seed, marking cells in `visited`.
fn flood<T: PartialEq>(
    grid: &Matrix<T>,
    start: (usize, usize),
    value: &T,
    visited: &mut Matrix<bool>,
) -> Pool {
    let mut pool = Vec::new();
    let mut queue = VecDeque::new();

    visited.set(start.0, start.1, true);
    queue.push_back(start);

    while let Some((x, y)) = queue.pop_front() {
        pool.push((x, y));
        for (nx, ny) in neighbors(grid, x, y) {
            if !*visited.get(nx, ny) && grid.get(nx, ny) == value {
                visited.set(nx, ny, true);
                queue.push_back((nx, ny));
            }
        }
    }

    pool
}

/// Pool of `value` containing `(x, y)`.
///
/// The seed is always part of the result, so an isolated seed yields a
/// pool of size one.
pub fn extract_pool<T: PartialEq>(grid: &Matrix<T>, x: usize, y: usize, value: &T) -> Pool {
    let mut visited = Matrix::filled(grid.width(), grid.height(), false);
    flood(grid, (x, y), value, &mut visited)
}

/// All disjoint pools of `value`, discovered in row-major order.
pub fn extract_all_pools<T: PartialEq>(grid: &Matrix<T>, value: &T) -> Vec<Pool> {
    let mut visited = Matrix::filled(grid.width(), grid.height(), false);
    let mut pools = Vec::new();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if !*visited.get(x, y) && grid.get(x, y) == value {
                pools.push(flood(grid, (x, y), value, &mut visited));
            }
        }
    }

    pools
}

/// Grow `count` pools of `tile` over unset cells of `region`.
///
/// Each pool gets a target area drawn from
/// `[min_area, min(remaining budget, max_area / pools left)]` and grows
/// from a random unset seed, visiting unset neighbors in random order.
/// A pool whose seed cannot be placed within [`SEED_ATTEMPTS`] tries is
/// skipped. Returns the number of cells written.
pub fn place_pools_by_flood<R: Rng + ?Sized>(
    region: &mut Region,
    count: usize,
    tile: Tile,
    min_area: usize,
    max_area: usize,
    rng: &mut R,
) -> usize {
    let (w, h) = (region.width(), region.height());
    let mut placed_total = 0;

    for i in 0..count {
        let remaining = max_area.saturating_sub(placed_total);
        if remaining == 0 {
            break;
        }

        let upper = remaining.min(max_area / (count - i));
        let target = if upper > min_area {
            rng.gen_range(min_area..=upper)
        } else {
            upper
        };

        let seed = (0..SEED_ATTEMPTS)
            .map(|_| (rng.gen_range(0..w), rng.gen_range(0..h)))
            .find(|&(x, y)| region.get(x, y).is_none());

        match seed {
            Some(seed) => placed_total += grow_pool(region, seed, tile, target, rng),
            None => log::debug!("Skipped {:?} pool {}: no unset seed found", tile, i),
        }
    }

    placed_total
}

/// Flood `tile` outward from `seed` until `target` cells are written.
fn grow_pool<R: Rng + ?Sized>(
    region: &mut Region,
    seed: (usize, usize),
    tile: Tile,
    target: usize,
    rng: &mut R,
) -> usize {
    let mut queue = VecDeque::from([seed]);
    let mut placed = 0;

    while placed < target {
        let Some((x, y)) = queue.pop_front() else {
            break;
        };
        if region.get(x, y).is_some() {
            continue;
        }

        region.set(x, y, Some(tile));
        placed += 1;

        let mut frontier: Vec<_> = neighbors(region, x, y)
            .filter(|&(nx, ny)| region.get(nx, ny).is_none())
            .collect();
        frontier.shuffle(rng);
        queue.extend(frontier);
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Grid;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_uniform_grid_is_one_pool() {
        let grid = Grid::filled(5, 5, Tile::Path);
        let pools = extract_all_pools(&grid, &Tile::Path);
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].len(), 25);
    }

    #[test]
    fn test_isolated_seed_is_its_own_pool() {
        let grid = Grid::from_codes(&[vec![1, 1, 1], vec![1, 0, 1], vec![1, 1, 1]]).unwrap();
        assert_eq!(extract_pool(&grid, 1, 1, &Tile::Path), vec![(1, 1)]);
        assert_eq!(extract_all_pools(&grid, &Tile::AvailableGround).len(), 1);
    }

    #[test]
    fn test_diagonal_cells_form_separate_pools() {
        let grid = Grid::from_codes(&[vec![3, 1], vec![1, 3]]).unwrap();
        let pools = extract_all_pools(&grid, &Tile::Water);
        assert_eq!(pools, vec![vec![(0, 0)], vec![(1, 1)]]);
    }

    #[test]
    fn test_place_pools_respects_budget() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut region = Region::unset(10, 10);

        let placed = place_pools_by_flood(&mut region, 2, Tile::Water, 10, 25, &mut rng);

        assert!(placed <= 25);
        assert_eq!(100 - region.unset_count(), placed);
        assert!(
            region
                .as_slice()
                .iter()
                .all(|c| c.is_none() || *c == Some(Tile::Water))
        );
    }

    #[test]
    fn test_place_pools_never_overwrites() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut region = Region::unset(6, 6);
        for x in 0..6 {
            region.set(x, 2, Some(Tile::Path));
        }

        place_pools_by_flood(&mut region, 3, Tile::UnavailableGround, 2, 20, &mut rng);

        for x in 0..6 {
            assert_eq!(*region.get(x, 2), Some(Tile::Path));
        }
    }

    #[test]
    fn test_place_pools_skips_when_full() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut region = Region::filled(4, 4, Some(Tile::Path));
        let placed = place_pools_by_flood(&mut region, 2, Tile::Water, 1, 8, &mut rng);
        assert_eq!(placed, 0);
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        (1usize..9, 1usize..9).prop_flat_map(|(w, h)| {
            prop::collection::vec(0i32..4, w * h).prop_map(move |codes| {
                let rows: Vec<Vec<i32>> = codes.chunks(w).map(<[i32]>::to_vec).collect();
                Grid::from_codes(&rows).unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn prop_pools_partition_cells(grid in arb_grid(), code in 0i32..4) {
            let tile = Tile::from_code(code).unwrap();
            let pools = extract_all_pools(&grid, &tile);

            let mut covered = Matrix::filled(grid.width(), grid.height(), 0u32);
            for pool in &pools {
                for &(x, y) in pool {
                    prop_assert_eq!(*grid.get(x, y), tile);
                    *covered.get_mut(x, y) += 1;
                }
            }
            for (x, y, &t) in grid.cells() {
                let expected = u32::from(t == tile);
                prop_assert_eq!(*covered.get(x, y), expected);
            }

            // Each pool is exactly the component reachable from any member.
            for pool in &pools {
                let (sx, sy) = pool[pool.len() - 1];
                let mut reached = extract_pool(&grid, sx, sy, &tile);
                let mut expected = pool.clone();
                reached.sort_unstable();
                expected.sort_unstable();
                prop_assert_eq!(reached, expected);
            }
        }
    }
}
