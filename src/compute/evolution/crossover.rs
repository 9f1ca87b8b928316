//! Crossover operators.
//!
//! Every operator starts from a copy of parent 2 and overwrites part of it
//! with material from parent 1. Parents are never modified.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use super::genome::distinct_pair;
use super::search::Individual;
use crate::compute::grid::{FitnessMatrix, Grid, Matrix, Tile};
use crate::compute::kernel::{extract_kernel, insert_kernel};
use crate::compute::pool::extract_pool;
use crate::schema::CrossoverMethod;

impl CrossoverMethod {
    /// Produce one child from two parents.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        kernel_size: usize,
        rng: &mut R,
    ) -> Grid {
        match self {
            Self::Ordered => {
                let segment = Segment::random(parent1.grid.width(), parent1.grid.height(), rng);
                ordered_crossover(&parent1.grid, &parent2.grid, segment)
            }
            Self::Cycle => cycle_crossover(&parent1.grid, &parent2.grid),
            Self::SwapWeighted => swap_weighted_crossover(parent1, parent2, kernel_size, rng),
            Self::OverlayPools => {
                let x = rng.gen_range(0..parent1.grid.width());
                let y = rng.gen_range(0..parent1.grid.height());
                overlay_pool(&parent1.grid, &parent2.grid, x, y)
            }
        }
    }
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start_x: usize,
    pub end_x: usize,
    pub start_y: usize,
    pub end_y: usize,
}

impl Segment {
    /// Rectangle spanned by two distinct random columns and two distinct random rows.
    pub fn random<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Self {
        let (x0, x1) = distinct_pair(width, rng);
        let (y0, y1) = distinct_pair(height, rng);
        Self {
            start_x: x0.min(x1),
            end_x: x0.max(x1),
            start_y: y0.min(y1),
            end_y: y0.max(y1),
        }
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        (self.start_x..=self.end_x).contains(&x) && (self.start_y..=self.end_y).contains(&y)
    }
}

/// Parent 2 with `segment` taken from parent 1.
pub fn ordered_crossover(parent1: &Grid, parent2: &Grid, segment: Segment) -> Grid {
    Matrix::from_fn(parent2.width(), parent2.height(), |x, y| {
        if segment.contains(x, y) {
            *parent1.get(x, y)
        } else {
            *parent2.get(x, y)
        }
    })
}

/// Row-major position of the first cell equal to `value`.
pub fn find_value_position(grid: &Grid, value: Tile) -> Option<(usize, usize)> {
    grid.cells()
        .find(|&(_, _, &t)| t == value)
        .map(|(x, y, _)| (x, y))
}

/// Cycle crossover over the flattened grid.
///
/// Cycles follow "value in parent 1 at the current cell, first cell in
/// parent 2 holding that value". Tile values repeat, so every start cell
/// opens a cycle and the child takes parent 1's value everywhere it is
/// reached; unreached cells fall back to parent 2.
pub fn cycle_crossover(parent1: &Grid, parent2: &Grid) -> Grid {
    let (w, h) = (parent1.width(), parent1.height());
    let mut child = Matrix::<Option<Tile>>::unset(w, h);
    let mut visited = Matrix::filled(w, h, false);

    for start_y in 0..h {
        for start_x in 0..w {
            let mut current = (start_x, start_y);
            while !*visited.get(current.0, current.1) {
                let value = *parent1.get(current.0, current.1);
                child.set(current.0, current.1, Some(value));
                visited.set(current.0, current.1, true);

                match find_value_position(parent2, value) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
    }

    Matrix::from_fn(w, h, |x, y| child.get(x, y).unwrap_or(*parent2.get(x, y)))
}

/// Which end of the fitness distribution a weighted pick favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitnessBias {
    /// Weight proportional to cell fitness.
    High,
    /// Weight `1 - fitness / total`.
    Low,
}

/// Pick a cell of `fitness` with probability shaped by `bias`.
///
/// Falls back to a uniform pick when the weights are unusable (all zero,
/// negative or not finite).
pub fn weighted_index<R: Rng + ?Sized>(
    fitness: &FitnessMatrix,
    bias: FitnessBias,
    rng: &mut R,
) -> (usize, usize) {
    let values = fitness.as_slice();
    let total: f64 = values.iter().sum();

    let weights: Vec<f64> = match bias {
        FitnessBias::High => values.to_vec(),
        FitnessBias::Low => values
            .iter()
            .map(|f| if total > 0.0 { 1.0 - f / total } else { 1.0 })
            .collect(),
    };

    let index = match WeightedIndex::new(&weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => rng.gen_range(0..values.len()),
    };

    (index % fitness.width(), index / fitness.width())
}

/// A high-fitness window of parent 1 pasted over a low-fitness window of parent 2.
pub fn swap_weighted_crossover<R: Rng + ?Sized>(
    parent1: &Individual,
    parent2: &Individual,
    kernel_size: usize,
    rng: &mut R,
) -> Grid {
    let (x1, y1) = weighted_index(&parent1.fitness_matrix, FitnessBias::High, rng);
    let (x2, y2) = weighted_index(&parent2.fitness_matrix, FitnessBias::Low, rng);

    let window = extract_kernel(&parent1.grid, x1, y1, kernel_size);
    let mut child = parent2.grid.clone();
    insert_kernel(&mut child, x2, y2, &window);
    child
}

/// Parent 2 with the whole pool of parent 1 containing `(x, y)` stamped on.
pub fn overlay_pool(parent1: &Grid, parent2: &Grid, x: usize, y: usize) -> Grid {
    let tile = *parent1.get(x, y);
    let mut child = parent2.clone();
    for (px, py) in extract_pool(parent1, x, y, &tile) {
        child.set(px, py, tile);
    }
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn individual(grid: Grid) -> Individual {
        let fitness_matrix = Matrix::filled(grid.width(), grid.height(), 1.0);
        Individual {
            grid,
            fitness: 0.0,
            fitness_matrix,
        }
    }

    #[test]
    fn test_ordered_crossover_block() {
        let p1 = Grid::filled(4, 4, Tile::AvailableGround);
        let p2 = Grid::filled(4, 4, Tile::UnavailableGround);
        let segment = Segment {
            start_x: 1,
            end_x: 2,
            start_y: 1,
            end_y: 2,
        };

        let child = ordered_crossover(&p1, &p2, segment);

        for (x, y, &tile) in child.cells() {
            let inside = (1..=2).contains(&x) && (1..=2).contains(&y);
            let expected = if inside {
                Tile::AvailableGround
            } else {
                Tile::UnavailableGround
            };
            assert_eq!(tile, expected, "cell ({x}, {y})");
        }
    }

    #[test]
    fn test_random_segment_is_ordered() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let s = Segment::random(6, 3, &mut rng);
            assert!(s.start_x < s.end_x && s.end_x < 6);
            assert!(s.start_y < s.end_y && s.end_y < 3);
        }
        let single = Segment::random(1, 1, &mut rng);
        assert_eq!((single.start_x, single.end_x), (0, 0));
    }

    #[test]
    fn test_find_value_position_first_match() {
        let g = Grid::from_codes(&[vec![1, 3, 3], vec![3, 0, 0]]).unwrap();
        assert_eq!(find_value_position(&g, Tile::Water), Some((1, 0)));
        assert_eq!(find_value_position(&g, Tile::Path), Some((1, 1)));
        assert_eq!(find_value_position(&g, Tile::UnavailableGround), None);
    }

    #[test]
    fn test_cycle_crossover_copies_parent1() {
        let p1 = Grid::from_codes(&[vec![0, 1], vec![2, 3]]).unwrap();
        let p2 = Grid::from_codes(&[vec![3, 3], vec![1, 1]]).unwrap();
        assert_eq!(cycle_crossover(&p1, &p2), p1);
    }

    #[test]
    fn test_overlay_pool_stamps_whole_component() {
        let p1 = Grid::from_codes(&[vec![3, 3, 1], vec![1, 3, 1], vec![1, 1, 3]]).unwrap();
        let p2 = Grid::filled(3, 3, Tile::Path);

        let child = overlay_pool(&p1, &p2, 1, 1);

        assert_eq!(child.count(Tile::Water), 3);
        assert_eq!(*child.get(2, 2), Tile::Path);
        assert_eq!(p2.count(Tile::Path), 9);
    }

    #[test]
    fn test_weighted_index_bias() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut fitness = Matrix::filled(3, 2, 0.0);
        fitness.set(2, 1, 5.0);

        for _ in 0..50 {
            assert_eq!(weighted_index(&fitness, FitnessBias::High, &mut rng), (2, 1));
            assert_ne!(weighted_index(&fitness, FitnessBias::Low, &mut rng), (2, 1));
        }

        let flat = Matrix::filled(3, 2, 0.0);
        let (x, y) = weighted_index(&flat, FitnessBias::High, &mut rng);
        assert!(x < 3 && y < 2);
    }

    #[test]
    fn test_swap_weighted_keeps_parents() {
        let mut rng = StdRng::seed_from_u64(6);
        let p1 = individual(Grid::filled(5, 5, Tile::Water));
        let p2 = individual(Grid::filled(5, 5, Tile::Path));

        let child = CrossoverMethod::SwapWeighted.crossover(&p1, &p2, 3, &mut rng);

        let water = child.count(Tile::Water);
        assert!((1..=9).contains(&water));
        assert_eq!(p2.grid.count(Tile::Path), 25);
    }

    fn arb_pair() -> impl Strategy<Value = (Grid, Grid)> {
        (1usize..7, 1usize..7).prop_flat_map(|(w, h)| {
            let cells = prop::collection::vec(0i32..4, w * h);
            (cells.clone(), cells).prop_map(move |(a, b)| {
                let rows =
                    |c: Vec<i32>| c.chunks(w).map(<[i32]>::to_vec).collect::<Vec<Vec<i32>>>();
                (
                    Grid::from_codes(&rows(a)).unwrap(),
                    Grid::from_codes(&rows(b)).unwrap(),
                )
            })
        })
    }

    proptest! {
        #[test]
        fn prop_cycle_crossover_fills_every_cell((p1, p2) in arb_pair()) {
            let child = cycle_crossover(&p1, &p2);
            prop_assert_eq!(child.width(), p1.width());
            prop_assert_eq!(child.height(), p1.height());
            for (x, y, &tile) in child.cells() {
                prop_assert!(tile == *p1.get(x, y) || tile == *p2.get(x, y));
            }
        }
    }
}
