//! Mutation operators.
//!
//! A mutation fires with probability `mutation_rate`; otherwise the child
//! is returned untouched. Mutations consume the child they change.

use rand::Rng;

use super::genome::distinct_pair;
use crate::compute::grid::{Grid, Region};
use crate::compute::kernel::{extract_kernel, insert_kernel};
use crate::schema::MutationMethod;

impl MutationMethod {
    /// Mutate `grid` with probability `mutation_rate`.
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        grid: Grid,
        mutation_rate: f64,
        kernel_size: usize,
        rng: &mut R,
    ) -> Grid {
        if !rng.gen_bool(mutation_rate) {
            return grid;
        }
        match self {
            Self::Swap => swap_mutation(grid, rng),
            Self::Inverse => inverse_mutation(grid, rng),
            Self::Random => random_mutation(grid, kernel_size, rng),
        }
    }
}

/// Exchange the tiles at two random cells with distinct columns and rows.
pub fn swap_mutation<R: Rng + ?Sized>(mut grid: Grid, rng: &mut R) -> Grid {
    let (x0, x1) = distinct_pair(grid.width(), rng);
    let (y0, y1) = distinct_pair(grid.height(), rng);
    grid.swap((x0, y0), (x1, y1));
    grid
}

/// Reverse a random rectangle read in row-major order.
pub fn inverse_mutation<R: Rng + ?Sized>(grid: Grid, rng: &mut R) -> Grid {
    let (w, h) = (grid.width(), grid.height());
    let x = rng.gen_range(0..w);
    let y = rng.gen_range(0..h);
    let span_x = rng.gen_range(1..=w - x);
    let span_y = rng.gen_range(1..=h - y);
    reverse_block(grid, (x, y), (span_x, span_y))
}

/// Reverse the row-major sequence of the `span` block anchored at `origin`.
pub fn reverse_block(mut grid: Grid, origin: (usize, usize), span: (usize, usize)) -> Grid {
    let cells = span.0 * span.1;
    let at = |i: usize| (origin.0 + i % span.0, origin.1 + i / span.0);
    for i in 0..cells / 2 {
        grid.swap(at(i), at(cells - 1 - i));
    }
    grid
}

/// Re-roll every tile in a kernel window around a random cell.
pub fn random_mutation<R: Rng + ?Sized>(mut grid: Grid, kernel_size: usize, rng: &mut R) -> Grid {
    let x = rng.gen_range(0..grid.width());
    let y = rng.gen_range(0..grid.height());

    let window = extract_kernel(&grid, x, y, kernel_size);
    let rerolled = Region::from_fn(window.width(), window.height(), |_, _| Some(rng.r#gen()));
    insert_kernel(&mut grid, x, y, &rerolled);
    grid
}
