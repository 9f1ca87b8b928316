//! Repair passes run on every child before evaluation.
//!
//! Repair never fails and always returns a grid of the same size. It
//! nudges children toward a single trail with two border entrances but
//! does not guarantee it; fitness penalizes what is left.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::compute::grid::{Grid, Tile};
use crate::compute::kernel::{neighbors, path_neighbor_count};
use crate::schema::RepairMethod;

/// Border path tiles a finished map should keep.
const ENTRANCES: usize = 2;

impl RepairMethod {
    pub fn repair<R: Rng + ?Sized>(&self, grid: Grid, rng: &mut R) -> Grid {
        match self {
            Self::TrimDeadEnds => trim_dead_ends(grid, rng),
            Self::ConnectStandalone => connect_standalone(grid, rng),
        }
    }
}

fn border_paths(grid: &Grid) -> Vec<(usize, usize)> {
    grid.border_positions()
        .into_iter()
        .filter(|&(x, y)| *grid.get(x, y) == Tile::Path)
        .collect()
}

/// Random cells on the top and bottom rows.
fn top_bottom_points<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> [(usize, usize); 2] {
    [
        (rng.gen_range(0..grid.width()), 0),
        (rng.gen_range(0..grid.width()), grid.height() - 1),
    ]
}

/// Keep two random border path tiles and turn the rest into unavailable ground.
///
/// Returns the kept entrance and exit. With fewer than two border paths
/// the border is left alone and two nominal points on the top and bottom
/// rows are returned instead.
pub fn keep_two_entrances<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> [(usize, usize); 2] {
    let mut border = border_paths(grid);
    if border.len() < ENTRANCES {
        return top_bottom_points(grid, rng);
    }

    border.shuffle(rng);
    for &(x, y) in &border[ENTRANCES..] {
        grid.set(x, y, Tile::UnavailableGround);
    }
    [border[0], border[1]]
}

/// Erode interior path tiles with fewer than two path neighbors until stable.
///
/// Only interior cells are scanned. A border entrance has a single path
/// neighbor and would otherwise always be eroded. Returns the number of
/// tiles removed.
pub fn erode_dead_ends(grid: &mut Grid) -> usize {
    let (w, h) = (grid.width(), grid.height());
    let mut removed = 0;

    loop {
        let mut changed = 0;
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                if *grid.get(x, y) == Tile::Path && path_neighbor_count(grid, x, y) < 2 {
                    grid.set(x, y, Tile::AvailableGround);
                    changed += 1;
                }
            }
        }
        if changed == 0 {
            return removed;
        }
        removed += changed;
    }
}

/// Entrance cleanup followed by dead-end erosion.
pub fn trim_dead_ends<R: Rng + ?Sized>(mut grid: Grid, rng: &mut R) -> Grid {
    let entrances = keep_two_entrances(&mut grid, rng);
    let removed = erode_dead_ends(&mut grid);
    log::trace!("Repair kept entrances {:?}, eroded {} tiles", entrances, removed);
    grid
}

/// Path tiles with no path neighbor.
pub fn standalone_paths(grid: &Grid) -> Vec<(usize, usize)> {
    grid.cells()
        .filter(|&(x, y, &t)| t == Tile::Path && path_neighbor_count(grid, x, y) == 0)
        .map(|(x, y, _)| (x, y))
        .collect()
}

/// Nearest path tile other than `start`, first in row-major order on ties.
fn nearest_path(grid: &Grid, start: (usize, usize)) -> Option<(usize, usize)> {
    grid.cells()
        .filter(|&(x, y, &t)| t == Tile::Path && (x, y) != start)
        .map(|(x, y, _)| (x, y))
        .min_by_key(|&(x, y)| x.abs_diff(start.0) + y.abs_diff(start.1))
}

/// Walk from `start` toward the nearest path tile until the walk touches one.
///
/// Each step picks at random among the moves that shrink the distance to
/// that tile, so at most `distance - 1` cells become path. Returns false
/// when `start` is the only path tile.
fn walk_to_path<R: Rng + ?Sized>(grid: &mut Grid, start: (usize, usize), rng: &mut R) -> bool {
    let Some(target) = nearest_path(grid, start) else {
        return false;
    };
    let touches_path = |grid: &Grid, (x, y): (usize, usize)| {
        neighbors(grid, x, y).any(|(nx, ny)| (nx, ny) != start && *grid.get(nx, ny) == Tile::Path)
    };

    let mut walk = Vec::new();
    let mut current = start;
    let mut moves = Vec::with_capacity(2);

    while !touches_path(grid, current) {
        moves.clear();
        if current.0 < target.0 {
            moves.push((current.0 + 1, current.1));
        }
        if current.0 > target.0 {
            moves.push((current.0 - 1, current.1));
        }
        if current.1 < target.1 {
            moves.push((current.0, current.1 + 1));
        }
        if current.1 > target.1 {
            moves.push((current.0, current.1 - 1));
        }
        let Some(&next) = moves.choose(rng) else {
            return false;
        };
        current = next;
        walk.push(current);
    }

    for &(x, y) in &walk {
        grid.set(x, y, Tile::Path);
    }
    true
}

/// Trim or extend border paths to exactly two.
///
/// Missing entrances are created on random top and bottom cells; surplus
/// ones are turned into unavailable ground at random.
pub fn normalize_border_paths<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) {
    let mut border = border_paths(grid);

    if border.len() > ENTRANCES {
        border.shuffle(rng);
        for &(x, y) in &border[ENTRANCES..] {
            grid.set(x, y, Tile::UnavailableGround);
        }
        return;
    }

    for (x, y) in top_bottom_points(grid, rng) {
        if border.len() >= ENTRANCES {
            break;
        }
        if *grid.get(x, y) != Tile::Path {
            grid.set(x, y, Tile::Path);
            border.push((x, y));
        }
    }
}

/// Connect standalone path tiles to the trail, then fix border entrances.
pub fn connect_standalone<R: Rng + ?Sized>(mut grid: Grid, rng: &mut R) -> Grid {
    for (x, y) in standalone_paths(&grid) {
        // An earlier walk may already have reached this tile.
        if path_neighbor_count(&grid, x, y) > 0 {
            continue;
        }
        if !walk_to_path(&mut grid, (x, y), rng) {
            log::debug!("No path reachable from standalone tile ({}, {})", x, y);
        }
    }
    normalize_border_paths(&mut grid, rng);
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::pool::extract_all_pools;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grid(rows: &[&[i32]]) -> Grid {
        Grid::from_codes(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_keep_two_entrances() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut g = grid(&[
            &[0, 1, 0, 1, 0],
            &[1, 1, 1, 1, 1],
            &[0, 1, 1, 1, 0],
        ]);

        let kept = keep_two_entrances(&mut g, &mut rng);

        assert_eq!(border_paths(&g).len(), 2);
        assert_eq!(g.count(Tile::UnavailableGround), 3);
        for (x, y) in kept {
            assert_eq!(*g.get(x, y), Tile::Path);
        }
    }

    #[test]
    fn test_few_entrances_leave_border_alone() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut g = grid(&[&[1, 0, 1], &[1, 0, 1], &[1, 1, 1]]);
        let before = g.clone();

        let [top, bottom] = keep_two_entrances(&mut g, &mut rng);

        assert_eq!(g, before);
        assert_eq!(top.1, 0);
        assert_eq!(bottom.1, 2);
    }

    #[test]
    fn test_erosion_reaches_fixed_point() {
        // A two-cell spur off a straight trail is eaten back to the trail.
        let mut g = grid(&[
            &[1, 1, 0, 1, 1, 1],
            &[1, 1, 0, 1, 1, 1],
            &[1, 1, 0, 0, 0, 1],
            &[1, 1, 0, 1, 1, 1],
            &[1, 1, 0, 1, 1, 1],
        ]);

        let removed = erode_dead_ends(&mut g);

        assert_eq!(removed, 2);
        assert_eq!(*g.get(3, 2), Tile::AvailableGround);
        assert_eq!(*g.get(4, 2), Tile::AvailableGround);
        assert_eq!(g.count(Tile::Path), 5);
    }

    #[test]
    fn test_erosion_keeps_straight_trail() {
        let mut g = grid(&[&[1, 0, 1], &[1, 0, 1], &[1, 0, 1]]);
        assert_eq!(erode_dead_ends(&mut g), 0);
        assert_eq!(g.count(Tile::Path), 3);
    }

    #[test]
    fn test_trim_dead_ends_repair() {
        let mut rng = StdRng::seed_from_u64(5);
        let g = grid(&[
            &[1, 0, 1, 1],
            &[1, 0, 0, 1],
            &[1, 1, 0, 1],
            &[0, 1, 0, 1],
        ]);

        let repaired = RepairMethod::TrimDeadEnds.repair(g, &mut rng);

        assert_eq!(border_paths(&repaired).len(), 2);
        assert_eq!(repaired.width(), 4);
    }

    #[test]
    fn test_connect_standalone_joins_trail() {
        let rows: &[&[i32]] = &[
            &[1, 0, 1, 1, 1],
            &[1, 0, 1, 1, 1],
            &[1, 0, 1, 0, 1],
            &[1, 0, 1, 1, 1],
            &[1, 0, 1, 1, 1],
        ];
        let mut rng = StdRng::seed_from_u64(9);
        let mut g = grid(rows);
        assert_eq!(standalone_paths(&g), vec![(3, 2)]);

        assert!(walk_to_path(&mut g, (3, 2), &mut rng));
        assert!(path_neighbor_count(&g, 3, 2) > 0);
        assert_eq!(*g.get(2, 2), Tile::Path);

        let before = grid(rows);
        let repaired = RepairMethod::ConnectStandalone.repair(before.clone(), &mut rng);
        assert_eq!(border_paths(&repaired).len(), 2);
        assert_eq!(repaired.count(Tile::Path), 7);
        let changed = repaired
            .cells()
            .filter(|&(x, y, t)| t != before.get(x, y))
            .count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_connection_paints_at_most_the_distance() {
        // Trail down the left edge, lone tile 15 cells away.
        let mut base = Grid::filled(20, 20, Tile::Water);
        for y in 0..20 {
            base.set(0, y, Tile::Path);
        }
        base.set(15, 10, Tile::Path);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut g = base.clone();
            assert!(walk_to_path(&mut g, (15, 10), &mut rng));
            assert!(g.count(Tile::Path) - base.count(Tile::Path) <= 15);
            assert!(path_neighbor_count(&g, 15, 10) > 0);
            assert_eq!(extract_all_pools(&g, &Tile::Path).len(), 1);

            let repaired = connect_standalone(base.clone(), &mut rng);
            assert!(repaired.count(Tile::Path) <= base.count(Tile::Path) + 15);
        }
    }

    #[test]
    fn test_lonely_path_is_left_alone() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut g = Grid::filled(4, 4, Tile::Water);
        g.set(1, 1, Tile::Path);
        assert!(!walk_to_path(&mut g, (1, 1), &mut rng));
        assert_eq!(g.count(Tile::Path), 1);
    }

    #[test]
    fn test_normalize_adds_missing_entrances() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut g = Grid::filled(5, 5, Tile::Water);
        normalize_border_paths(&mut g, &mut rng);
        assert_eq!(border_paths(&g).len(), 2);
    }
}
