//! Kernel windows and 4-neighborhood queries.
//!
//! A kernel window is a `k x k` [`Region`] centred on a cell. Cells that
//! fall outside the source grid are unset and are never written back.

use super::grid::{Grid, Matrix, Region, Tile, TileCell};

/// Neighbor offsets `(dx, dy)`: left, right, up, down. Diagonals are not neighbors.
pub const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Five-cell "L" shapes as `(row, col)` offsets from an anchor cell.
pub const L_SHAPE_PATTERNS: [[(usize, usize); 5]; 4] = [
    [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)],
    [(0, 0), (0, 1), (0, 2), (1, 0), (2, 0)],
    [(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)],
    [(0, 2), (1, 2), (2, 2), (2, 1), (2, 0)],
];

/// In-bounds 4-neighbors of `(x, y)`.
pub fn neighbors<T>(matrix: &Matrix<T>, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    let (w, h) = (matrix.width(), matrix.height());
    DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        (nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h)
            .then_some((nx as usize, ny as usize))
    })
}

/// Window extent for a kernel of size `k`: offsets `-k/2 .. k - k/2`.
#[inline]
fn window_offsets(kernel_size: usize) -> impl Iterator<Item = (usize, isize)> {
    let half = (kernel_size / 2) as isize;
    (0..kernel_size).map(move |i| (i, i as isize - half))
}

/// Copy the `k x k` window centred at `(x, y)`.
///
/// Out-of-bounds cells are unset; nothing is wrapped or clamped.
pub fn extract_kernel(grid: &Grid, x: usize, y: usize, kernel_size: usize) -> Region {
    let mut window = Region::unset(kernel_size, kernel_size);
    for (wy, dy) in window_offsets(kernel_size) {
        for (wx, dx) in window_offsets(kernel_size) {
            if let Some(&tile) = grid.get_signed(x as isize + dx, y as isize + dy) {
                window.set(wx, wy, Some(tile));
            }
        }
    }
    window
}

/// Write `window` back into `grid` centred at `(x, y)`.
///
/// Unset window cells and destinations outside the grid are skipped.
pub fn insert_kernel(grid: &mut Grid, x: usize, y: usize, window: &Region) {
    debug_assert_eq!(window.width(), window.height());
    let size = window.width();
    for (wy, dy) in window_offsets(size) {
        for (wx, dx) in window_offsets(size) {
            let Some(tile) = *window.get(wx, wy) else {
                continue;
            };
            let gx = x as isize + dx;
            let gy = y as isize + dy;
            if grid.contains(gx, gy) {
                grid.set(gx as usize, gy as usize, tile);
            }
        }
    }
}

/// True when no 4-neighbor of `(x, y)` holds `value`.
pub fn is_solo_cell<T: TileCell>(region: &Matrix<T>, x: usize, y: usize, value: Tile) -> bool {
    !neighbors(region, x, y).any(|(nx, ny)| region.get(nx, ny).tile() == Some(value))
}

/// True when any 4-neighbor of `(x, y)` is a path tile.
pub fn is_connected_to_path<T: TileCell>(region: &Matrix<T>, x: usize, y: usize) -> bool {
    path_neighbor_count(region, x, y) > 0
}

/// Number of 4-neighbors of `(x, y)` that are path tiles.
pub fn path_neighbor_count<T: TileCell>(region: &Matrix<T>, x: usize, y: usize) -> usize {
    neighbors(region, x, y)
        .filter(|&(nx, ny)| region.get(nx, ny).tile() == Some(Tile::Path))
        .count()
}

/// Count cells holding `value`. Unset cells never match.
pub fn count_tiles_of_type<T: TileCell>(region: &Matrix<T>, value: Tile) -> usize {
    region
        .as_slice()
        .iter()
        .filter(|c| c.tile() == Some(value))
        .count()
}

/// Whether an L pattern of path tiles starts at `(row, col)`.
fn is_l_shape<T: TileCell>(region: &Matrix<T>, row: usize, col: usize) -> bool {
    L_SHAPE_PATTERNS.iter().any(|pattern| {
        pattern.iter().all(|&(dr, dc)| {
            region
                .get_signed((col + dc) as isize, (row + dr) as isize)
                .is_some_and(|c| c.tile() == Some(Tile::Path))
        })
    })
}

/// Whether any of the four L rotations made of path tiles fits in `region`.
pub fn contains_l_shape<T: TileCell>(region: &Matrix<T>) -> bool {
    region
        .cells()
        .any(|(x, y, c)| c.tile() == Some(Tile::Path) && is_l_shape(region, y, x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(rows: &[&[i32]]) -> Grid {
        Grid::from_codes(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_extract_kernel_marks_out_of_bounds() {
        let g = grid(&[&[0, 1, 2], &[3, 0, 1], &[2, 3, 0]]);
        let window = extract_kernel(&g, 0, 0, 3);

        assert_eq!(window.unset_count(), 5);
        assert_eq!(*window.get(1, 1), Some(Tile::Path));
        assert_eq!(*window.get(2, 1), Some(Tile::AvailableGround));
        assert_eq!(*window.get(1, 2), Some(Tile::Water));
        assert_eq!(*window.get(0, 0), None);
    }

    #[test]
    fn test_insert_kernel_skips_unset() {
        let mut g = Grid::filled(3, 3, Tile::Water);
        let mut window = Region::unset(3, 3);
        window.set(1, 1, Some(Tile::Path));
        window.set(0, 0, Some(Tile::AvailableGround));

        insert_kernel(&mut g, 0, 0, &window);

        assert_eq!(*g.get(0, 0), Tile::Path);
        assert_eq!(g.count(Tile::Water), 8);
    }

    #[test]
    fn test_solo_cell_center_path() {
        let g = grid(&[&[1, 1, 1], &[1, 0, 1], &[1, 1, 1]]);
        assert!(is_solo_cell(&g, 1, 1, Tile::Path));
        assert!(!is_solo_cell(&g, 0, 0, Tile::AvailableGround));
        assert!(is_connected_to_path(&g, 1, 0));
        assert!(!is_connected_to_path(&g, 0, 0));
    }

    #[test]
    fn test_diagonals_are_not_neighbors() {
        let g = grid(&[&[0, 1], &[1, 0]]);
        assert!(is_solo_cell(&g, 0, 0, Tile::Path));
        assert_eq!(path_neighbor_count(&g, 0, 0), 0);
        assert_eq!(path_neighbor_count(&g, 1, 0), 2);
    }

    #[test]
    fn test_count_ignores_unset() {
        let g = grid(&[&[0, 0], &[0, 0]]);
        let window = extract_kernel(&g, 0, 0, 3);
        assert_eq!(count_tiles_of_type(&window, Tile::Path), 4);
        assert_eq!(count_tiles_of_type(&g, Tile::Water), 0);
    }

    #[test]
    fn test_l_shape_detection() {
        let l = grid(&[&[0, 1, 1], &[0, 1, 1], &[0, 0, 0]]);
        assert!(contains_l_shape(&l));

        let line = grid(&[&[0, 0, 0], &[1, 1, 1], &[1, 1, 1]]);
        assert!(!contains_l_shape(&line));

        let rotated = grid(&[&[0, 0, 0], &[1, 1, 0], &[1, 1, 0]]);
        assert!(contains_l_shape(&rotated));

        // Matching cells exist but the anchor corner is not a path tile.
        let unanchored = grid(&[&[1, 1, 0], &[1, 1, 0], &[0, 0, 0]]);
        assert!(!contains_l_shape(&unanchored));
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        (1usize..8, 1usize..8).prop_flat_map(|(w, h)| {
            prop::collection::vec(0i32..4, w * h).prop_map(move |codes| {
                let rows: Vec<Vec<i32>> = codes.chunks(w).map(<[i32]>::to_vec).collect();
                Grid::from_codes(&rows).unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn prop_kernel_round_trip_is_identity(
            g in arb_grid(),
            k_seed in 0usize..4,
            x_seed in 0usize..64,
            y_seed in 0usize..64,
        ) {
            let k = 2 * k_seed + 1;
            let x = x_seed % g.width();
            let y = y_seed % g.height();

            let mut copy = g.clone();
            let window = extract_kernel(&g, x, y, k);
            insert_kernel(&mut copy, x, y, &window);
            prop_assert_eq!(copy, g);
        }
    }
}
