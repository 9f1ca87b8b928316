//! Tile grid storage for generated maps.
//!
//! Every 2D buffer in the search (finished maps, kernel windows, maps under
//! construction and per-cell fitness) is a row-major [`Matrix`]. A finished
//! map is a [`Grid`]; a [`Region`] may hold unset cells (`None`).

use std::fmt;

use rand::Rng;
use rand::distributions::{Distribution, Standard};
use serde::{Deserialize, Serialize};

/// Terrain type occupying one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    Path = 0,
    AvailableGround = 1,
    UnavailableGround = 2,
    Water = 3,
}

impl Tile {
    /// All tiles in code order.
    pub const ALL: [Tile; 4] = [
        Tile::Path,
        Tile::AvailableGround,
        Tile::UnavailableGround,
        Tile::Water,
    ];

    /// Every tile except [`Tile::Path`].
    pub const NON_PATH: [Tile; 3] = [Tile::AvailableGround, Tile::UnavailableGround, Tile::Water];

    /// Numeric tile code (0-3).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a numeric tile code.
    pub fn from_code(code: i32) -> Result<Self, GridError> {
        match code {
            0 => Ok(Tile::Path),
            1 => Ok(Tile::AvailableGround),
            2 => Ok(Tile::UnavailableGround),
            3 => Ok(Tile::Water),
            other => Err(GridError::TileOutOfRange(other)),
        }
    }

    /// Human-readable label.
    pub fn description(self) -> &'static str {
        match self {
            Tile::Path => "Path",
            Tile::AvailableGround => "Available_ground",
            Tile::UnavailableGround => "Unavailable_ground",
            Tile::Water => "Water",
        }
    }

    /// Uniformly random tile other than path.
    pub fn random_non_path<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::NON_PATH[rng.gen_range(0..Self::NON_PATH.len())]
    }
}

impl Distribution<Tile> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Tile {
        Tile::ALL[rng.gen_range(0..Tile::ALL.len())]
    }
}

/// Label for a raw tile code.
pub fn tile_description(code: i32) -> Result<&'static str, GridError> {
    Tile::from_code(code).map(Tile::description)
}

/// Grid construction errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Invalid tile index {0}: expected 0..=3")]
    TileOutOfRange(i32),
    #[error("Grid must have at least one row and one column")]
    Empty,
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Read access to the tile stored in a cell, if any.
///
/// Lets neighborhood queries run on finished grids and on regions that
/// still contain unset cells. Unset cells never match a tile.
pub trait TileCell {
    fn tile(&self) -> Option<Tile>;
}

impl TileCell for Tile {
    fn tile(&self) -> Option<Tile> {
        Some(*self)
    }
}

impl TileCell for Option<Tile> {
    fn tile(&self) -> Option<Tile> {
        *self
    }
}

/// Dense row-major 2D buffer indexed by `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// A finished tile map.
pub type Grid = Matrix<Tile>;

/// A window or partially built map; `None` marks an unset cell.
pub type Region = Matrix<Option<Tile>>;

/// Per-cell regional fitness produced alongside a score.
pub type FitnessMatrix = Matrix<f64>;

impl<T: Clone> Matrix<T> {
    /// Matrix with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Matrix<T> {
    /// Build a matrix by evaluating `f(x, y)` for each cell in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major cell storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Whether signed coordinates fall inside the matrix.
    #[inline]
    pub fn contains(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.offset(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.offset(x, y);
        &mut self.data[idx]
    }

    /// Bounds-checked lookup with signed coordinates.
    #[inline]
    pub fn get_signed(&self, x: isize, y: isize) -> Option<&T> {
        self.contains(x, y)
            .then(|| &self.data[y as usize * self.width + x as usize])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.offset(x, y);
        self.data[idx] = value;
    }

    /// Swap the contents of two cells.
    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        let ia = self.offset(a.0, a.1);
        let ib = self.offset(b.0, b.1);
        self.data.swap(ia, ib);
    }

    /// Iterate `(x, y, &value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (i % width, i / width, v))
    }

    /// Apply `f` to every cell, keeping dimensions.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Matrix<U> {
        Matrix {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Outer-ring positions, each exactly once.
    ///
    /// Order: top row, bottom row, then the left and right columns
    /// without their corners.
    pub fn border_positions(&self) -> Vec<(usize, usize)> {
        let (w, h) = (self.width, self.height);
        let mut positions = Vec::with_capacity(2 * (w + h));
        if w == 0 || h == 0 {
            return positions;
        }

        positions.extend((0..w).map(|x| (x, 0)));
        if h > 1 {
            positions.extend((0..w).map(|x| (x, h - 1)));
        }
        for y in 1..h.saturating_sub(1) {
            positions.push((0, y));
            if w > 1 {
                positions.push((w - 1, y));
            }
        }
        positions
    }

    /// Whether a cell lies on the outer ring.
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }
}

impl Grid {
    /// Build a grid from rows of raw tile codes.
    pub fn from_codes(rows: &[Vec<i32>]) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(GridError::Empty);
        }

        let mut data = Vec::with_capacity(width * height);
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedRow {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            for &code in row {
                data.push(Tile::from_code(code)?);
            }
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Count cells holding `tile`.
    pub fn count(&self, tile: Tile) -> usize {
        self.data.iter().filter(|&&t| t == tile).count()
    }

    /// Copy into a region with every cell set.
    pub fn to_region(&self) -> Region {
        self.map(|&t| Some(t))
    }
}

impl Region {
    /// Region with every cell unset.
    pub fn unset(width: usize, height: usize) -> Self {
        Self::filled(width, height, None)
    }

    /// Number of unset cells.
    pub fn unset_count(&self) -> usize {
        self.data.iter().filter(|c| c.is_none()).count()
    }

    /// Finish the region, writing `fill` into every unset cell.
    pub fn fill_unset(self, fill: Tile) -> Grid {
        Matrix {
            width: self.width,
            height: self.height,
            data: self.data.into_iter().map(|c| c.unwrap_or(fill)).collect(),
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{:<5}", self.get(x, y).code())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
