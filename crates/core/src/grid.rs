//! Grid module - the W x H matrix of cell values
//!
//! Uses a flat row-major vector (`y * width + x`). Dimensions are fixed for the lifetime of a
//! grid. Coordinates: (x, y) where x grows left to right and y grows top to bottom.
//!
//! Every write is validated, so all reachable cell values stay within `0..=15`.

use arrayvec::ArrayVec;

use crate::error::GameError;
use crate::pieces::Piece;
use crate::types::{
    CellChange, CellValue, Coord, EMPTY_CELL, GRID_HEIGHT, GRID_WIDTH, MAX_CELL_VALUE,
    MAX_GRID_SIDE, PIECE_SIZE,
};

/// Cell writes made by a single placement (at most one per mask cell)
pub type PlacementChanges = ArrayVec<CellChange, { PIECE_SIZE * PIECE_SIZE }>;

/// The game grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u8,
    height: u8,
    /// Flat array of cells, row-major order (y * width + x)
    cells: Vec<CellValue>,
}

impl Grid {
    /// Create an empty grid. Both sides must be in `1..=127`.
    pub fn new(width: u8, height: u8) -> Result<Self, GameError> {
        if width == 0 || height == 0 || width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(GameError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![EMPTY_CELL; width as usize * height as usize],
        })
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i8, y: i8) -> Option<usize> {
        if x < 0 || y < 0 || x as u8 >= self.width || y as u8 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn out_of_bounds(&self, x: i8, y: i8) -> GameError {
        GameError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn in_bounds(&self, x: i8, y: i8) -> bool {
        self.index(x, y).is_some()
    }

    /// Get cell value at (x, y)
    pub fn get(&self, x: i8, y: i8) -> Result<CellValue, GameError> {
        self.index(x, y)
            .map(|idx| self.cells[idx])
            .ok_or_else(|| self.out_of_bounds(x, y))
    }

    /// Write cell value at (x, y), returning the previous value
    pub fn set(&mut self, x: i8, y: i8, value: CellValue) -> Result<CellValue, GameError> {
        if value > MAX_CELL_VALUE {
            return Err(GameError::InvalidCellValue(value));
        }
        let idx = self.index(x, y).ok_or_else(|| self.out_of_bounds(x, y))?;
        Ok(std::mem::replace(&mut self.cells[idx], value))
    }

    /// Read a coordinate already known to be inside the grid
    pub(crate) fn at(&self, coord: Coord) -> CellValue {
        self.cells[coord.y as usize * self.width as usize + coord.x as usize]
    }

    pub(crate) fn write(&mut self, coord: Coord, value: CellValue) {
        let width = self.width as usize;
        self.cells[coord.y as usize * width + coord.x as usize] = value;
    }

    /// Grid cell covered by mask offset `(i, j)` when anchored at (x, y)
    fn footprint_cell(x: i8, y: i8, i: usize, j: usize) -> (i8, i8) {
        (
            x.saturating_sub(1).saturating_add(i as i8),
            y.saturating_sub(1).saturating_add(j as i8),
        )
    }

    /// Check if `piece` fits with its footprint centered on (x, y)
    ///
    /// True iff every occupied offset lands inside the grid on an empty cell.
    pub fn can_place(&self, piece: &Piece, x: i8, y: i8) -> bool {
        piece.offsets().all(|(i, j)| {
            let (px, py) = Self::footprint_cell(x, y, i, j);
            matches!(self.index(px, py), Some(idx) if self.cells[idx] == EMPTY_CELL)
        })
    }

    /// Commit `piece` centered on (x, y)
    ///
    /// Either every occupied offset is written with the piece color, or nothing is written and
    /// `IllegalPlacement` is returned.
    pub fn place(&mut self, piece: &Piece, x: i8, y: i8) -> Result<PlacementChanges, GameError> {
        if !self.can_place(piece, x, y) {
            return Err(GameError::IllegalPlacement {
                piece: piece.id(),
                x,
                y,
            });
        }

        let color = piece.color();
        let mut changes = PlacementChanges::new();
        for (i, j) in piece.offsets() {
            let (px, py) = Self::footprint_cell(x, y, i, j);
            let coord = Coord::new(px as u8, py as u8);
            self.write(coord, color);
            changes.push(CellChange {
                x: coord.x,
                y: coord.y,
                value: color,
            });
        }
        Ok(changes)
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: u8) -> bool {
        if y >= self.height {
            return false;
        }
        let width = self.width as usize;
        let start = y as usize * width;
        self.cells[start..start + width]
            .iter()
            .all(|&cell| cell != EMPTY_CELL)
    }

    /// Check if a column is completely filled
    pub fn is_column_full(&self, x: u8) -> bool {
        if x >= self.width {
            return false;
        }
        (0..self.height).all(|y| self.at(Coord::new(x, y)) != EMPTY_CELL)
    }

    /// Number of non-empty cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell != EMPTY_CELL).count()
    }

    /// Get a reference to the internal cells array (row-major)
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.cells.chunks(self.width as usize)
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_CELL);
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            cells: vec![EMPTY_CELL; GRID_WIDTH as usize * GRID_HEIGHT as usize],
        }
    }
}
