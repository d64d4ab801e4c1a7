//! Line clear module - simultaneous row and column detection
//!
//! After a placement, every full column and every full row is cleared at once. A cell where a
//! full row crosses a full column belongs to both lines but is cleared (and counted) once, while
//! the line count still counts both lines.

use crate::grid::Grid;
use crate::types::{Coord, EMPTY_CELL};

/// Result of scanning a grid for full lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineClear {
    /// Full columns, ascending
    pub columns: Vec<u8>,
    /// Full rows, ascending
    pub rows: Vec<u8>,
    /// Union of the cells of every full line, without duplicates
    pub cells: Vec<Coord>,
}

impl LineClear {
    /// Full rows plus full columns, independent of overlap
    pub fn lines_count(&self) -> u32 {
        (self.rows.len() + self.columns.len()) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }
}

/// Find every full row and column of `grid`
///
/// Cells are listed column by column first, then the cells of full rows that were not already
/// listed, so the order is deterministic.
pub fn detect_full_lines(grid: &Grid) -> LineClear {
    let width = grid.width();
    let height = grid.height();

    let columns: Vec<u8> = (0..width).filter(|&x| grid.is_column_full(x)).collect();
    let rows: Vec<u8> = (0..height).filter(|&y| grid.is_row_full(y)).collect();

    let mut seen = vec![false; width as usize * height as usize];
    let mut cells = Vec::with_capacity(
        columns.len() * height as usize + rows.len() * width as usize,
    );
    let mut add = |coord: Coord| {
        let idx = coord.y as usize * width as usize + coord.x as usize;
        if !seen[idx] {
            seen[idx] = true;
            cells.push(coord);
        }
    };

    for &x in &columns {
        for y in 0..height {
            add(Coord::new(x, y));
        }
    }
    for &y in &rows {
        for x in 0..width {
            add(Coord::new(x, y));
        }
    }

    LineClear {
        columns,
        rows,
        cells,
    }
}

/// Empty every coordinate in `cells`, returning how many blocks were removed
///
/// Only cells holding a block count, so repeated or already-empty coordinates add nothing.
/// Coordinates outside the grid are skipped.
pub fn clear(grid: &mut Grid, cells: &[Coord]) -> u32 {
    let mut cleared = 0;
    for &coord in cells {
        if coord.x < grid.width() && coord.y < grid.height() && grid.at(coord) != EMPTY_CELL {
            grid.write(coord, EMPTY_CELL);
            cleared += 1;
        }
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(grid: &mut Grid, y: i8) {
        for x in 0..grid.width() as i8 {
            grid.set(x, y, 4).unwrap();
        }
    }

    fn fill_column(grid: &mut Grid, x: i8) {
        for y in 0..grid.height() as i8 {
            grid.set(x, y, 7).unwrap();
        }
    }

    #[test]
    fn test_empty_grid_has_no_lines() {
        let result = detect_full_lines(&Grid::default());
        assert!(result.is_empty());
        assert_eq!(result.lines_count(), 0);
        assert!(result.cells.is_empty());
    }

    #[test]
    fn test_single_full_row() {
        let mut grid = Grid::default();
        fill_row(&mut grid, 2);
        grid.set(0, 0, 1).unwrap();

        let result = detect_full_lines(&grid);
        assert_eq!(result.lines_count(), 1);
        assert_eq!(result.rows, vec![2]);
        assert!(result.columns.is_empty());
        let expected: Vec<Coord> = (0..5).map(|x| Coord::new(x, 2)).collect();
        assert_eq!(result.cells, expected);
    }

    #[test]
    fn test_row_and_column_intersection_counted_once() {
        let mut grid = Grid::default();
        fill_row(&mut grid, 0);
        fill_column(&mut grid, 0);

        let result = detect_full_lines(&grid);
        assert_eq!(result.lines_count(), 2);
        assert_eq!(result.cells.len(), 5 + 5 - 1);
    }

    #[test]
    fn test_clear_counts_blocks() {
        let mut grid = Grid::default();
        fill_row(&mut grid, 4);
        fill_column(&mut grid, 1);
        fill_column(&mut grid, 3);
        grid.set(0, 0, 9).unwrap();

        let result = detect_full_lines(&grid);
        assert_eq!(result.lines_count(), 3);

        let blocks = clear(&mut grid, &result.cells);
        assert_eq!(blocks, 5 + 5 + 5 - 2);
        assert_eq!(grid.occupied_count(), 1);
        assert_eq!(grid.get(0, 0), Ok(9));
    }

    #[test]
    fn test_clear_ignores_repeated_and_empty_cells() {
        let mut grid = Grid::default();
        fill_row(&mut grid, 1);
        let mut cells: Vec<Coord> = (0..5).map(|x| Coord::new(x, 1)).collect();
        cells.push(Coord::new(2, 1));
        cells.push(Coord::new(0, 1));
        cells.push(Coord::new(3, 3));
        cells.push(Coord::new(9, 9));

        assert_eq!(clear(&mut grid, &cells), 5);
        assert_eq!(grid.occupied_count(), 0);
        assert_eq!(clear(&mut grid, &cells), 0);
    }

    #[test]
    fn test_rectangular_grid() {
        let mut grid = Grid::new(3, 6).unwrap();
        fill_row(&mut grid, 5);
        let result = detect_full_lines(&grid);
        assert_eq!(result.rows, vec![5]);
        assert_eq!(result.cells.len(), 3);
    }
}
