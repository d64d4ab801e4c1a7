//! Grid tests - placement legality and full-line detection

use tetrecs::core::{create_piece, detect_full_lines, GameError, Grid};
use tetrecs::types::{Coord, GRID_HEIGHT, GRID_WIDTH};

#[test]
fn test_grid_new_empty() {
    let grid = Grid::new(GRID_WIDTH, GRID_HEIGHT).unwrap();
    assert_eq!(grid.width(), 5);
    assert_eq!(grid.height(), 5);

    for y in 0..5 {
        for x in 0..5 {
            assert!(grid.in_bounds(x, y), "Cell ({}, {}) should be valid", x, y);
            assert_eq!(grid.get(x, y), Ok(0));
        }
    }
}

#[test]
fn test_grid_get_out_of_bounds_is_typed() {
    let grid = Grid::new(5, 5).unwrap();

    assert!(matches!(grid.get(-1, 0), Err(GameError::OutOfBounds { x: -1, .. })));
    assert!(matches!(grid.get(0, -1), Err(GameError::OutOfBounds { .. })));
    assert!(matches!(grid.get(5, 0), Err(GameError::OutOfBounds { .. })));
    assert!(matches!(grid.get(0, 5), Err(GameError::OutOfBounds { .. })));
}

#[test]
fn test_grid_set_rejects_values_above_fifteen() {
    let mut grid = Grid::new(5, 5).unwrap();
    assert_eq!(grid.set(1, 1, 15), Ok(0));
    assert_eq!(grid.get(1, 1), Ok(15));
    assert!(grid.set(1, 1, 16).is_err());
    assert_eq!(grid.get(1, 1), Ok(15));
}

#[test]
fn test_can_place_at_edges() {
    let grid = Grid::new(5, 5).unwrap();
    let plus = create_piece(2).unwrap();
    assert_eq!(plus.name(), "Plus");

    // The plus needs a free cell on every side of the anchor.
    assert!(grid.can_place(&plus, 1, 1));
    assert!(grid.can_place(&plus, 3, 3));
    assert!(!grid.can_place(&plus, 0, 2));
    assert!(!grid.can_place(&plus, 2, 4));

    let dot = create_piece(3).unwrap();
    assert!(grid.can_place(&dot, 0, 0));
    assert!(grid.can_place(&dot, 4, 4));
}

#[test]
fn test_place_writes_color_and_never_overwrites() {
    let mut grid = Grid::new(5, 5).unwrap();
    let line = create_piece(0).unwrap();

    let changes = grid.place(&line, 2, 2).unwrap();
    assert_eq!(changes.len(), 3);
    assert!(changes.iter().all(|c| c.value == line.color()));
    assert_eq!(grid.occupied_count(), 3);

    let before = grid.clone();
    let err = grid.place(&line, 2, 2).unwrap_err();
    assert!(matches!(err, GameError::IllegalPlacement { piece: 0, x: 2, y: 2 }));
    assert_eq!(grid, before);
}

#[test]
fn test_detect_single_full_row() {
    let mut grid = Grid::new(5, 5).unwrap();
    for x in 0..5 {
        grid.set(x, 2, 4).unwrap();
    }

    let clear = detect_full_lines(&grid);
    assert_eq!(clear.lines_count(), 1);
    assert_eq!(clear.rows, vec![2]);
    assert!(clear.columns.is_empty());
    assert_eq!(
        clear.cells,
        (0..5).map(|x| Coord::new(x, 2)).collect::<Vec<_>>()
    );
}

#[test]
fn test_detect_row_and_column_share_a_cell() {
    let mut grid = Grid::new(5, 5).unwrap();
    for i in 0..5 {
        grid.set(i, 0, 1).unwrap();
        grid.set(0, i, 1).unwrap();
    }

    let clear = detect_full_lines(&grid);
    assert_eq!(clear.lines_count(), 2);
    assert_eq!(clear.cells.len(), 5 + 5 - 1);
}

#[test]
fn test_detect_nothing_on_partial_lines() {
    let mut grid = Grid::new(5, 5).unwrap();
    for x in 0..4 {
        grid.set(x, 4, 2).unwrap();
    }
    assert!(detect_full_lines(&grid).is_empty());
}

#[test]
fn test_non_square_grid() {
    let mut grid = Grid::new(7, 3).unwrap();
    for y in 0..3 {
        grid.set(6, y, 1).unwrap();
    }
    let clear = detect_full_lines(&grid);
    assert_eq!(clear.columns, vec![6]);
    assert_eq!(clear.cells.len(), 3);
}
