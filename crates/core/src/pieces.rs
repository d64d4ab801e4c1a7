//! Pieces module - the 15-shape catalog and value-based rotation
//!
//! Every piece is a 3x3 occupancy mask indexed `mask[i][j]`, where `i` is the x offset and `j`
//! the y offset from the top-left of the footprint. When placed, the footprint is centered on the
//! anchor cell, so offset `(i, j)` lands on grid cell `(x - 1 + i, y - 1 + j)`.
//!
//! Catalog shapes are `const` data and never change; rotation builds a new [`Piece`].

use crate::error::GameError;
use crate::types::{CellValue, RotateDirection, PIECE_COUNT, PIECE_SIZE};

/// 3x3 occupancy mask, `mask[x][y]`, `1` = occupied
pub type PieceMask = [[u8; PIECE_SIZE]; PIECE_SIZE];

/// Catalog entries in id order
const CATALOG: [(&str, PieceMask); PIECE_COUNT as usize] = [
    ("Line", [[0, 0, 0], [1, 1, 1], [0, 0, 0]]),
    ("C", [[0, 0, 0], [1, 1, 1], [1, 0, 1]]),
    ("Plus", [[0, 1, 0], [1, 1, 1], [0, 1, 0]]),
    ("Dot", [[0, 0, 0], [0, 1, 0], [0, 0, 0]]),
    ("Square", [[1, 1, 0], [1, 1, 0], [0, 0, 0]]),
    ("L", [[0, 0, 0], [1, 1, 1], [0, 0, 1]]),
    ("J", [[0, 0, 1], [1, 1, 1], [0, 0, 0]]),
    ("S", [[0, 0, 0], [1, 1, 0], [0, 1, 1]]),
    ("Z", [[0, 1, 1], [1, 1, 0], [0, 0, 0]]),
    ("T", [[1, 0, 0], [1, 1, 0], [1, 0, 0]]),
    ("X", [[1, 0, 1], [0, 1, 0], [1, 0, 1]]),
    ("Corner", [[0, 0, 0], [1, 1, 0], [1, 0, 0]]),
    ("Inverse Corner", [[1, 0, 0], [1, 1, 0], [0, 0, 0]]),
    ("Diagonal", [[1, 0, 0], [0, 1, 0], [0, 0, 1]]),
    ("Double", [[0, 1, 0], [0, 1, 0], [0, 0, 0]]),
];

/// An immutable piece: catalog id, name and (possibly rotated) mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    id: u8,
    name: &'static str,
    mask: PieceMask,
}

impl Piece {
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Color written into the grid, always `id + 1`.
    pub fn color(&self) -> CellValue {
        self.id + 1
    }

    pub fn mask(&self) -> &PieceMask {
        &self.mask
    }

    /// Occupied `(i, j)` mask offsets, x-major.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..PIECE_SIZE).flat_map(move |i| {
            (0..PIECE_SIZE)
                .filter(move |&j| self.mask[i][j] != 0)
                .map(move |j| (i, j))
        })
    }

    /// Number of occupied cells
    pub fn block_count(&self) -> usize {
        self.offsets().count()
    }

    /// Return this piece rotated 90° in `direction`. `self` is untouched.
    pub fn rotated(&self, direction: RotateDirection) -> Piece {
        let last = PIECE_SIZE - 1;
        let mut mask = [[0u8; PIECE_SIZE]; PIECE_SIZE];
        for (x, column) in mask.iter_mut().enumerate() {
            for (y, cell) in column.iter_mut().enumerate() {
                // y grows downwards, so clockwise sends (x, y) to (last - y, x).
                *cell = match direction {
                    RotateDirection::Clockwise => self.mask[y][last - x],
                    RotateDirection::CounterClockwise => self.mask[last - y][x],
                };
            }
        }
        Piece { mask, ..*self }
    }
}

/// Create catalog piece `id` in its base orientation.
pub fn create_piece(id: u8) -> Result<Piece, GameError> {
    let (name, mask) = CATALOG
        .get(id as usize)
        .copied()
        .ok_or(GameError::UnknownPiece(id))?;
    Ok(Piece { id, name, mask })
}

/// Catalog piece for an id already reduced into range
pub(crate) fn catalog_piece(id: u8) -> Piece {
    let id = id % PIECE_COUNT;
    let (name, mask) = CATALOG[id as usize];
    Piece { id, name, mask }
}

/// Rotate a piece 90° in `direction`, returning a new piece.
pub fn rotate(piece: &Piece, direction: RotateDirection) -> Piece {
    piece.rotated(direction)
}

/// Every catalog piece in id order.
pub fn catalog() -> impl Iterator<Item = Piece> {
    CATALOG
        .iter()
        .enumerate()
        .map(|(id, &(name, mask))| Piece {
            id: id as u8,
            name,
            mask,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_fifteen_distinct_shapes() {
        let pieces: Vec<Piece> = catalog().collect();
        assert_eq!(pieces.len(), 15);
        for (i, a) in pieces.iter().enumerate() {
            for b in &pieces[i + 1..] {
                assert_ne!(a.mask(), b.mask(), "{} and {} share a mask", a.name(), b.name());
            }
        }
    }

    #[test]
    fn test_color_is_id_plus_one() {
        for piece in catalog() {
            assert_eq!(piece.color(), piece.id() + 1);
            assert!((1..=15).contains(&piece.color()));
        }
    }

    #[test]
    fn test_unknown_piece_id() {
        assert_eq!(create_piece(15), Err(GameError::UnknownPiece(15)));
        assert_eq!(create_piece(255), Err(GameError::UnknownPiece(255)));
    }

    #[test]
    fn test_rotate_line_clockwise() {
        // Line is the vertical bar in column i = 1.
        let line = create_piece(0).unwrap();
        let rotated = line.rotated(RotateDirection::Clockwise);
        assert_eq!(rotated.mask(), &[[0, 1, 0], [0, 1, 0], [0, 1, 0]]);
        assert_eq!(rotated.id(), line.id());
        assert_eq!(rotated.color(), line.color());
    }

    #[test]
    fn test_rotate_double_both_ways() {
        // Double occupies (0, 1) and (1, 1): a horizontal pair left of center.
        let double = create_piece(14).unwrap();
        assert_eq!(double.offsets().collect::<Vec<_>>(), vec![(0, 1), (1, 1)]);

        let cw = double.rotated(RotateDirection::Clockwise);
        let cw_offsets: Vec<_> = cw.offsets().collect();
        assert_eq!(cw_offsets, vec![(1, 0), (1, 1)]);

        let ccw = double.rotated(RotateDirection::CounterClockwise);
        let ccw_offsets: Vec<_> = ccw.offsets().collect();
        assert_eq!(ccw_offsets, vec![(1, 1), (1, 2)]);
    }

    #[test]
    fn test_rotation_is_value_based() {
        let base = create_piece(5).unwrap();
        let _ = rotate(&base, RotateDirection::Clockwise);
        assert_eq!(base, create_piece(5).unwrap());
    }
}
