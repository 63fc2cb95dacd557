//! Board module - the playfield substrate
//!
//! [`Playfield`] is the boundary the rule engine talks to: spawning,
//! placement tests, commit/clear and garbage. [`Board`] is the grid
//! implementation. Cells hold coded values (see the `types` crate), `0` is
//! empty. Coordinates: (x, y) with x left to right and y top to bottom.
//!
//! Clearing is split in two steps to support the line-clear delay:
//! [`Playfield::commit`] writes the piece and reports full rows, and
//! [`Playfield::collapse_cleared_rows`] removes them once the delay expires.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::pieces::{try_rotate, ActivePiece};
use crate::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH, CELL_MONO, MAX_CLEARED_ROWS, SPAWN_X, SPAWN_Y};

/// Row indices cleared by a single commit, top to bottom.
pub type ClearedRows = ArrayVec<usize, MAX_CLEARED_ROWS>;

/// Offset added to the spawn origin for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpawnOffset {
    pub x: i8,
    pub y: i8,
}

impl SpawnOffset {
    pub const ZERO: SpawnOffset = SpawnOffset { x: 0, y: 0 };
}

/// The spawn position is occupied ("block out").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnCollision {
    pub kind: PieceKind,
}

/// Grid services consumed by the rule engine.
pub trait Playfield {
    fn width(&self) -> u8;

    fn height(&self) -> u8;

    /// In bounds and empty.
    fn is_free(&self, x: i8, y: i8) -> bool;

    /// Coded cell value at (x, y); out of bounds reads as a wall.
    fn coded_cell(&self, x: i8, y: i8) -> i32;

    /// Write a piece into the grid and report the rows it completed.
    fn commit(&mut self, piece: &ActivePiece) -> ClearedRows;

    /// Remove the rows reported by the last commit and shift the stack down.
    fn collapse_cleared_rows(&mut self) -> usize;

    /// Push `rows` garbage rows in from the bottom with a hole at `hole_x`.
    ///
    /// Returns false when occupied cells were pushed out of the top.
    fn raise_garbage(&mut self, rows: u8, hole_x: u8) -> bool;

    fn filled_cells(&self) -> usize;

    /// Turn every locked cell grey.
    fn monoify(&mut self);

    fn is_empty(&self) -> bool {
        self.filled_cells() == 0
    }

    fn fits(&self, piece: &ActivePiece) -> bool {
        piece.cells().iter().all(|&(x, y)| self.is_free(x, y))
    }

    fn spawn_piece(&self, kind: PieceKind, offset: SpawnOffset) -> Result<ActivePiece, SpawnCollision> {
        let piece = ActivePiece::new(kind, SPAWN_X + offset.x, SPAWN_Y + offset.y);
        if self.fits(&piece) {
            Ok(piece)
        } else {
            Err(SpawnCollision { kind })
        }
    }

    fn test_move(&self, piece: &ActivePiece, dx: i8, dy: i8) -> bool {
        self.fits(&piece.shifted(dx, dy))
    }

    fn rotate(&self, piece: &ActivePiece, clockwise: bool) -> Option<ActivePiece> {
        try_rotate(piece.kind, piece.rotation, piece.x, piece.y, clockwise, |x, y| {
            self.is_free(x, y)
        })
        .map(|(rotation, dx)| ActivePiece {
            rotation,
            x: piece.x + dx,
            ..*piece
        })
    }

    /// Rows the piece can fall before it rests on the stack.
    fn drop_distance(&self, piece: &ActivePiece) -> i8 {
        let mut distance = 0;
        while self.test_move(piece, 0, distance + 1) {
            distance += 1;
        }
        distance
    }

    fn is_grounded(&self, piece: &ActivePiece) -> bool {
        !self.test_move(piece, 0, 1)
    }
}

/// Flat, row-major grid of coded cell values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u8,
    height: u8,
    cells: Vec<i32>,
    pending_clear: ClearedRows,
}

impl Board {
    /// Create a new empty board with the default dimensions
    pub fn new() -> Self {
        Self::with_size(BOARD_WIDTH, BOARD_HEIGHT)
    }

    pub fn with_size(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width as usize * height as usize],
            pending_clear: ClearedRows::new(),
        }
    }

    /// Build a board from text rows, bottom-aligned.
    ///
    /// `.` or space is empty, `#` is a mono block and piece letters
    /// (`i z s j l o t`, any case) are minos of that kind. Rows longer than
    /// the board are truncated; unknown characters are mono blocks.
    pub fn from_rows<S: AsRef<str>>(width: u8, height: u8, rows: &[S]) -> Self {
        let mut board = Self::with_size(width, height);
        let skip = rows.len().saturating_sub(height as usize);
        let top = height as usize - (rows.len() - skip);
        for (i, row) in rows.iter().skip(skip).enumerate() {
            let y = (top + i) as i8;
            for (x, ch) in row.as_ref().chars().take(width as usize).enumerate() {
                let value = match ch {
                    '.' | ' ' => 0,
                    c => PieceKind::from_str(&c.to_string())
                        .map(|k| k.cell_id())
                        .unwrap_or(CELL_MONO),
                };
                board.set(x as i8, y, value);
            }
        }
        board
    }

    #[inline(always)]
    fn index(&self, x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= self.width as i8 || y < 0 || y >= self.height as i8 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Get cell at position (x, y); `None` if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<i32> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Set cell at position (x, y); returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, value: i32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y).is_some_and(|row| row.iter().all(|&c| c != 0))
    }

    pub fn row(&self, y: usize) -> Option<&[i32]> {
        if y >= self.height as usize {
            return None;
        }
        let w = self.width as usize;
        Some(&self.cells[y * w..(y + 1) * w])
    }

    /// Rows waiting for [`Playfield::collapse_cleared_rows`].
    pub fn pending_clear(&self) -> &[usize] {
        &self.pending_clear
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.pending_clear.clear();
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Playfield for Board {
    fn width(&self) -> u8 {
        self.width
    }

    fn height(&self) -> u8 {
        self.height
    }

    fn is_free(&self, x: i8, y: i8) -> bool {
        self.get(x, y) == Some(0)
    }

    fn coded_cell(&self, x: i8, y: i8) -> i32 {
        self.get(x, y).unwrap_or(crate::types::CELL_WALL)
    }

    fn commit(&mut self, piece: &ActivePiece) -> ClearedRows {
        let value = piece.coded_cell_value();
        for (x, y) in piece.cells() {
            debug_assert!(self.is_free(x, y), "commit over occupied cell ({x}, {y})");
            self.set(x, y, value);
        }

        // Only rows the piece completed count as cleared.
        let cells = piece.cells();
        self.pending_clear.clear();
        for y in 0..self.height as usize {
            let touched = cells.iter().any(|&(_, py)| py as isize == y as isize);
            if touched && self.is_row_full(y) && !self.pending_clear.is_full() {
                self.pending_clear.push(y);
            }
        }
        self.pending_clear.clone()
    }

    fn collapse_cleared_rows(&mut self) -> usize {
        let cleared = self.pending_clear.len();
        if cleared == 0 {
            return 0;
        }

        // Two-pointer compaction from the bottom up.
        let width = self.width as usize;
        let mut write_y = self.height as usize;
        for read_y in (0..self.height as usize).rev() {
            if self.pending_clear.contains(&read_y) {
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                self.cells
                    .copy_within(read_y * width..(read_y + 1) * width, write_y * width);
            }
        }
        self.cells[..write_y * width].fill(0);

        self.pending_clear.clear();
        cleared
    }

    fn raise_garbage(&mut self, rows: u8, hole_x: u8) -> bool {
        let width = self.width as usize;
        let rows = (rows as usize).min(self.height as usize);
        if rows == 0 {
            return true;
        }

        let overflow = self.cells[..rows * width].iter().any(|&c| c != 0);
        self.cells.copy_within(rows * width.., 0);

        let start = (self.height as usize - rows) * width;
        for (i, cell) in self.cells[start..].iter_mut().enumerate() {
            *cell = if i % width == hole_x as usize % width {
                0
            } else {
                CELL_MONO
            };
        }
        !overflow
    }

    fn filled_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    fn monoify(&mut self) {
        for cell in self.cells.iter_mut().filter(|c| **c != 0) {
            *cell = CELL_MONO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rotation;

    fn fill_row(board: &mut Board, y: i8, except: Option<i8>) {
        for x in 0..board.width() as i8 {
            if Some(x) != except {
                board.set(x, y, PieceKind::Z.cell_id());
            }
        }
    }

    #[test]
    fn test_board_index_calculation() {
        let board = Board::new();
        assert_eq!(board.index(0, 0), Some(0));
        assert_eq!(board.index(9, 19), Some(199));
        assert_eq!(board.index(-1, 0), None);
        assert_eq!(board.index(10, 0), None);
        assert_eq!(board.index(0, 20), None);
    }

    #[test]
    fn spawn_piece_reports_collision() {
        let mut board = Board::new();
        assert!(board.spawn_piece(PieceKind::T, SpawnOffset::ZERO).is_ok());

        board.set(4, 1, CELL_MONO);
        assert_eq!(
            board.spawn_piece(PieceKind::T, SpawnOffset::ZERO),
            Err(SpawnCollision { kind: PieceKind::T })
        );
    }

    #[test]
    fn commit_reports_full_rows_then_collapse_removes_them() {
        let mut board = Board::new();
        fill_row(&mut board, 19, Some(0));
        fill_row(&mut board, 18, Some(0));
        board.set(5, 17, PieceKind::T.cell_id());

        // Vertical I in column 0 covering rows 16..=19.
        let piece = ActivePiece {
            rotation: Rotation::East,
            ..ActivePiece::new(PieceKind::I, -2, 16)
        };
        assert!(board.fits(&piece));

        let cleared = board.commit(&piece);
        assert_eq!(cleared.as_slice(), &[18, 19]);
        assert_eq!(board.pending_clear(), &[18, 19]);

        assert_eq!(board.collapse_cleared_rows(), 2);
        // The T cell fell two rows, the I stub (rows 16, 17) now sits on 18, 19.
        assert_eq!(board.get(5, 19), Some(PieceKind::T.cell_id()));
        assert_eq!(board.get(0, 19), Some(PieceKind::I.cell_id()));
        assert_eq!(board.get(0, 18), Some(PieceKind::I.cell_id()));
        assert_eq!(board.filled_cells(), 3);
        assert_eq!(board.collapse_cleared_rows(), 0);
    }

    #[test]
    fn commit_ignores_full_rows_the_piece_does_not_touch() {
        let mut board = Board::new();
        fill_row(&mut board, 19, None);
        fill_row(&mut board, 15, Some(0));

        let piece = ActivePiece {
            rotation: Rotation::East,
            ..ActivePiece::new(PieceKind::I, -2, 12)
        };
        assert!(board.fits(&piece));

        // Rows 12..=15: only row 15 is completed by the piece.
        let cleared = board.commit(&piece);
        assert_eq!(cleared.as_slice(), &[15]);
        assert!(board.is_row_full(19));
    }

    #[test]
    fn drop_distance_and_grounding() {
        let board = Board::new();
        let piece = board.spawn_piece(PieceKind::O, SpawnOffset::ZERO).unwrap();
        // O occupies box rows 1..=2, so it can fall to rows 18..=19.
        assert_eq!(board.drop_distance(&piece), 17);
        assert!(!board.is_grounded(&piece));
        assert!(board.is_grounded(&piece.shifted(0, 17)));
    }

    #[test]
    fn raise_garbage_pushes_stack_up() {
        let mut board = Board::new();
        board.set(2, 19, PieceKind::L.cell_id());
        assert!(board.raise_garbage(2, 4));

        assert_eq!(board.get(2, 17), Some(PieceKind::L.cell_id()));
        assert_eq!(board.get(4, 19), Some(0));
        assert_eq!(board.get(4, 18), Some(0));
        assert_eq!(board.get(0, 19), Some(CELL_MONO));
        assert_eq!(board.filled_cells(), 1 + 2 * 9);
    }

    #[test]
    fn raise_garbage_reports_top_out() {
        let mut board = Board::new();
        board.set(0, 0, CELL_MONO);
        assert!(!board.raise_garbage(1, 0));
    }

    #[test]
    fn from_rows_is_bottom_aligned() {
        let board = Board::from_rows(4, 6, &["..t.", "#zz."]);
        assert_eq!(board.get(2, 4), Some(PieceKind::T.cell_id()));
        assert_eq!(board.get(0, 5), Some(CELL_MONO));
        assert_eq!(board.get(1, 5), Some(PieceKind::Z.cell_id()));
        assert_eq!(board.get(3, 5), Some(0));
        assert_eq!(board.filled_cells(), 4);
    }

    #[test]
    fn monoify_greys_the_stack() {
        let mut board = Board::from_rows(4, 4, &["ij.o"]);
        board.monoify();
        assert_eq!(board.row(3).unwrap(), &[CELL_MONO, CELL_MONO, 0, CELL_MONO]);
    }
}
