//! Pieces module - tetromino shapes and the arcade rotation system
//!
//! Shapes live in a 4x4 box with `y` growing downwards. In the spawn
//! orientation every piece rests flat side down on row 2 of its box, and
//! rotation keeps the piece bottom-aligned where possible. Failed rotations
//! get a basic wall kick: one cell right, then one cell left. The I piece
//! never kicks.

use crate::types::{PieceKind, Rotation, CELL_BRACKETS, CELL_GHOST, CELL_MONO};

/// Offset of a single mino relative to piece origin
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets from piece origin
pub type PieceShape = [MinoOffset; 4];

/// Get the shape (mino offsets) for a piece kind and rotation
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    match kind {
        PieceKind::I => get_i_shape(rotation),
        PieceKind::Z => get_z_shape(rotation),
        PieceKind::S => get_s_shape(rotation),
        PieceKind::J => get_j_shape(rotation),
        PieceKind::L => get_l_shape(rotation),
        PieceKind::O => [(1, 1), (2, 1), (1, 2), (2, 2)],
        PieceKind::T => get_t_shape(rotation),
    }
}

fn get_i_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North | Rotation::South => [(0, 1), (1, 1), (2, 1), (3, 1)],
        Rotation::East | Rotation::West => [(2, 0), (2, 1), (2, 2), (2, 3)],
    }
}

fn get_z_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North | Rotation::South => [(0, 1), (1, 1), (1, 2), (2, 2)],
        Rotation::East | Rotation::West => [(2, 0), (1, 1), (2, 1), (1, 2)],
    }
}

fn get_s_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North | Rotation::South => [(1, 1), (2, 1), (0, 2), (1, 2)],
        Rotation::East | Rotation::West => [(0, 0), (0, 1), (1, 1), (1, 2)],
    }
}

fn get_j_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 1), (1, 1), (2, 1), (2, 2)],
        Rotation::East => [(1, 0), (1, 1), (0, 2), (1, 2)],
        Rotation::South => [(0, 1), (0, 2), (1, 2), (2, 2)],
        Rotation::West => [(1, 0), (2, 0), (1, 1), (1, 2)],
    }
}

fn get_l_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 1), (1, 1), (2, 1), (0, 2)],
        Rotation::East => [(0, 0), (1, 0), (1, 1), (1, 2)],
        Rotation::South => [(2, 1), (0, 2), (1, 2), (2, 2)],
        Rotation::West => [(1, 0), (1, 1), (1, 2), (2, 2)],
    }
}

fn get_t_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 1), (1, 1), (2, 1), (1, 2)],
        Rotation::East => [(1, 0), (0, 1), (1, 1), (1, 2)],
        Rotation::South => [(1, 1), (0, 2), (1, 2), (2, 2)],
        Rotation::West => [(1, 0), (1, 1), (2, 1), (1, 2)],
    }
}

/// Horizontal kick offsets tried in order after a failed in-place rotation.
const WALL_KICKS: [i8; 3] = [0, 1, -1];

/// Try to rotate a piece, applying the basic wall kick.
///
/// Returns the new rotation and the horizontal kick that was used, or `None`
/// if no position fits.
pub fn try_rotate(
    kind: PieceKind,
    rotation: Rotation,
    x: i8,
    y: i8,
    clockwise: bool,
    is_valid: impl Fn(i8, i8) -> bool,
) -> Option<(Rotation, i8)> {
    if kind == PieceKind::O {
        return None;
    }

    let new_rotation = if clockwise {
        rotation.rotate_cw()
    } else {
        rotation.rotate_ccw()
    };
    let shape = get_shape(kind, new_rotation);
    let kicks: &[i8] = if kind == PieceKind::I {
        &WALL_KICKS[..1]
    } else {
        &WALL_KICKS
    };

    kicks
        .iter()
        .copied()
        .find(|&dx| shape.iter().all(|&(mx, my)| is_valid(x + dx + mx, y + my)))
        .map(|dx| (new_rotation, dx))
}

/// Rendering capability of a piece, replacing per-style subclasses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinoStyle {
    #[default]
    Normal,
    /// Grey block, used for the stack after a game over.
    Mono,
    /// Drawn with brackets.
    Brackets,
    /// Outline only.
    Ghost,
}

impl MinoStyle {
    /// Encode a mino of `kind` in this style as a board cell value.
    pub fn coded_cell_value(&self, kind: PieceKind) -> i32 {
        match self {
            MinoStyle::Normal => kind.cell_id(),
            MinoStyle::Mono => CELL_MONO,
            MinoStyle::Brackets => kind.cell_id() | CELL_BRACKETS,
            MinoStyle::Ghost => kind.cell_id() | CELL_GHOST,
        }
    }
}

/// Handle to a piece placed on a playfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
    pub style: MinoStyle,
}

impl ActivePiece {
    pub fn new(kind: PieceKind, x: i8, y: i8) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x,
            y,
            style: MinoStyle::Normal,
        }
    }

    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Absolute board coordinates of the four minos.
    pub fn cells(&self) -> [(i8, i8); 4] {
        self.shape().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn coded_cell_value(&self) -> i32 {
        self.style.coded_cell_value(self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_has_four_distinct_minos_inside_the_box() {
        for kind in PieceKind::ALL {
            for rotation in [Rotation::North, Rotation::East, Rotation::South, Rotation::West] {
                let shape = get_shape(kind, rotation);
                for (i, a) in shape.iter().enumerate() {
                    assert!((0..4).contains(&a.0) && (0..4).contains(&a.1));
                    for b in &shape[i + 1..] {
                        assert_ne!(a, b, "{kind:?} {rotation:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn spawn_orientation_is_flat_side_down() {
        // Every non-I piece's lowest minos sit on row 2 of the box.
        for kind in [PieceKind::Z, PieceKind::S, PieceKind::J, PieceKind::L, PieceKind::O, PieceKind::T] {
            let bottom = get_shape(kind, Rotation::North).iter().map(|m| m.1).max();
            assert_eq!(bottom, Some(2), "{kind:?}");
        }
    }

    #[test]
    fn rotation_kicks_right_then_left() {
        // Block the in-place position for T East at x=0 by refusing column 0.
        let result = try_rotate(PieceKind::T, Rotation::North, -1, 5, true, |x, _| x >= 0);
        assert_eq!(result, Some((Rotation::East, 1)));

        let result = try_rotate(PieceKind::T, Rotation::North, 8, 5, true, |x, _| x <= 9);
        assert_eq!(result, Some((Rotation::East, 0)));
    }

    #[test]
    fn i_piece_does_not_kick() {
        // Vertical I occupies column x+2; forbid it.
        let result = try_rotate(PieceKind::I, Rotation::North, 0, 5, true, |x, _| x != 2);
        assert_eq!(result, None);
    }

    #[test]
    fn o_piece_does_not_rotate() {
        assert_eq!(
            try_rotate(PieceKind::O, Rotation::North, 3, 3, true, |_, _| true),
            None
        );
    }

    #[test]
    fn coded_cell_values_follow_style() {
        let mut piece = ActivePiece::new(PieceKind::J, 3, 0);
        assert_eq!(piece.coded_cell_value(), PieceKind::J.cell_id());

        piece.style = MinoStyle::Mono;
        assert_eq!(piece.coded_cell_value(), CELL_MONO);

        piece.style = MinoStyle::Brackets;
        assert_eq!(piece.coded_cell_value(), PieceKind::J.cell_id() | CELL_BRACKETS);

        piece.style = MinoStyle::Ghost;
        assert_eq!(piece.coded_cell_value(), PieceKind::J.cell_id() | CELL_GHOST);
    }
}
