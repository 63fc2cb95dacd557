//! Core types module - shared data structures and constants
//!
//! This crate defines the fundamental types used throughout the workspace.
//! All types are plain data with no I/O, so they can be used by the rule
//! engine, the terminal view and the input layer alike.
//!
//! # Playfield
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//! - **Spawn origin**: (3, 0), shifted by the mode's per-player spawn offset
//!
//! # Frame timing
//!
//! The simulation runs at a fixed [`FPS`] and every duration in the rule
//! engine is expressed in frames, never wall-clock time.
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `FPS` | 60 | Simulated frames per second |
//! | `GRAVITY_DENOMINATOR` | 256 | Gravity unit (1G = 256) |
//! | `GRAVITY_20G` | 5120 | Drop to the floor every frame |
//! | `SECTION_SIZE` | 100 | Levels per section |
//! | `POST_LOCK_FLASH_FRAMES` | 2 | Lock flash duration |
//! | `HOLD_FLASH_FRAMES` | 8 | Hold box flash duration |
//!
//! # Coded cell values
//!
//! Cells handed to the render layer are encoded as `i32`:
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `0` | empty |
//! | `id + 1` | normal mino of kind `id` |
//! | `CELL_MONO` (-5) | grey stack block (game over) |
//! | `(id + 1) \| CELL_BRACKETS` | bracketed mino |
//! | `(id + 1) \| CELL_GHOST` | outline only |
//! | `CELL_WALL` (-30) | field limiter |
//!
//! # Examples
//!
//! ```
//! use shiro_tgm_types::{PieceKind, Rotation, GameAction, Grade, BOARD_WIDTH};
//!
//! let piece = PieceKind::from_str("t").unwrap();
//! assert_eq!(piece, PieceKind::T);
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(GameAction::from_str("sonicDrop"), Some(GameAction::SonicDrop));
//! assert_eq!(Grade::S4.as_str(), "S4");
//! assert_eq!(BOARD_WIDTH, 10);
//! ```

use serde::{Deserialize, Serialize};

/// Default board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Default board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Spawn origin of the 4x4 piece box, before the per-player offset.
pub const SPAWN_X: i8 = 3;
pub const SPAWN_Y: i8 = 0;

/// Simulated frames per second.
pub const FPS: u32 = 60;

/// Gravity is measured in 1/256ths of a row per frame.
pub const GRAVITY_DENOMINATOR: u32 = 256;

/// 20G: the piece reaches the floor on the frame it spawns.
pub const GRAVITY_20G: u32 = 20 * GRAVITY_DENOMINATOR;

/// Number of levels grouped into one section.
pub const SECTION_SIZE: u32 = 100;

/// Level offset inside a section at which the cool time is sampled.
pub const COOL_CHECK_OFFSET: u32 = 70;

/// Frames the stack flashes after a piece locks.
pub const POST_LOCK_FLASH_FRAMES: u32 = 2;

/// Frames the hold box flashes after a swap.
pub const HOLD_FLASH_FRAMES: u32 = 8;

/// Largest number of rows a single lock can clear (pentominoes and taller).
pub const MAX_CLEARED_ROWS: usize = 5;

/// Upper bound on the preview queue length.
pub const MAX_PREVIEWS: usize = 6;

/// Grey stack block shown after a game over.
pub const CELL_MONO: i32 = -5;

/// Field limiter / wall cell.
pub const CELL_WALL: i32 = -30;

/// Rendering hint: draw the mino in brackets.
pub const CELL_BRACKETS: i32 = 1 << 24;

/// Rendering hint: draw only the outline of the mino.
pub const CELL_GHOST: i32 = 1 << 25;

/// Rendering hint: gem block.
pub const CELL_GEM: i32 = 1 << 26;

/// Mask that strips the rendering hints from a coded cell value.
pub const CELL_ID_MASK: i32 = CELL_BRACKETS - 1;

/// Session flag: draw the ghost piece under the active piece.
pub const FLAG_GHOST: u32 = 1 << 0;

/// Session flag: clears of two or more rows send garbage to the other players.
pub const FLAG_VERSUS_GARBAGE: u32 = 1 << 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timing_defaults() {
        assert_eq!(FPS, 60);
        assert_eq!(GRAVITY_DENOMINATOR, 256);
        assert_eq!(GRAVITY_20G, 5120);
        assert_eq!(SECTION_SIZE, 100);
        assert_eq!(POST_LOCK_FLASH_FRAMES, 2);
        assert_eq!(HOLD_FLASH_FRAMES, 8);
    }

    #[test]
    fn cell_flags_do_not_overlap_ids() {
        for kind in PieceKind::ALL {
            let id = kind.cell_id();
            assert_eq!(id & CELL_BRACKETS, 0);
            assert_eq!(id & CELL_GHOST, 0);
            assert_eq!((id | CELL_GHOST) & CELL_ID_MASK, id);
        }
    }

    #[test]
    fn grade_index_round_trip_and_order() {
        assert_eq!(Grade::from_index(0), Some(Grade::G9));
        assert_eq!(Grade::from_index(Grade::GM.index()), Some(Grade::GM));
        assert_eq!(Grade::from_index(99), None);
        assert!(Grade::S1 > Grade::G1);
        assert!(Grade::GM > Grade::MM);
    }

    #[test]
    fn medal_tiers_are_ordered() {
        assert!(MedalTier::None < MedalTier::Bronze);
        assert!(MedalTier::Gold < MedalTier::Platinum);
        assert_eq!(MedalTier::Silver.as_str(), "silver");
    }
}

/// The seven tetromino kinds.
///
/// The declaration order is the mino id used for coded cell values:
/// I=0, Z=1, S=2, J=3, L=4, O=5, T=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    Z,
    S,
    J,
    L,
    O,
    T,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::Z,
        PieceKind::S,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::T,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use shiro_tgm_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "z" => Some(PieceKind::Z),
            "s" => Some(PieceKind::S),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::Z => "z",
            PieceKind::S => "s",
            PieceKind::J => "j",
            PieceKind::L => "l",
            PieceKind::O => "o",
            PieceKind::T => "t",
        }
    }

    /// Zero-based mino id.
    pub fn id(&self) -> i32 {
        *self as i32
    }

    /// Cell value of a plain locked mino of this kind (`id + 1`).
    pub fn cell_id(&self) -> i32 {
        self.id() + 1
    }

    /// Inverse of [`PieceKind::cell_id`], ignoring rendering hint flags.
    pub fn from_cell_id(value: i32) -> Option<Self> {
        if value <= 0 {
            return None;
        }
        let id = (value & CELL_ID_MASK) - 1;
        Self::ALL.get(usize::try_from(id).ok()?).copied()
    }
}

/// Rotation states. North is the spawn orientation (flat side down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use shiro_tgm_types::Rotation;
    ///
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Controls a player can operate.
///
/// Movement and drop actions are level-triggered (held), rotations, sonic
/// drop and hold are edge-triggered (pressed this frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    /// Shift left (DAS when held)
    MoveLeft,
    /// Shift right (DAS when held)
    MoveRight,
    /// Soft drop: at least 1G, locks on contact
    SoftDrop,
    /// Sonic drop: drop to the floor without locking
    SonicDrop,
    /// Rotate counter-clockwise (A / C buttons)
    RotateCcw,
    /// Rotate clockwise (B button)
    RotateCw,
    /// Swap with the hold slot
    Hold,
    /// Toggle the session pause gate
    Pause,
    /// Restart the session with the same seed
    Restart,
}

impl GameAction {
    pub const ALL: [GameAction; 9] = [
        GameAction::MoveLeft,
        GameAction::MoveRight,
        GameAction::SoftDrop,
        GameAction::SonicDrop,
        GameAction::RotateCcw,
        GameAction::RotateCw,
        GameAction::Hold,
        GameAction::Pause,
        GameAction::Restart,
    ];

    /// Parse action from its camelCase name (case-insensitive)
    ///
    /// ```
    /// use shiro_tgm_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("hold"), Some(GameAction::Hold));
    /// assert_eq!(GameAction::from_str("hardDrop"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "softdrop" => Some(GameAction::SoftDrop),
            "sonicdrop" => Some(GameAction::SonicDrop),
            "rotateccw" => Some(GameAction::RotateCcw),
            "rotatecw" => Some(GameAction::RotateCw),
            "hold" => Some(GameAction::Hold),
            "pause" => Some(GameAction::Pause),
            "restart" => Some(GameAction::Restart),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::SoftDrop => "softDrop",
            GameAction::SonicDrop => "sonicDrop",
            GameAction::RotateCcw => "rotateCcw",
            GameAction::RotateCw => "rotateCw",
            GameAction::Hold => "hold",
            GameAction::Pause => "pause",
            GameAction::Restart => "restart",
        }
    }

    /// Bit used by [`ButtonSet`].
    pub fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

/// A discrete input event as delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press(GameAction),
    Release(GameAction),
}

/// Compact set of [`GameAction`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ButtonSet(u16);

impl ButtonSet {
    pub const EMPTY: ButtonSet = ButtonSet(0);

    pub fn contains(&self, action: GameAction) -> bool {
        self.0 & action.bit() != 0
    }

    pub fn insert(&mut self, action: GameAction) {
        self.0 |= action.bit();
    }

    pub fn remove(&mut self, action: GameAction) {
        self.0 &= !action.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Phase of a player's piece cycle. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayPhase {
    /// Waiting out ARE before the next piece appears.
    Spawning,
    /// Active piece in the air.
    Falling,
    /// Active piece resting on the stack, lock delay running.
    Locking,
    /// Full rows are being shown before they collapse.
    LineClear,
    /// Block out: the player can no longer spawn pieces.
    GameOver,
    /// The mode's final level was reached.
    Finished,
}

impl PlayPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayPhase::Spawning => "spawning",
            PlayPhase::Falling => "falling",
            PlayPhase::Locking => "locking",
            PlayPhase::LineClear => "lineClear",
            PlayPhase::GameOver => "gameOver",
            PlayPhase::Finished => "finished",
        }
    }

    /// True once the player's game has ended for any reason.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlayPhase::GameOver | PlayPhase::Finished)
    }

    pub fn has_active_piece(&self) -> bool {
        matches!(self, PlayPhase::Falling | PlayPhase::Locking)
    }
}

/// Result of a lock, classified by the number of rows cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClearKind {
    #[default]
    None,
    Single,
    Double,
    Triple,
    Tetris,
    /// Five or more rows (possible with taller pieces on custom fields).
    Pentris,
}

impl ClearKind {
    pub fn from_lines(lines: usize) -> Self {
        match lines {
            0 => ClearKind::None,
            1 => ClearKind::Single,
            2 => ClearKind::Double,
            3 => ClearKind::Triple,
            4 => ClearKind::Tetris,
            _ => ClearKind::Pentris,
        }
    }

    pub fn lines(&self) -> u32 {
        match self {
            ClearKind::None => 0,
            ClearKind::Single => 1,
            ClearKind::Double => 2,
            ClearKind::Triple => 3,
            ClearKind::Tetris => 4,
            ClearKind::Pentris => 5,
        }
    }

    pub fn is_clear(&self) -> bool {
        *self != ClearKind::None
    }
}

/// Displayed grade, lowest (9) to highest (GM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    G9,
    G8,
    G7,
    G6,
    G5,
    G4,
    G3,
    G2,
    G1,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    S8,
    S9,
    S10,
    S11,
    S12,
    S13,
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
    M7,
    M8,
    M9,
    M,
    MK,
    MV,
    MO,
    MM,
    GM,
}

impl Grade {
    const ORDER: [Grade; 37] = [
        Grade::G9,
        Grade::G8,
        Grade::G7,
        Grade::G6,
        Grade::G5,
        Grade::G4,
        Grade::G3,
        Grade::G2,
        Grade::G1,
        Grade::S1,
        Grade::S2,
        Grade::S3,
        Grade::S4,
        Grade::S5,
        Grade::S6,
        Grade::S7,
        Grade::S8,
        Grade::S9,
        Grade::S10,
        Grade::S11,
        Grade::S12,
        Grade::S13,
        Grade::M1,
        Grade::M2,
        Grade::M3,
        Grade::M4,
        Grade::M5,
        Grade::M6,
        Grade::M7,
        Grade::M8,
        Grade::M9,
        Grade::M,
        Grade::MK,
        Grade::MV,
        Grade::MO,
        Grade::MM,
        Grade::GM,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::G9 => "9",
            Grade::G8 => "8",
            Grade::G7 => "7",
            Grade::G6 => "6",
            Grade::G5 => "5",
            Grade::G4 => "4",
            Grade::G3 => "3",
            Grade::G2 => "2",
            Grade::G1 => "1",
            Grade::S1 => "S1",
            Grade::S2 => "S2",
            Grade::S3 => "S3",
            Grade::S4 => "S4",
            Grade::S5 => "S5",
            Grade::S6 => "S6",
            Grade::S7 => "S7",
            Grade::S8 => "S8",
            Grade::S9 => "S9",
            Grade::S10 => "S10",
            Grade::S11 => "S11",
            Grade::S12 => "S12",
            Grade::S13 => "S13",
            Grade::M1 => "m1",
            Grade::M2 => "m2",
            Grade::M3 => "m3",
            Grade::M4 => "m4",
            Grade::M5 => "m5",
            Grade::M6 => "m6",
            Grade::M7 => "m7",
            Grade::M8 => "m8",
            Grade::M9 => "m9",
            Grade::M => "M",
            Grade::MK => "MK",
            Grade::MV => "MV",
            Grade::MO => "MO",
            Grade::MM => "MM",
            Grade::GM => "GM",
        }
    }
}

/// Medal tier. `None` means not awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum MedalTier {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl MedalTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedalTier::None => "none",
            MedalTier::Bronze => "bronze",
            MedalTier::Silver => "silver",
            MedalTier::Gold => "gold",
            MedalTier::Platinum => "platinum",
        }
    }
}

/// Medal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MedalKind {
    /// Section time
    St,
    /// Skill (tetrises)
    Sk,
    /// Combo
    Co,
    /// All clear
    Ac,
    /// Recover
    Re,
    /// Rotation
    Ro,
}

impl MedalKind {
    pub const ALL: [MedalKind; 6] = [
        MedalKind::St,
        MedalKind::Sk,
        MedalKind::Co,
        MedalKind::Ac,
        MedalKind::Re,
        MedalKind::Ro,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MedalKind::St => "ST",
            MedalKind::Sk => "SK",
            MedalKind::Co => "CO",
            MedalKind::Ac => "AC",
            MedalKind::Re => "RE",
            MedalKind::Ro => "RO",
        }
    }
}

/// Format a frame count as `mm:ss:cc` (centiseconds).
///
/// ```
/// use shiro_tgm_types::format_frames;
///
/// assert_eq!(format_frames(0), "00:00:00");
/// assert_eq!(format_frames(60 * 75 + 30), "01:15:50");
/// ```
pub fn format_frames(frames: u64) -> String {
    let fps = FPS as u64;
    let minutes = frames / (fps * 60);
    let seconds = (frames / fps) % 60;
    let centis = (frames % fps) * 100 / fps;
    format!("{minutes:02}:{seconds:02}:{centis:02}")
}
