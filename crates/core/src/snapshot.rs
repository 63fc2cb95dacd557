//! Read-only views of a game for the render layer.
//!
//! `snapshot_into` refills an existing snapshot so a renderer can keep one
//! around and avoid allocating every frame.

use arrayvec::ArrayVec;

use crate::board::Playfield;
use crate::medals::Medals;
use crate::pieces::ActivePiece;
use crate::player::PlayerState;
use crate::speed::FrameTimings;
use crate::types::{Grade, PieceKind, PlayPhase, CELL_WALL, MAX_PREVIEWS, SECTION_SIZE};

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub index: usize,
    pub width: u8,
    pub height: u8,
    /// Locked cells, row-major. The active piece and ghost are not included.
    pub cells: Vec<i32>,
    pub active: Option<ActivePiece>,
    pub ghost: Option<ActivePiece>,
    pub hold: Option<PieceKind>,
    pub hold_flash: bool,
    pub lock_flash: bool,
    pub previews: ArrayVec<PieceKind, MAX_PREVIEWS>,
    pub phase: PlayPhase,
    pub level: u32,
    /// Level the current section ends at.
    pub level_target: u32,
    pub section: u32,
    pub score: u64,
    pub grade: Grade,
    pub grade_points: u32,
    pub mroll_unlocked: bool,
    pub timer: u64,
    pub lines: u32,
    pub combo: u32,
    pub medals: Medals,
    pub timings: FrameTimings,
}

impl PlayerSnapshot {
    /// Coded value at (x, y) with the active piece and ghost drawn in.
    pub fn coded_cell(&self, x: i8, y: i8) -> i32 {
        if x < 0 || y < 0 || x >= self.width as i8 || y >= self.height as i8 {
            return CELL_WALL;
        }
        for piece in self.active.iter().chain(self.ghost.iter()) {
            if piece.cells().contains(&(x, y)) {
                return piece.coded_cell_value();
            }
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            index: 0,
            width: 0,
            height: 0,
            cells: Vec::new(),
            active: None,
            ghost: None,
            hold: None,
            hold_flash: false,
            lock_flash: false,
            previews: ArrayVec::new(),
            phase: PlayPhase::Spawning,
            level: 0,
            level_target: 0,
            section: 0,
            score: 0,
            grade: Grade::G9,
            grade_points: 0,
            mroll_unlocked: false,
            timer: 0,
            lines: 0,
            combo: 0,
            medals: Medals::default(),
            timings: FrameTimings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub frame: u64,
    pub paused: bool,
    pub state_flags: u32,
    pub rank: f32,
    pub music: u32,
    pub focused_player: usize,
    pub players: Vec<PlayerSnapshot>,
}

impl SessionSnapshot {
    /// Every player has finished or topped out.
    pub fn is_over(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.phase.is_terminal())
    }
}

impl PlayerState {
    pub fn snapshot_into(&self, out: &mut PlayerSnapshot, show_ghost: bool, final_level: u32) {
        let board = self.board();
        out.index = self.index();
        out.width = board.width();
        out.height = board.height();
        out.cells.clear();
        out.cells.extend_from_slice(board.cells());

        out.active = self.active();
        out.ghost = if show_ghost { self.ghost() } else { None };
        out.hold = self.hold_piece();
        out.hold_flash = self.counters().hold_flash.is_running();
        out.lock_flash = self.counters().post_lock.is_running();
        out.previews.clear();
        out.previews
            .extend(self.previews().iter().copied().take(MAX_PREVIEWS));

        out.phase = self.phase();
        out.level = self.level();
        out.level_target = ((self.section() + 1) * SECTION_SIZE).min(final_level);
        out.section = self.section();
        out.score = self.score();
        out.grade = self.grading().grade;
        out.grade_points = self.grading().grade_points;
        out.mroll_unlocked = self.grading().mroll_unlocked;
        out.timer = self.timer();
        out.lines = self.statistics().lines;
        out.combo = self.simple_combo();
        out.medals = *self.medals();
        out.timings = *self.timings();
    }

    pub fn snapshot(&self, show_ghost: bool, final_level: u32) -> PlayerSnapshot {
        let mut s = PlayerSnapshot::default();
        self.snapshot_into(&mut s, show_ghost, final_level);
        s
    }
}
