//! Grading and scoring formulas
//!
//! Scoring (both rulesets):
//!
//! ```text
//! classic = (ceil((level + lines) / 4) + soft) * lines * combo * bravo
//! master  = classic + ceil(level_after / 2) + speed * 7
//! ```
//!
//! where `combo` is the score combo (`combo + 2 * lines - 2`, back to 1 on
//! an empty lock), `bravo` is 4 on an all clear and `speed` is the unused
//! part of the lock delay.
//!
//! Master grading keeps an internal grade (0-31) and grade points. Clears
//! award points; reaching [`GRADE_POINTS_THRESHOLD`] steps the internal grade
//! up and empties the points. While no combo is running the points decay at
//! a per-grade rate.

use crate::types::{ClearKind, Grade};

/// Value `grade_decay_counter` restarts from.
pub const GRADE_DECAY_RESET: u32 = 0;

/// Grade points needed for one internal grade step.
pub const GRADE_POINTS_THRESHOLD: u32 = 100;

/// Highest internal grade.
pub const MAX_INTERNAL_GRADE: u8 = 31;

/// Frames per grade point lost, indexed by internal grade.
pub const DECAY_RATES: [u32; 32] = [
    125, 80, 80, 50, 45, 45, 45, 40, 40, 40, 40, 40, 30, 30, 30, 20, 20, 20, 20, 20, 15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 10, 10,
];

/// Base grade points `[single, double, triple, tetris]` by internal grade.
/// Grades past the end of the table use its last row.
const BASE_POINTS: [[u32; 4]; 11] = [
    [10, 20, 40, 50],
    [10, 20, 30, 40],
    [10, 20, 30, 40],
    [10, 15, 30, 40],
    [10, 15, 20, 40],
    [5, 15, 20, 30],
    [5, 10, 20, 30],
    [5, 10, 15, 30],
    [5, 10, 15, 30],
    [5, 10, 15, 30],
    [2, 12, 13, 30],
];

/// Combo multipliers in tenths `[single, double, triple, tetris]`, combo 1..=10.
const COMBO_MULTIPLIERS: [[u32; 4]; 10] = [
    [10, 10, 10, 10],
    [10, 12, 14, 15],
    [10, 12, 15, 18],
    [10, 14, 16, 20],
    [10, 14, 17, 22],
    [10, 14, 18, 23],
    [10, 14, 19, 24],
    [10, 15, 20, 25],
    [10, 15, 21, 26],
    [10, 20, 25, 30],
];

/// Displayed grade per internal grade.
const DISPLAY_GRADES: [Grade; 32] = [
    Grade::G9,
    Grade::G8,
    Grade::G7,
    Grade::G6,
    Grade::G5,
    Grade::G4,
    Grade::G4,
    Grade::G3,
    Grade::G3,
    Grade::G2,
    Grade::G2,
    Grade::G2,
    Grade::G1,
    Grade::G1,
    Grade::G1,
    Grade::S1,
    Grade::S1,
    Grade::S1,
    Grade::S2,
    Grade::S3,
    Grade::S4,
    Grade::S4,
    Grade::S4,
    Grade::S5,
    Grade::S5,
    Grade::S6,
    Grade::S6,
    Grade::S7,
    Grade::S7,
    Grade::S8,
    Grade::S8,
    Grade::S9,
];

/// Score needed for each displayed grade from 9 up to S9 (classic rules).
pub const SCORE_THRESHOLDS: [u64; 18] = [
    0, 400, 800, 1400, 2000, 3500, 5500, 8000, 12000, 16000, 22000, 30000, 40000, 52000, 66000, 82000, 100000,
    120000,
];

/// Per-player grading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradeState {
    pub grade: Grade,
    pub internal_grade: u8,
    pub grade_points: u32,
    pub grade_decay_counter: u32,
    /// Game timer (frames) of the last grade-up.
    pub grade_up_timestamp: Option<u64>,
    /// Bit `i` is set once checkpoint `i` of the ruleset was passed in time.
    pub checkpoints: u8,
    /// Qualified for the M-roll.
    pub mroll_unlocked: bool,
}

impl GradeState {
    pub fn new() -> Self {
        Self {
            grade: Grade::G9,
            internal_grade: 0,
            grade_points: 0,
            grade_decay_counter: GRADE_DECAY_RESET,
            grade_up_timestamp: None,
            checkpoints: 0,
            mroll_unlocked: false,
        }
    }

    /// Add grade points, stepping the internal grade when the threshold is
    /// reached. Returns true on a step.
    pub fn add_points(&mut self, points: u32) -> bool {
        if points == 0 {
            return false;
        }
        self.grade_points += points;
        self.grade_decay_counter = GRADE_DECAY_RESET;

        if self.grade_points >= GRADE_POINTS_THRESHOLD && self.internal_grade < MAX_INTERNAL_GRADE {
            self.internal_grade += 1;
            self.grade_points = 0;
            return true;
        }
        // Max grade: points stay capped below the threshold.
        self.grade_points = self.grade_points.min(GRADE_POINTS_THRESHOLD - 1);
        false
    }

    /// One frame of decay at `rate` frames per point.
    pub fn tick_decay(&mut self, rate: u32) {
        self.grade_decay_counter += 1;
        if self.grade_decay_counter >= rate.max(1) {
            self.grade_decay_counter = GRADE_DECAY_RESET;
            self.grade_points = self.grade_points.saturating_sub(1);
        }
    }

    pub fn passed_checkpoint(&self, index: u8) -> bool {
        self.checkpoints & (1 << index) != 0
    }

    pub fn mark_checkpoint(&mut self, index: u8) {
        self.checkpoints |= 1 << index;
    }
}

impl Default for GradeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs of the score formula for one clearing lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreInput {
    pub level_before: u32,
    pub level_after: u32,
    pub lines: u32,
    /// Frames the soft drop was held during the placement.
    pub soft_drop_frames: u32,
    /// Score combo after this clear.
    pub combo: u32,
    pub all_clear: bool,
    /// Unused lock delay frames.
    pub speed: u32,
}

pub fn classic_score(input: &ScoreInput) -> u64 {
    if input.lines == 0 {
        return 0;
    }
    let bravo = if input.all_clear { 4 } else { 1 };
    let base = (input.level_before + input.lines).div_ceil(4) + input.soft_drop_frames;
    base as u64 * input.lines as u64 * input.combo.max(1) as u64 * bravo
}

pub fn master_score(input: &ScoreInput) -> u64 {
    if input.lines == 0 {
        return 0;
    }
    classic_score(input) + input.level_after.div_ceil(2) as u64 + input.speed as u64 * 7
}

/// Next score combo after a lock clearing `lines` rows.
pub fn next_score_combo(combo: u32, lines: u32) -> u32 {
    if lines == 0 {
        1
    } else {
        combo.max(1) + 2 * lines - 2
    }
}

/// Grade points for a clear under master rules.
///
/// `base * combo multiplier`, rounded up, times `1 + level / 250`.
pub fn master_grade_points(internal_grade: u8, clear: ClearKind, combo: u32, level: u32) -> u32 {
    let column = match clear {
        ClearKind::None => return 0,
        ClearKind::Single => 0,
        ClearKind::Double => 1,
        ClearKind::Triple => 2,
        ClearKind::Tetris | ClearKind::Pentris => 3,
    };
    let row = (internal_grade as usize).min(BASE_POINTS.len() - 1);
    let base = BASE_POINTS[row][column];

    let combo_row = (combo.clamp(1, COMBO_MULTIPLIERS.len() as u32) - 1) as usize;
    let multiplied = (base * COMBO_MULTIPLIERS[combo_row][column]).div_ceil(10);

    multiplied * (1 + level / 250)
}

pub fn decay_rate(internal_grade: u8) -> u32 {
    DECAY_RATES[(internal_grade as usize).min(DECAY_RATES.len() - 1)]
}

pub fn display_grade(internal_grade: u8) -> Grade {
    DISPLAY_GRADES[(internal_grade as usize).min(DISPLAY_GRADES.len() - 1)]
}

pub fn grade_for_score(score: u64) -> Grade {
    let index = SCORE_THRESHOLDS.iter().rposition(|&t| score >= t).unwrap_or(0);
    Grade::from_index(index).unwrap_or(Grade::G9)
}
