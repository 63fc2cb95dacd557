//! Rulesets - the grading and scoring policy of a mode
//!
//! The simulation loop never branches on the mode; everything that differs
//! between the master and classic rules goes through [`Ruleset`], picked
//! once when the game is created.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grading::{
    classic_score, decay_rate, display_grade, grade_for_score, master_grade_points, master_score, GradeState,
    ScoreInput,
};
use crate::types::{ClearKind, Grade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesetId {
    #[default]
    Master,
    Classic,
}

impl RulesetId {
    pub fn build(self) -> Box<dyn Ruleset> {
        match self {
            RulesetId::Master => Box::new(MasterRuleset),
            RulesetId::Classic => Box::new(ClassicRuleset),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RulesetId::Master => "master",
            RulesetId::Classic => "classic",
        }
    }
}

/// A time (and grade/score) requirement checked when a level is first reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub level: u32,
    pub max_frames: u64,
    pub min_grade: Grade,
    pub min_score: u64,
}

pub trait Ruleset: fmt::Debug {
    fn id(&self) -> RulesetId;

    /// Levels gained by a lock clearing `lines` rows.
    fn level_increment(&self, lines: u32) -> u32 {
        lines
    }

    fn score(&self, input: &ScoreInput) -> u64;

    /// Award grade points for a clear. Returns true when the internal grade
    /// stepped up.
    fn award_grade_points(&self, _grading: &mut GradeState, _clear: ClearKind, _combo: u32, _level: u32) -> bool {
        false
    }

    /// Frames per decayed grade point, `None` when points never decay.
    fn decay_rate(&self, _internal_grade: u8) -> Option<u32> {
        None
    }

    fn display_grade(&self, grading: &GradeState, score: u64) -> Grade;

    fn checkpoints(&self) -> &[Checkpoint];

    /// Check every checkpoint crossed going from `old` to `new`.
    fn reach_level(&self, grading: &mut GradeState, old: u32, new: u32, timer: u64, score: u64) {
        let grade = self.display_grade(grading, score);
        let checkpoints = self.checkpoints();
        for (i, cp) in checkpoints.iter().enumerate() {
            if old < cp.level
                && cp.level <= new
                && timer <= cp.max_frames
                && grade >= cp.min_grade
                && score >= cp.min_score
            {
                grading.mark_checkpoint(i as u8);
            }
        }
        let all = (1u16 << checkpoints.len()) - 1;
        grading.mroll_unlocked = !checkpoints.is_empty() && grading.checkpoints as u16 & all == all;
    }

    /// Grade shown once the final level is reached.
    fn final_grade(&self, grading: &GradeState, score: u64) -> Grade {
        if grading.mroll_unlocked {
            Grade::GM
        } else {
            self.display_grade(grading, score)
        }
    }
}

/// Internal grades with decay, M-roll checkpoints at 500 and 999.
#[derive(Debug, Clone, Copy, Default)]
pub struct MasterRuleset;

const MASTER_CHECKPOINTS: [Checkpoint; 2] = [
    Checkpoint {
        level: 500,
        max_frames: 7 * 60 * 60,
        min_grade: Grade::G1,
        min_score: 0,
    },
    Checkpoint {
        level: 999,
        max_frames: (13 * 60 + 30) * 60,
        min_grade: Grade::S9,
        min_score: 0,
    },
];

impl Ruleset for MasterRuleset {
    fn id(&self) -> RulesetId {
        RulesetId::Master
    }

    fn score(&self, input: &ScoreInput) -> u64 {
        master_score(input)
    }

    fn award_grade_points(&self, grading: &mut GradeState, clear: ClearKind, combo: u32, level: u32) -> bool {
        let points = master_grade_points(grading.internal_grade, clear, combo, level);
        grading.add_points(points)
    }

    fn decay_rate(&self, internal_grade: u8) -> Option<u32> {
        Some(decay_rate(internal_grade))
    }

    fn display_grade(&self, grading: &GradeState, _score: u64) -> Grade {
        display_grade(grading.internal_grade)
    }

    fn checkpoints(&self) -> &[Checkpoint] {
        &MASTER_CHECKPOINTS
    }
}

/// Score-threshold grades, GM for meeting the 300/500/999 requirements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicRuleset;

const CLASSIC_CHECKPOINTS: [Checkpoint; 3] = [
    Checkpoint {
        level: 300,
        max_frames: (4 * 60 + 15) * 60,
        min_grade: Grade::G9,
        min_score: 12_000,
    },
    Checkpoint {
        level: 500,
        max_frames: (7 * 60 + 30) * 60,
        min_grade: Grade::G9,
        min_score: 40_000,
    },
    Checkpoint {
        level: 999,
        max_frames: (13 * 60 + 30) * 60,
        min_grade: Grade::G9,
        min_score: 126_000,
    },
];

impl Ruleset for ClassicRuleset {
    fn id(&self) -> RulesetId {
        RulesetId::Classic
    }

    fn score(&self, input: &ScoreInput) -> u64 {
        classic_score(input)
    }

    fn display_grade(&self, _grading: &GradeState, score: u64) -> Grade {
        grade_for_score(score)
    }

    fn checkpoints(&self) -> &[Checkpoint] {
        &CLASSIC_CHECKPOINTS
    }
}
