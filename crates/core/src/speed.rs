//! Speed curves - per-level gravity and delays
//!
//! A [`SpeedCurve`] is a list of steps sorted by level. The timings for a
//! level are those of the greatest step whose level is `<=` it. Below the
//! first step there are no timings at all.
//!
//! Gravity is in 1/256 G: `256` moves the piece one row per frame and
//! [`GRAVITY_20G`] drops it to the floor.
//!
//! | Level | ARE | Line ARE | DAS | Lock | Line clear |
//! |-------|-----|----------|-----|------|------------|
//! | 0     | 25  | 25       | 14  | 30   | 40         |
//! | 500   | 25  | 25       | 8   | 30   | 25         |
//! | 600   | 25  | 16       | 8   | 30   | 16         |
//! | 700   | 16  | 12       | 8   | 30   | 12         |
//! | 800   | 12  | 6        | 8   | 30   | 6          |
//! | 900   | 12  | 6        | 6   | 17   | 6          |
//!
//! (master curve delays)

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::types::GRAVITY_20G;

/// Gravity and delays in effect at a level. Every delay is in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameTimings {
    /// Rows per frame in 1/256 units.
    pub gravity: u32,
    /// Spawn delay after a lock without clears.
    pub are: u32,
    /// Spawn delay after a line clear.
    pub line_are: u32,
    pub das: u32,
    pub lock_delay: u32,
    pub line_clear: u32,
}

impl FrameTimings {
    pub const fn new(gravity: u32, are: u32, line_are: u32, das: u32, lock_delay: u32, line_clear: u32) -> Self {
        Self {
            gravity,
            are,
            line_are,
            das,
            lock_delay,
            line_clear,
        }
    }

    pub fn is_20g(&self) -> bool {
        self.gravity >= GRAVITY_20G
    }
}

impl Default for FrameTimings {
    fn default() -> Self {
        MASTER_DELAYS[0].1.with_gravity(MASTER_GRAVITY[0].1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeedStep {
    pub level: u32,
    pub timings: FrameTimings,
}

/// Level -> timings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedCurve {
    steps: Vec<SpeedStep>,
}

impl SpeedCurve {
    /// Build a curve, sorting the steps by level (stable).
    pub fn new(mut steps: Vec<SpeedStep>) -> Self {
        steps.sort_by_key(|s| s.level);
        Self { steps }
    }

    /// Timings of the greatest step `<= level`, `None` below the first step.
    pub fn timings_for_level(&self, level: u32) -> Option<FrameTimings> {
        match self.steps.binary_search_by_key(&level, |s| s.level) {
            Ok(i) => Some(self.steps[i].timings),
            Err(0) => None,
            Err(i) => Some(self.steps[i - 1].timings),
        }
    }

    pub fn steps(&self) -> &[SpeedStep] {
        &self.steps
    }

    pub fn first_level(&self) -> Option<u32> {
        self.steps.first().map(|s| s.level)
    }

    /// Reject curves the binary search cannot handle.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.steps.is_empty() {
            bail!("speed curve is empty");
        }
        for pair in self.steps.windows(2) {
            if pair[0].level >= pair[1].level {
                bail!(
                    "speed curve levels must be strictly ascending ({} then {})",
                    pair[0].level,
                    pair[1].level
                );
            }
        }
        Ok(())
    }

    /// Arcade master curve: gravity ramps up to 20G at level 500, delays
    /// shorten every section after that.
    pub fn master() -> Self {
        Self::merge(MASTER_GRAVITY, MASTER_DELAYS)
    }

    /// First generation curve: same gravity, slower fixed delays.
    pub fn classic() -> Self {
        Self::merge(MASTER_GRAVITY, CLASSIC_DELAYS)
    }

    /// 20G from the first piece with the master delays.
    pub fn twenty_g() -> Self {
        Self::merge(&[(0, GRAVITY_20G)], MASTER_DELAYS)
    }

    /// Combine a gravity table and a delay table into one curve with a step
    /// at every level where either of them changes.
    fn merge(gravity: &[(u32, u32)], delays: &[(u32, Delays)]) -> Self {
        let mut levels: Vec<u32> = gravity.iter().map(|g| g.0).chain(delays.iter().map(|d| d.0)).collect();
        levels.sort_unstable();
        levels.dedup();

        let steps = levels
            .into_iter()
            .filter_map(|level| {
                let g = floor_lookup(gravity, level)?;
                let d = floor_lookup(delays, level)?;
                Some(SpeedStep {
                    level,
                    timings: d.with_gravity(g),
                })
            })
            .collect();
        Self { steps }
    }
}

fn floor_lookup<T: Copy>(table: &[(u32, T)], level: u32) -> Option<T> {
    table.iter().rev().find(|(l, _)| *l <= level).map(|(_, v)| *v)
}

#[derive(Debug, Clone, Copy)]
struct Delays {
    are: u32,
    line_are: u32,
    das: u32,
    lock_delay: u32,
    line_clear: u32,
}

impl Delays {
    const fn new(are: u32, line_are: u32, das: u32, lock_delay: u32, line_clear: u32) -> Self {
        Self {
            are,
            line_are,
            das,
            lock_delay,
            line_clear,
        }
    }

    const fn with_gravity(self, gravity: u32) -> FrameTimings {
        FrameTimings::new(
            gravity,
            self.are,
            self.line_are,
            self.das,
            self.lock_delay,
            self.line_clear,
        )
    }
}

const MASTER_GRAVITY: &[(u32, u32)] = &[
    (0, 4),
    (30, 6),
    (35, 8),
    (40, 10),
    (50, 12),
    (60, 16),
    (70, 32),
    (80, 48),
    (90, 64),
    (100, 80),
    (120, 96),
    (140, 112),
    (160, 128),
    (170, 144),
    (200, 4),
    (220, 32),
    (230, 64),
    (233, 96),
    (236, 128),
    (239, 160),
    (243, 192),
    (247, 224),
    (251, 256),
    (300, 512),
    (330, 768),
    (360, 1024),
    (400, 1280),
    (420, 1024),
    (450, 768),
    (500, GRAVITY_20G),
];

const MASTER_DELAYS: &[(u32, Delays)] = &[
    (0, Delays::new(25, 25, 14, 30, 40)),
    (500, Delays::new(25, 25, 8, 30, 25)),
    (600, Delays::new(25, 16, 8, 30, 16)),
    (700, Delays::new(16, 12, 8, 30, 12)),
    (800, Delays::new(12, 6, 8, 30, 6)),
    (900, Delays::new(12, 6, 6, 17, 6)),
];

const CLASSIC_DELAYS: &[(u32, Delays)] = &[(0, Delays::new(30, 30, 16, 30, 41))];
