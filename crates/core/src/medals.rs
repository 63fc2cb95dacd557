//! Medal evaluation
//!
//! [`evaluate`] is a pure function of a player's statistics: it never lowers
//! a tier, and the timestamp of a medal is the frame it was first awarded.
//!
//! | Medal | Measures | Bronze | Silver | Gold | Platinum |
//! |-------|----------|--------|--------|------|----------|
//! | ST | best completed section (frames) | 4500 | 3900 | 3300 | |
//! | SK | tetrises | 10 | 20 | 35 | |
//! | CO | longest combo | 4 | 5 | 7 | |
//! | AC | all clears | 1 | 2 | 3 | 4 |
//! | RE | recoveries | 1 | 2 | 3 | 4 |
//! | RO | rotations per piece (100+ pieces) | 1.2 | 1.4 | 1.7 | |

use crate::types::{MedalKind, MedalTier};

/// Cells that must be filled before a recovery can start.
pub const RECOVERY_HIGH_CELLS: usize = 150;

/// Filled cells at or below which a started recovery completes.
pub const RECOVERY_LOW_CELLS: usize = 70;

/// Pieces placed before the rotation medal is judged.
pub const ROTATION_MIN_PIECES: u32 = 100;

const ST_FRAMES: [u64; 3] = [4500, 3900, 3300];
const SK_TETRISES: [u32; 3] = [10, 20, 35];
const CO_COMBO: [u32; 3] = [4, 5, 7];
const AC_CLEARS: [u32; 4] = [1, 2, 3, 4];
const RE_RECOVERIES: [u32; 4] = [1, 2, 3, 4];
/// Rotations per piece, in tenths.
const RO_TENTHS: [u32; 3] = [12, 14, 17];

const TIERS: [MedalTier; 4] = [MedalTier::Bronze, MedalTier::Silver, MedalTier::Gold, MedalTier::Platinum];

/// Statistics the medals are judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MedalInputs {
    pub best_section_time: Option<u64>,
    pub tetrises: u32,
    pub max_combo: u32,
    pub all_clears: u32,
    pub recoveries: u32,
    pub pieces: u32,
    pub rotations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Medal {
    pub tier: MedalTier,
    /// Frame of the first award.
    pub awarded_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Medals {
    medals: [Medal; 6],
}

impl Medals {
    pub fn get(&self, kind: MedalKind) -> Medal {
        self.medals[kind.index()]
    }

    pub fn tier(&self, kind: MedalKind) -> MedalTier {
        self.get(kind).tier
    }

    pub fn iter(&self) -> impl Iterator<Item = (MedalKind, Medal)> + '_ {
        MedalKind::ALL.iter().map(move |&k| (k, self.get(k)))
    }
}

/// Highest tier whose threshold `value` reaches.
fn tier_at_least(value: u32, thresholds: &[u32]) -> MedalTier {
    thresholds
        .iter()
        .rposition(|&t| value >= t)
        .map_or(MedalTier::None, |i| TIERS[i])
}

fn tier_for(kind: MedalKind, inputs: &MedalInputs) -> MedalTier {
    match kind {
        MedalKind::St => match inputs.best_section_time {
            Some(time) => ST_FRAMES
                .iter()
                .rposition(|&t| time <= t)
                .map_or(MedalTier::None, |i| TIERS[i]),
            None => MedalTier::None,
        },
        MedalKind::Sk => tier_at_least(inputs.tetrises, &SK_TETRISES),
        MedalKind::Co => tier_at_least(inputs.max_combo, &CO_COMBO),
        MedalKind::Ac => tier_at_least(inputs.all_clears, &AC_CLEARS),
        MedalKind::Re => tier_at_least(inputs.recoveries, &RE_RECOVERIES),
        MedalKind::Ro => {
            if inputs.pieces < ROTATION_MIN_PIECES {
                return MedalTier::None;
            }
            let ratio_tenths = inputs.rotations.saturating_mul(10) / inputs.pieces;
            tier_at_least(ratio_tenths, &RO_TENTHS)
        }
    }
}

/// Medals after looking at `inputs` on `frame`.
pub fn evaluate(inputs: &MedalInputs, current: &Medals, frame: u64) -> Medals {
    let mut next = *current;
    for kind in MedalKind::ALL {
        let medal = &mut next.medals[kind.index()];
        let tier = tier_for(kind, inputs);
        if tier > medal.tier {
            medal.tier = tier;
            if medal.awarded_at.is_none() {
                medal.awarded_at = Some(frame);
            }
        }
    }
    next
}
