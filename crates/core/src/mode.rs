//! Mode configuration - everything that distinguishes one game mode from another
//!
//! A [`ModeConfig`] is plain data: it can be built from a preset or loaded
//! from JSON. Once a [`Game`](crate::game::Game) is created from it the
//! config is read-only.
//!
//! | Preset | Ruleset | Players | Curve | Notes |
//! |--------|---------|---------|-------|-------|
//! | `master` | master | 1 | master | ghost off at 100, level stops |
//! | `20g` | master | 1 | 20G | |
//! | `classic` | classic | 1 | classic | no hold, one preview |
//! | `versus` | classic | 2 | master | garbage on 2+ lines |

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::board::SpawnOffset;
use crate::rng::RandomizerKind;
use crate::ruleset::RulesetId;
use crate::speed::SpeedCurve;
use crate::types::{FLAG_GHOST, FLAG_VERSUS_GARBAGE, MAX_PREVIEWS};

/// Names accepted by [`ModeConfig::preset`].
pub const PRESET_NAMES: [&str; 4] = ["master", "20g", "classic", "versus"];

/// Starting field that replaces the empty board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOverride {
    pub width: u8,
    pub height: u8,
    /// Text rows, bottom-aligned. See [`Board::from_rows`](crate::board::Board::from_rows).
    #[serde(default)]
    pub rows: Vec<String>,
}

/// Session flag change at a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEvent {
    pub level: u32,
    #[serde(default)]
    pub set: u32,
    #[serde(default)]
    pub clear: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub name: String,
    pub ruleset: RulesetId,
    pub randomizer: RandomizerKind,
    pub speed_curve: SpeedCurve,
    pub num_players: u8,
    /// One per player; empty means no offset for anybody.
    pub spawn_offsets: Vec<SpawnOffset>,
    pub starting_level: u32,
    pub final_level: u32,
    pub enable_level_stops: bool,
    pub field: Option<FieldOverride>,
    pub previews: usize,
    pub enable_hold: bool,
    /// `FLAG_*` bits at the start of the game.
    pub initial_flags: u32,
    pub flag_events: Vec<FlagEvent>,
    pub garbage_delay: u32,
    pub music: u32,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self::master()
    }
}

impl ModeConfig {
    pub fn master() -> Self {
        Self {
            name: "master".to_string(),
            ruleset: RulesetId::Master,
            randomizer: RandomizerKind::History,
            speed_curve: SpeedCurve::master(),
            num_players: 1,
            spawn_offsets: vec![SpawnOffset::ZERO],
            starting_level: 0,
            final_level: 999,
            enable_level_stops: true,
            field: None,
            previews: 1,
            enable_hold: true,
            initial_flags: FLAG_GHOST,
            flag_events: vec![FlagEvent {
                level: 100,
                set: 0,
                clear: FLAG_GHOST,
            }],
            garbage_delay: 0,
            music: 0,
        }
    }

    pub fn twenty_g() -> Self {
        Self {
            name: "20g".to_string(),
            speed_curve: SpeedCurve::twenty_g(),
            flag_events: Vec::new(),
            music: 1,
            ..Self::master()
        }
    }

    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            ruleset: RulesetId::Classic,
            speed_curve: SpeedCurve::classic(),
            enable_hold: false,
            ..Self::master()
        }
    }

    pub fn versus() -> Self {
        Self {
            name: "versus".to_string(),
            ruleset: RulesetId::Classic,
            num_players: 2,
            spawn_offsets: vec![SpawnOffset::ZERO; 2],
            enable_level_stops: false,
            previews: 3,
            initial_flags: FLAG_GHOST | FLAG_VERSUS_GARBAGE,
            flag_events: Vec::new(),
            music: 2,
            ..Self::master()
        }
    }

    /// Look up a built-in mode by name (case-insensitive).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "master" => Some(Self::master()),
            "20g" | "twenty_g" => Some(Self::twenty_g()),
            "classic" => Some(Self::classic()),
            "versus" => Some(Self::versus()),
            _ => None,
        }
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let mode: Self = serde_json::from_str(json).context("invalid mode JSON")?;
        mode.validate()?;
        Ok(mode)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read mode file {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("failed to load mode {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.speed_curve
            .validate()
            .with_context(|| format!("mode {:?}", self.name))?;

        if self.starting_level >= self.final_level {
            bail!(
                "starting level {} must be below final level {}",
                self.starting_level,
                self.final_level
            );
        }
        if self.num_players == 0 {
            bail!("mode needs at least one player");
        }
        if !self.spawn_offsets.is_empty() && self.spawn_offsets.len() != self.num_players as usize {
            bail!(
                "{} spawn offsets for {} players",
                self.spawn_offsets.len(),
                self.num_players
            );
        }
        if self.previews > MAX_PREVIEWS {
            bail!("at most {MAX_PREVIEWS} previews are supported, got {}", self.previews);
        }
        if let Some(field) = &self.field {
            if !(4..=64).contains(&field.width) || !(4..=64).contains(&field.height) {
                bail!("field size {}x{} out of range", field.width, field.height);
            }
            if field.rows.len() > field.height as usize {
                bail!("field has {} rows but height {}", field.rows.len(), field.height);
            }
            if let Some(row) = field.rows.iter().find(|r| r.chars().count() > field.width as usize) {
                bail!("field row {row:?} is wider than {}", field.width);
            }
            let is_full = |row: &&String| {
                row.chars()
                    .take(field.width as usize)
                    .filter(|c| !matches!(c, '.' | ' '))
                    .count()
                    == field.width as usize
            };
            if let Some(row) = field.rows.iter().find(is_full) {
                bail!("field row {row:?} is already full");
            }
        }
        Ok(())
    }

    pub fn spawn_offset(&self, player: usize) -> SpawnOffset {
        self.spawn_offsets.get(player).copied().unwrap_or(SpawnOffset::ZERO)
    }

    /// True when `level` is a level stop: the last level of a section or the
    /// one before the final level.
    pub fn is_level_stop(&self, level: u32) -> bool {
        self.enable_level_stops && (level % 100 == 99 || level + 1 == self.final_level)
    }
}
