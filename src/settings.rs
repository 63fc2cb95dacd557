//! Runtime settings of the terminal binary.
//!
//! Settings come from an optional JSON file named by `TGM_SETTINGS`, then
//! environment overrides:
//!
//! - `TGM_MODE`: mode preset name (`master`, `20g`, `classic`, `versus`)
//! - `TGM_MODE_FILE`: path of a mode JSON file, wins over `TGM_MODE`
//! - `TGM_SEED`: randomizer seed (decimal)
//! - `TGM_PLAYERS`: number of players
//! - `TGM_LOG_PATH`: log file (read by `main`, not stored here)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::ModeConfig;
use crate::input::{parse_key, KeyBindings, DEFAULT_KEY_RELEASE_TIMEOUT_MS};
use crate::types::GameAction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub player_name: String,
    /// Fixed seed; a clock-derived one is used when absent.
    pub seed: Option<u32>,
    /// Preset name, see [`ModeConfig::preset`].
    pub mode: String,
    pub mode_file: Option<PathBuf>,
    /// Overrides the mode's player count.
    pub players: Option<u8>,
    /// Action name (`moveLeft`, `rotateCw`, ...) to key names. Listed actions
    /// replace their default keys, the rest keep them.
    pub key_bindings: BTreeMap<String, Vec<String>>,
    pub key_release_timeout_ms: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: "PLAYER".to_string(),
            seed: None,
            mode: "master".to_string(),
            mode_file: None,
            players: None,
            key_bindings: BTreeMap::new(),
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Load from `TGM_SETTINGS` (if set) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match env_var("TGM_SETTINGS") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(env_var)?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("failed to load settings {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid settings JSON")
    }

    /// Apply `TGM_*` overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(mode) = var("TGM_MODE") {
            self.mode = mode;
        }
        if let Some(path) = var("TGM_MODE_FILE") {
            self.mode_file = Some(PathBuf::from(path));
        }
        if let Some(seed) = var("TGM_SEED") {
            let seed = seed
                .parse()
                .with_context(|| format!("TGM_SEED is not a number: {seed:?}"))?;
            self.seed = Some(seed);
        }
        if let Some(players) = var("TGM_PLAYERS") {
            let players = players
                .parse()
                .with_context(|| format!("TGM_PLAYERS is not a number: {players:?}"))?;
            self.players = Some(players);
        }
        Ok(())
    }

    /// Resolve the mode: the mode file if set, otherwise the named preset.
    pub fn mode_config(&self) -> Result<ModeConfig> {
        let mut mode = match &self.mode_file {
            Some(path) => ModeConfig::load(path)?,
            None => match ModeConfig::preset(&self.mode) {
                Some(mode) => mode,
                None => bail!("unknown mode preset {:?}", self.mode),
            },
        };
        if let Some(players) = self.players {
            if players != mode.num_players {
                mode.num_players = players;
                if mode.spawn_offsets.len() != players as usize {
                    mode.spawn_offsets.clear();
                }
            }
        }
        mode.validate()?;
        Ok(mode)
    }

    /// Default bindings with the configured actions rebound.
    pub fn key_bindings(&self) -> Result<KeyBindings> {
        let mut bindings = KeyBindings::default();
        for (name, keys) in &self.key_bindings {
            let Some(action) = GameAction::from_str(name) else {
                bail!("unknown action {name:?} in key bindings");
            };
            bindings.unbind(action);
            for key in keys {
                let Some(code) = parse_key(key) else {
                    bail!("unknown key {key:?} for {name}");
                };
                bindings.bind(code, action);
            }
        }
        Ok(bindings)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
