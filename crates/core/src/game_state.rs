//! Session-wide state shared by every player of a game.

use crate::types::FLAG_GHOST;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameState {
    /// `FLAG_*` bits.
    pub state_flags: u32,
    /// Extra frames before staged garbage is raised.
    pub garbage_delay: u32,
    /// Progress of the leading player through the mode, 0.0 to 1.0.
    pub rank: f32,
    /// Music cue selected by the mode.
    pub music: u32,
}

impl GameState {
    pub fn new(state_flags: u32, garbage_delay: u32, music: u32) -> Self {
        Self {
            state_flags,
            garbage_delay,
            rank: 0.0,
            music,
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.state_flags & flag != 0
    }

    pub fn apply_flags(&mut self, set: u32, clear: u32) {
        self.state_flags = (self.state_flags | set) & !clear;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(FLAG_GHOST, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FLAG_VERSUS_GARBAGE;

    #[test]
    fn apply_flags_sets_then_clears() {
        let mut state = GameState::default();
        assert!(state.has_flag(FLAG_GHOST));

        state.apply_flags(FLAG_VERSUS_GARBAGE, FLAG_GHOST);
        assert!(!state.has_flag(FLAG_GHOST));
        assert!(state.has_flag(FLAG_VERSUS_GARBAGE));
    }
}
