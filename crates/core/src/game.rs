//! Game session - the fixed timestep loop over every player
//!
//! [`Game::frame`] advances the whole session by exactly one frame:
//!
//! 1. nothing happens while paused or once every player is done;
//! 2. garbage staged by earlier frames and now due is raised;
//! 3. players step in index order;
//! 4. garbage sent this frame is staged for the other players;
//! 5. the session rank is updated.
//!
//! Input goes to the focused player and only changes its held buttons; it
//! is consumed on the next frame.

use tracing::{debug, info};

use crate::board::Playfield;
use crate::events::LevelEvents;
use crate::game_state::GameState;
use crate::mode::ModeConfig;
use crate::player::{PlayerState, StepContext};
use crate::rng::SimpleRng;
use crate::ruleset::Ruleset;
use crate::snapshot::SessionSnapshot;
use crate::types::{GameAction, InputEvent, PlayPhase, FLAG_GHOST, FLAG_VERSUS_GARBAGE};

/// Garbage sent by one player, raised for every other player at `due_frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingGarbage {
    pub from: usize,
    pub rows: u8,
    pub due_frame: u64,
}

#[derive(Debug)]
pub struct Game {
    mode: ModeConfig,
    seed: u32,
    ruleset: Box<dyn Ruleset>,
    events: LevelEvents,
    state: GameState,
    players: Vec<PlayerState>,
    frame: u64,
    paused: bool,
    focused_player: usize,
    pending: Vec<PendingGarbage>,
    garbage_rng: SimpleRng,
}

impl Game {
    /// Validate the mode and set up a fresh session.
    pub fn new(mode: ModeConfig, seed: u32) -> anyhow::Result<Self> {
        mode.validate()?;
        Ok(Self::build(mode, seed))
    }

    fn build(mode: ModeConfig, seed: u32) -> Self {
        let ruleset = mode.ruleset.build();
        let events = LevelEvents::from_mode(&mode);
        let mut state = GameState::new(mode.initial_flags, mode.garbage_delay, mode.music);
        let players = (0..mode.num_players as usize)
            .map(|i| PlayerState::new(i, &mode, seed, &events, &mut state))
            .collect();

        info!(
            mode = %mode.name,
            ruleset = mode.ruleset.as_str(),
            players = mode.num_players,
            seed,
            "new game"
        );

        Self {
            seed,
            ruleset,
            events,
            state,
            players,
            frame: 0,
            paused: false,
            focused_player: 0,
            pending: Vec::with_capacity(16),
            garbage_rng: SimpleRng::new(seed ^ 0x9e37_79b9),
            mode,
        }
    }

    /// Start over with the same mode and seed.
    pub fn restart(&mut self) {
        let mode = std::mem::take(&mut self.mode);
        *self = Self::build(mode, self.seed);
    }

    pub fn mode(&self) -> &ModeConfig {
        &self.mode
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn ruleset(&self) -> &dyn Ruleset {
        &*self.ruleset
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, index: usize) -> Option<&PlayerState> {
        self.players.get(index)
    }

    /// Frames simulated so far (paused frames are not counted).
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, "pause");
            self.paused = paused;
        }
    }

    pub fn focused_player(&self) -> usize {
        self.focused_player
    }

    /// Direct input to another player. Returns false for an unknown index.
    pub fn set_focus(&mut self, player: usize) -> bool {
        if player >= self.players.len() {
            return false;
        }
        self.focused_player = player;
        true
    }

    pub fn pending_garbage(&self) -> &[PendingGarbage] {
        &self.pending
    }

    /// True once every player has finished or topped out.
    pub fn is_over(&self) -> bool {
        self.players.iter().all(|p| p.phase().is_terminal())
    }

    /// Feed input to the focused player.
    pub fn input(&mut self, events: &[InputEvent]) {
        self.input_player(self.focused_player, events);
    }

    /// Feed input to `player`. Pause and restart act on the whole session.
    pub fn input_player(&mut self, player: usize, events: &[InputEvent]) {
        for &event in events {
            match event {
                InputEvent::Press(GameAction::Pause) => self.set_paused(!self.paused),
                InputEvent::Press(GameAction::Restart) => self.restart(),
                InputEvent::Release(GameAction::Pause | GameAction::Restart) => {}
                InputEvent::Press(action) => {
                    if let Some(p) = self.players.get_mut(player) {
                        p.press(action);
                    }
                }
                InputEvent::Release(action) => {
                    if let Some(p) = self.players.get_mut(player) {
                        p.release(action);
                    }
                }
            }
        }
    }

    /// Advance the session by one frame.
    pub fn frame(&mut self) {
        if self.paused || self.is_over() {
            return;
        }
        self.frame += 1;
        self.raise_due_garbage();

        let Self {
            mode,
            ruleset,
            events,
            state,
            players,
            pending,
            frame,
            ..
        } = self;
        let versus = players.len() > 1;

        for player in players.iter_mut() {
            let outcome = {
                let mut ctx = StepContext {
                    mode: &*mode,
                    ruleset: &**ruleset,
                    events: &*events,
                    session: &mut *state,
                };
                player.step(&mut ctx)
            };

            if versus && outcome.lines >= 2 && state.has_flag(FLAG_VERSUS_GARBAGE) {
                pending.push(PendingGarbage {
                    from: player.index(),
                    rows: (outcome.lines - 1).min(u8::MAX as u32) as u8,
                    due_frame: *frame + 1 + state.garbage_delay as u64,
                });
            }
        }

        self.update_rank();
    }

    fn raise_due_garbage(&mut self) {
        let mut i = 0;
        while i < self.pending.len() {
            let garbage = self.pending[i];
            // Rows pending a clear must not move under the player.
            let busy = self
                .players
                .iter()
                .any(|p| p.index() != garbage.from && p.phase() == PlayPhase::LineClear);
            if garbage.due_frame > self.frame || busy {
                i += 1;
                continue;
            }

            let width = self.players.first().map_or(1, |p| p.board().width() as u32);
            let hole = self.garbage_rng.next_range(width) as u8;
            for player in self.players.iter_mut().filter(|p| p.index() != garbage.from) {
                player.receive_garbage(garbage.rows, hole);
            }
            debug!(from = garbage.from, rows = garbage.rows, hole, "garbage raised");
            self.pending.remove(i);
        }
    }

    fn update_rank(&mut self) {
        let start = self.mode.starting_level;
        let span = self.mode.final_level.saturating_sub(start);
        let lead = self.players.iter().map(|p| p.level()).max().unwrap_or(start);
        self.state.rank = if span == 0 {
            1.0
        } else {
            (lead.saturating_sub(start)) as f32 / span as f32
        };
    }

    pub fn snapshot_into(&self, out: &mut SessionSnapshot) {
        out.frame = self.frame;
        out.paused = self.paused;
        out.state_flags = self.state.state_flags;
        out.rank = self.state.rank;
        out.music = self.state.music;
        out.focused_player = self.focused_player;

        let show_ghost = self.state.has_flag(FLAG_GHOST);
        out.players.truncate(self.players.len());
        while out.players.len() < self.players.len() {
            out.players.push(Default::default());
        }
        for (player, snap) in self.players.iter().zip(out.players.iter_mut()) {
            player.snapshot_into(snap, show_ghost, self.mode.final_level);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut s = SessionSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}
