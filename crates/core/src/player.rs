//! Player simulation state - one board and its piece cycle
//!
//! # Phases
//!
//! ```text
//! Spawning --ARE--> Falling <--> Locking --lock--> LineClear --delay--> Spawning
//!                                         \--no clear--------------> Spawning
//! any --block out--> GameOver      any --final level--> Finished
//! ```
//!
//! [`PlayerState::step`] runs one frame in a fixed order: input, gravity and
//! counters, lock resolution, timings and level events, spawn, then grade
//! decay and medals. Rule violations (hold twice, moving into the stack) are
//! silent no-ops; a blocked spawn ends the game for this player only.

use tracing::{debug, info, warn};

use crate::board::{Board, Playfield, SpawnOffset};
use crate::counters::FrameCounters;
use crate::events::{EventCursor, LevelEvents};
use crate::game_state::GameState;
use crate::grading::{next_score_combo, GradeState, ScoreInput};
use crate::medals::{self, MedalInputs, Medals, RECOVERY_HIGH_CELLS, RECOVERY_LOW_CELLS};
use crate::mode::ModeConfig;
use crate::pieces::{ActivePiece, MinoStyle};
use crate::rng::{PieceRandomizer, Randomizer};
use crate::ruleset::Ruleset;
use crate::speed::FrameTimings;
use crate::stats::{SectionRecord, Statistics};
use crate::types::{
    ButtonSet, ClearKind, GameAction, MedalKind, PieceKind, PlayPhase, COOL_CHECK_OFFSET, GRAVITY_DENOMINATOR,
    HOLD_FLASH_FRAMES, POST_LOCK_FLASH_FRAMES, SECTION_SIZE,
};

/// Pieces realized up front so the sequence does not grow during play.
const SEQUENCE_CAPACITY: usize = 4096;

/// Data about the current placement, reset on every spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Frames the soft drop was held.
    pub soft_drop_frames: u32,
    /// Rows covered by the last sonic drop.
    pub sonic_drop_height: u32,
    /// Frames the piece has been in play.
    pub active_time: u32,
    /// Unused lock delay when the piece locked.
    pub speed: u32,
    /// Frames spent at a level stop.
    pub level_stop_frames: u32,
    /// Hold was used for this placement.
    pub lock_held: bool,
    /// Levels gained from the last lock.
    pub level_increment: u32,
    pub last_clear: ClearKind,
}

/// Shared, read-only context of a player step.
pub struct StepContext<'a> {
    pub mode: &'a ModeConfig,
    pub ruleset: &'a dyn Ruleset,
    pub events: &'a LevelEvents,
    pub session: &'a mut GameState,
}

/// What happened to a player during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    pub locked: bool,
    pub lines: u32,
}

/// Result of committing the active piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockResult {
    pub lines: u32,
    pub all_clear: bool,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    index: usize,
    board: Board,
    active: Option<ActivePiece>,
    hold: Option<PieceKind>,
    phase: PlayPhase,
    timings: FrameTimings,
    counters: FrameCounters,
    randomizer: PieceRandomizer,
    mino_sequence: Vec<PieceKind>,
    mino_seq_index: usize,
    previews: usize,
    spawn_offset: SpawnOffset,
    grading: GradeState,
    level: u32,
    score: u64,
    statistics: Statistics,
    placement: Placement,
    score_combo: u32,
    simple_combo: u32,
    medals: Medals,
    /// Frames played, stops at game over or completion.
    timer: u64,
    /// Sub-row gravity progress in 1/256 units.
    gravity_acc: u32,
    das_dir: i8,
    held: ButtonSet,
    pressed: ButtonSet,
    cursor: EventCursor,
    synced_level: u32,
    timings_gap_reported: bool,
    recovery_armed: bool,
}

impl PlayerState {
    /// Create a player and run the level events up to the starting level.
    pub fn new(index: usize, mode: &ModeConfig, seed: u32, events: &LevelEvents, session: &mut GameState) -> Self {
        let board = match &mode.field {
            Some(field) => Board::from_rows(field.width, field.height, &field.rows),
            None => Board::new(),
        };

        let mut timings_gap_reported = false;
        let timings = match mode.speed_curve.timings_for_level(mode.starting_level) {
            Some(t) => t,
            None => {
                warn!(
                    player = index,
                    level = mode.starting_level,
                    "starting level is below the speed curve, using default timings"
                );
                timings_gap_reported = true;
                FrameTimings::default()
            }
        };

        let mut player = Self {
            index,
            board,
            active: None,
            hold: None,
            phase: PlayPhase::Spawning,
            timings,
            counters: FrameCounters::new(&timings),
            randomizer: mode.randomizer.build(seed),
            mino_sequence: Vec::with_capacity(SEQUENCE_CAPACITY),
            mino_seq_index: 0,
            previews: mode.previews,
            spawn_offset: mode.spawn_offset(index),
            grading: GradeState::new(),
            level: mode.starting_level,
            score: 0,
            statistics: Statistics::new(mode.starting_level),
            placement: Placement::default(),
            score_combo: 1,
            simple_combo: 0,
            medals: Medals::default(),
            timer: 0,
            gravity_acc: 0,
            das_dir: 0,
            held: ButtonSet::EMPTY,
            pressed: ButtonSet::EMPTY,
            cursor: EventCursor::new(),
            synced_level: mode.starting_level,
            timings_gap_reported,
            recovery_armed: false,
        };
        player.fill_sequence();
        player
            .cursor
            .advance(events, player.level, session, &mut player.timings);
        player
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn active(&self) -> Option<ActivePiece> {
        self.active
    }

    /// Where the active piece would land, drawn as an outline.
    pub fn ghost(&self) -> Option<ActivePiece> {
        let piece = self.active?;
        let ghost = piece.shifted(0, self.board.drop_distance(&piece));
        Some(ActivePiece {
            style: MinoStyle::Ghost,
            ..ghost
        })
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    pub fn phase(&self) -> PlayPhase {
        self.phase
    }

    pub fn timings(&self) -> &FrameTimings {
        &self.timings
    }

    pub fn counters(&self) -> &FrameCounters {
        &self.counters
    }

    /// Upcoming pieces, next first.
    pub fn previews(&self) -> &[PieceKind] {
        let end = self.mino_seq_index + self.previews;
        self.mino_sequence.get(self.mino_seq_index..end).unwrap_or(&[])
    }

    pub fn mino_sequence(&self) -> &[PieceKind] {
        &self.mino_sequence
    }

    pub fn mino_seq_index(&self) -> usize {
        self.mino_seq_index
    }

    pub fn grading(&self) -> &GradeState {
        &self.grading
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn section(&self) -> u32 {
        self.level / SECTION_SIZE
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn score_combo(&self) -> u32 {
        self.score_combo
    }

    pub fn simple_combo(&self) -> u32 {
        self.simple_combo
    }

    pub fn medals(&self) -> &Medals {
        &self.medals
    }

    pub fn timer(&self) -> u64 {
        self.timer
    }

    pub fn held(&self) -> ButtonSet {
        self.held
    }

    pub fn press(&mut self, action: GameAction) {
        if !self.held.contains(action) {
            self.pressed.insert(action);
        }
        self.held.insert(action);
    }

    pub fn release(&mut self, action: GameAction) {
        self.held.remove(action);
    }

    /// Run one simulated frame.
    pub fn step(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.phase.is_terminal() {
            self.pressed.clear();
            return outcome;
        }

        self.timer += 1;
        self.counters.tick_flashes();
        if ctx.mode.is_level_stop(self.level) {
            self.placement.level_stop_frames += 1;
            if let Some(section) = self.statistics.current_section_mut() {
                section.level_stop_time += 1;
            }
        }

        // 1. Input.
        let das_shift = self.das_shift();
        if self.phase.has_active_piece() {
            if self.pressed.contains(GameAction::Hold) {
                self.hold(ctx.mode);
            }
            if self.pressed.contains(GameAction::RotateCcw) {
                self.rotate(false);
            }
            if self.pressed.contains(GameAction::RotateCw) {
                self.rotate(true);
            }
            if das_shift != 0 {
                self.shift(das_shift);
            }
            if self.pressed.contains(GameAction::SonicDrop) {
                self.sonic_drop();
            }
        }

        // 2. Gravity, counters and phase transitions.
        let mut lock = None;
        match self.phase {
            PlayPhase::Falling | PlayPhase::Locking => {
                self.placement.active_time += 1;
                if self.soft_drop(self.held.contains(GameAction::SoftDrop)) {
                    lock = self.lock();
                }
            }
            PlayPhase::LineClear => {
                if self.counters.line_clear.tick() {
                    self.board.collapse_cleared_rows();
                    self.enter_spawning(self.timings.line_are);
                }
            }
            PlayPhase::Spawning => {
                self.counters.are.tick();
            }
            PlayPhase::GameOver | PlayPhase::Finished => {}
        }

        // 3. Lock resolution.
        if let Some(result) = lock {
            self.resolve_lock(result, ctx.mode, ctx.ruleset);
            outcome.locked = true;
            outcome.lines = result.lines;
        }

        // 4-5. Timings and level events.
        self.sync_level(ctx);

        // 6. Spawn.
        if self.phase == PlayPhase::Spawning && self.counters.are.is_expired() && self.spawn(ctx.mode, ctx.ruleset) {
            self.sync_level(ctx);
        }

        // 7. Grade decay and medals.
        if self.phase.has_active_piece() && self.simple_combo == 0 {
            if let Some(rate) = ctx.ruleset.decay_rate(self.grading.internal_grade) {
                self.grading.tick_decay(rate);
            }
        }
        self.evaluate_medals();

        self.pressed.clear();
        outcome
    }

    /// Draw the next piece and put it in play. Returns false on block out.
    pub fn spawn(&mut self, mode: &ModeConfig, ruleset: &dyn Ruleset) -> bool {
        if self.phase.is_terminal() {
            return false;
        }

        let kind = self.next_from_sequence();
        let mut piece = match self.board.spawn_piece(kind, self.spawn_offset) {
            Ok(piece) => piece,
            Err(collision) => {
                debug!(player = self.index, kind = ?collision.kind, "spawn blocked");
                self.game_over();
                return false;
            }
        };

        // Initial rotation.
        for (action, clockwise) in [(GameAction::RotateCcw, false), (GameAction::RotateCw, true)] {
            if self.held.contains(action) {
                if let Some(rotated) = self.board.rotate(&piece, clockwise) {
                    piece = rotated;
                    self.statistics.rotations += 1;
                    break;
                }
            }
        }

        let first = self.statistics.pieces == 0;
        self.statistics.pieces += 1;
        self.placement = Placement::default();
        self.put_in_play(piece);

        if !first && !mode.is_level_stop(self.level) {
            self.set_level(self.level + 1, mode, ruleset);
        }
        true
    }

    /// Move the active piece sideways.
    pub fn shift(&mut self, dx: i8) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        if !self.board.test_move(&piece, dx, 0) {
            return false;
        }
        self.active = Some(piece.shifted(dx, 0));
        self.update_grounded_phase();
        true
    }

    pub fn rotate(&mut self, clockwise: bool) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let Some(rotated) = self.board.rotate(&piece, clockwise) else {
            return false;
        };
        self.active = Some(rotated);
        self.statistics.rotations += 1;
        self.update_grounded_phase();
        true
    }

    /// Apply this frame's gravity, at least 1G while `soft` is held.
    ///
    /// Returns true when the piece must lock now: its lock delay ran out, or
    /// soft drop was held while it rests on the stack.
    pub fn soft_drop(&mut self, soft: bool) -> bool {
        let Some(mut piece) = self.active else {
            return false;
        };

        let mut gravity = self.timings.gravity;
        if soft {
            self.placement.soft_drop_frames += 1;
            gravity = gravity.max(GRAVITY_DENOMINATOR);
        }

        let rows = if self.timings.is_20g() {
            self.gravity_acc = 0;
            self.board.drop_distance(&piece)
        } else {
            self.gravity_acc += gravity;
            let rows = self.gravity_acc / GRAVITY_DENOMINATOR;
            self.gravity_acc %= GRAVITY_DENOMINATOR;
            rows.min(i8::MAX as u32) as i8
        };

        let mut moved = false;
        for _ in 0..rows {
            if !self.board.test_move(&piece, 0, 1) {
                break;
            }
            piece = piece.shifted(0, 1);
            moved = true;
        }
        self.active = Some(piece);
        if moved {
            self.counters.lock.start(self.timings.lock_delay);
        }

        if self.board.is_grounded(&piece) {
            self.gravity_acc = 0;
            self.set_phase(PlayPhase::Locking);
            // The lock delay keeps running under soft drop too.
            let expired = self.counters.lock.tick();
            soft || expired
        } else {
            self.set_phase(PlayPhase::Falling);
            false
        }
    }

    /// Drop to the floor without locking.
    pub fn sonic_drop(&mut self) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let distance = self.board.drop_distance(&piece);
        if distance == 0 {
            return false;
        }
        self.active = Some(piece.shifted(0, distance));
        self.placement.sonic_drop_height = distance as u32;
        self.gravity_acc = 0;
        self.counters.lock.start(self.timings.lock_delay);
        self.set_phase(PlayPhase::Locking);
        true
    }

    /// Swap the active piece with the hold slot, once per placement.
    pub fn hold(&mut self, mode: &ModeConfig) -> bool {
        if !mode.enable_hold || self.placement.lock_held {
            return false;
        }
        let Some(current) = self.active else {
            return false;
        };

        let incoming = match self.hold.replace(current.kind) {
            Some(kind) => kind,
            None => self.next_from_sequence(),
        };
        self.placement.lock_held = true;
        self.counters.hold_flash.start(HOLD_FLASH_FRAMES);

        match self.board.spawn_piece(incoming, self.spawn_offset) {
            Ok(piece) => self.put_in_play(piece),
            Err(_) => {
                debug!(player = self.index, kind = ?incoming, "hold swap blocked");
                self.game_over();
            }
        }
        true
    }

    /// Commit the active piece to the board.
    pub fn lock(&mut self) -> Option<LockResult> {
        let piece = self.active.take()?;
        let cleared = self.board.commit(&piece);
        let lines = cleared.len() as u32;
        let all_clear = lines > 0 && self.board.filled_cells() == lines as usize * self.board.width() as usize;

        self.counters.post_lock.start(POST_LOCK_FLASH_FRAMES);
        if lines > 0 {
            self.counters.line_clear.start(self.timings.line_clear);
            self.set_phase(PlayPhase::LineClear);
        } else {
            self.enter_spawning(self.timings.are);
        }
        Some(LockResult { lines, all_clear })
    }

    /// Update statistics, combos, score, grade and level after a lock.
    pub fn resolve_lock(&mut self, result: LockResult, mode: &ModeConfig, ruleset: &dyn Ruleset) {
        let clear = ClearKind::from_lines(result.lines as usize);
        self.placement.last_clear = clear;
        self.placement.speed = self.timings.lock_delay.saturating_sub(self.placement.active_time);

        // Measured before the level changes: finishing collapses the rows.
        let width = self.board.width() as usize;
        let filled = self
            .board
            .filled_cells()
            .saturating_sub(self.board.pending_clear().len() * width);

        if clear.is_clear() {
            self.statistics.record_clear(clear, result.all_clear);
            self.simple_combo += 1;
            self.statistics.max_combo = self.statistics.max_combo.max(self.simple_combo);
            self.score_combo = next_score_combo(self.score_combo, result.lines);

            let level_before = self.level;
            let level_after = (self.level + ruleset.level_increment(result.lines)).min(mode.final_level);
            self.placement.level_increment = level_after - level_before;

            self.score += ruleset.score(&ScoreInput {
                level_before,
                level_after,
                lines: result.lines,
                soft_drop_frames: self.placement.soft_drop_frames,
                combo: self.score_combo,
                all_clear: result.all_clear,
                speed: self.placement.speed,
            });

            if ruleset.award_grade_points(&mut self.grading, clear, self.simple_combo, level_before) {
                self.grading.grade_up_timestamp = Some(self.timer);
                info!(
                    player = self.index,
                    internal_grade = self.grading.internal_grade,
                    frame = self.timer,
                    "grade up"
                );
            }
            self.grading.grade = ruleset.display_grade(&self.grading, self.score);
            self.set_level(level_after, mode, ruleset);
        } else {
            self.simple_combo = 0;
            self.score_combo = 1;
            self.grading.grade = ruleset.display_grade(&self.grading, self.score);
        }

        if filled >= RECOVERY_HIGH_CELLS {
            self.recovery_armed = true;
        } else if self.recovery_armed && filled <= RECOVERY_LOW_CELLS {
            self.recovery_armed = false;
            self.statistics.recoveries += 1;
        }
    }

    /// Push garbage rows in from the bottom. Returns false if it topped the
    /// player out.
    pub fn receive_garbage(&mut self, rows: u8, hole_x: u8) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        let mut ok = self.board.raise_garbage(rows, hole_x);
        if let Some(piece) = self.active {
            if !self.board.fits(&piece) {
                let lifted = (1..=rows as i8)
                    .map(|up| piece.shifted(0, -up))
                    .find(|p| self.board.fits(p));
                match lifted {
                    Some(p) => self.active = Some(p),
                    None => ok = false,
                }
            }
        }
        if !ok {
            self.game_over();
        }
        ok
    }

    fn put_in_play(&mut self, piece: ActivePiece) {
        self.active = Some(piece);
        self.gravity_acc = 0;
        self.counters.lock.start(self.timings.lock_delay);
        self.set_phase(PlayPhase::Falling);
        if self.timings.is_20g() {
            let distance = self.board.drop_distance(&piece);
            self.active = Some(piece.shifted(0, distance));
        }
        self.update_grounded_phase();
    }

    fn update_grounded_phase(&mut self) {
        if let Some(piece) = self.active {
            if self.board.is_grounded(&piece) {
                self.set_phase(PlayPhase::Locking);
            } else {
                self.set_phase(PlayPhase::Falling);
            }
        }
    }

    fn enter_spawning(&mut self, are: u32) {
        self.counters.are.start(are);
        self.set_phase(PlayPhase::Spawning);
    }

    fn set_phase(&mut self, phase: PlayPhase) {
        if self.phase != phase {
            debug!(player = self.index, from = self.phase.as_str(), to = phase.as_str(), "phase");
            self.phase = phase;
        }
    }

    /// Horizontal shift owed this frame by the DAS, 0 for none.
    fn das_shift(&mut self) -> i8 {
        let dir = match (
            self.held.contains(GameAction::MoveLeft),
            self.held.contains(GameAction::MoveRight),
        ) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        };
        if dir != self.das_dir {
            self.das_dir = dir;
            self.counters.das.start(self.timings.das);
            return dir;
        }
        if dir != 0 && self.counters.das.tick() {
            dir
        } else {
            0
        }
    }

    fn fill_sequence(&mut self) {
        let needed = self.mino_seq_index + 1 + self.previews;
        while self.mino_sequence.len() < needed {
            let next = self.randomizer.next_piece();
            self.mino_sequence.push(next);
        }
    }

    fn next_from_sequence(&mut self) -> PieceKind {
        self.fill_sequence();
        let kind = self.mino_sequence[self.mino_seq_index];
        self.mino_seq_index += 1;
        self.fill_sequence();
        kind
    }

    /// Raise the level (never lowers it), updating sections and checkpoints.
    fn set_level(&mut self, level: u32, mode: &ModeConfig, ruleset: &dyn Ruleset) {
        let old = self.level;
        let new = level.min(mode.final_level);
        if new <= old {
            return;
        }
        self.level = new;
        self.update_sections(old, new, mode.final_level);
        ruleset.reach_level(&mut self.grading, old, new, self.timer, self.score);
        if new >= mode.final_level {
            self.finish(ruleset);
        }
    }

    fn update_sections(&mut self, old: u32, new: u32, final_level: u32) {
        let timer = self.timer;
        for section in old / SECTION_SIZE..=new / SECTION_SIZE {
            let cool_level = section * SECTION_SIZE + COOL_CHECK_OFFSET;
            if old < cool_level && cool_level <= new {
                if let Some(record) = self.statistics.current_section_mut() {
                    if record.section == section {
                        record.cool_time = Some(timer - record.start_frame);
                    }
                }
            }

            let boundary = (section + 1) * SECTION_SIZE;
            if old < boundary && boundary <= new {
                if let Some(record) = self.statistics.current_section_mut() {
                    record.time = Some(timer - record.start_frame);
                }
                if boundary < final_level {
                    self.statistics.section_data.push(SectionRecord::new(section + 1, timer));
                }
            }
        }
    }

    fn finish(&mut self, ruleset: &dyn Ruleset) {
        self.active = None;
        self.board.collapse_cleared_rows();
        if let Some(record) = self.statistics.current_section_mut() {
            if record.time.is_none() {
                record.time = Some(self.timer - record.start_frame);
            }
        }
        self.grading.grade = ruleset.final_grade(&self.grading, self.score);
        self.set_phase(PlayPhase::Finished);
        info!(
            player = self.index,
            level = self.level,
            score = self.score,
            grade = self.grading.grade.as_str(),
            time = self.timer,
            "mode complete"
        );
    }

    fn game_over(&mut self) {
        self.active = None;
        self.board.monoify();
        self.set_phase(PlayPhase::GameOver);
        info!(
            player = self.index,
            level = self.level,
            score = self.score,
            grade = self.grading.grade.as_str(),
            "game over"
        );
    }

    /// Re-derive timings and run level events once per level change.
    fn sync_level(&mut self, ctx: &mut StepContext<'_>) {
        if self.level == self.synced_level {
            return;
        }
        self.synced_level = self.level;

        match ctx.mode.speed_curve.timings_for_level(self.level) {
            Some(t) => self.timings = t,
            None => {
                if !self.timings_gap_reported {
                    warn!(player = self.index, level = self.level, "no speed step for level, keeping timings");
                    self.timings_gap_reported = true;
                }
            }
        }
        self.cursor
            .advance(ctx.events, self.level, ctx.session, &mut self.timings);
    }

    fn medal_inputs(&self) -> MedalInputs {
        MedalInputs {
            best_section_time: self.statistics.best_section_time(),
            tetrises: self.statistics.tetrises() + self.statistics.pentrises(),
            max_combo: self.statistics.max_combo,
            all_clears: self.statistics.all_clears,
            recoveries: self.statistics.recoveries,
            pieces: self.statistics.pieces,
            rotations: self.statistics.rotations,
        }
    }

    fn evaluate_medals(&mut self) {
        let next = medals::evaluate(&self.medal_inputs(), &self.medals, self.timer);
        if next == self.medals {
            return;
        }
        for kind in MedalKind::ALL {
            let tier = next.tier(kind);
            if tier != self.medals.tier(kind) {
                info!(player = self.index, medal = kind.as_str(), tier = tier.as_str(), frame = self.timer, "medal");
            }
        }
        self.medals = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::{ClassicRuleset, MasterRuleset};
    use crate::types::{Grade, Rotation, CELL_MONO, FLAG_GHOST};

    struct Fixture {
        mode: ModeConfig,
        events: LevelEvents,
        session: GameState,
    }

    impl Fixture {
        fn new(mode: ModeConfig) -> Self {
            let events = LevelEvents::from_mode(&mode);
            let session = GameState::new(mode.initial_flags, mode.garbage_delay, mode.music);
            Self { mode, events, session }
        }

        fn player(&mut self) -> PlayerState {
            PlayerState::new(0, &self.mode, 12345, &self.events, &mut self.session)
        }

        fn step(&mut self, player: &mut PlayerState, ruleset: &dyn Ruleset) -> StepOutcome {
            let mut ctx = StepContext {
                mode: &self.mode,
                ruleset,
                events: &self.events,
                session: &mut self.session,
            };
            player.step(&mut ctx)
        }
    }

    #[test]
    fn first_frame_spawns_without_level_gain() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        assert_eq!(player.phase(), PlayPhase::Spawning);

        fx.step(&mut player, &MasterRuleset);
        assert_eq!(player.phase(), PlayPhase::Falling);
        assert!(player.active().is_some());
        assert_eq!(player.level(), 0);
        assert_eq!(player.statistics().pieces, 1);
        assert_eq!(player.mino_seq_index(), 1);
        assert_eq!(player.previews().len(), 1);
    }

    #[test]
    fn preview_is_the_next_piece() {
        let mut fx = Fixture::new(ModeConfig {
            previews: 3,
            ..ModeConfig::master()
        });
        let mut player = fx.player();
        let upcoming: Vec<PieceKind> = player.previews().to_vec();
        assert_eq!(upcoming.len(), 3);

        fx.step(&mut player, &MasterRuleset);
        assert_eq!(player.active().map(|p| p.kind), Some(upcoming[0]));
        assert_eq!(&player.previews()[..2], &upcoming[1..]);
    }

    #[test]
    fn piece_locks_after_lock_delay_and_respawns_after_are() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        fx.step(&mut player, &MasterRuleset);

        // Sonic drop, then wait out the 30 frame lock delay.
        player.press(GameAction::SonicDrop);
        fx.step(&mut player, &MasterRuleset);
        assert_eq!(player.phase(), PlayPhase::Locking);

        let mut frames = 1;
        while player.phase() == PlayPhase::Locking {
            fx.step(&mut player, &MasterRuleset);
            frames += 1;
        }
        assert_eq!(frames, 30);
        assert_eq!(player.phase(), PlayPhase::Spawning);
        assert_eq!(player.board().filled_cells(), 4);

        // ARE of 25 frames before the next piece.
        for _ in 0..24 {
            fx.step(&mut player, &MasterRuleset);
            assert_eq!(player.phase(), PlayPhase::Spawning);
        }
        fx.step(&mut player, &MasterRuleset);
        assert!(player.phase().has_active_piece());
        assert_eq!(player.level(), 1);
    }

    #[test]
    fn soft_drop_locks_on_contact() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        fx.step(&mut player, &MasterRuleset);

        player.press(GameAction::SoftDrop);
        let mut frames = 0;
        while player.phase().has_active_piece() {
            fx.step(&mut player, &MasterRuleset);
            frames += 1;
            assert!(frames < 40);
        }
        assert!(player.placement().soft_drop_frames > 0);
        assert_eq!(player.board().filled_cells(), 4);
    }

    #[test]
    fn hold_once_per_placement() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        fx.step(&mut player, &MasterRuleset);
        let first = player.active().unwrap().kind;

        assert!(player.hold(&fx.mode));
        assert_eq!(player.hold_piece(), Some(first));
        let swapped_in = player.active().unwrap();

        assert!(!player.hold(&fx.mode));
        assert_eq!(player.hold_piece(), Some(first));
        assert_eq!(player.active(), Some(swapped_in));
        assert!(player.counters().hold_flash.is_running());
    }

    #[test]
    fn hold_disabled_is_a_no_op() {
        let mut fx = Fixture::new(ModeConfig::classic());
        let mut player = fx.player();
        fx.step(&mut player, &ClassicRuleset);
        let before = player.active();
        assert!(!player.hold(&fx.mode));
        assert_eq!(player.active(), before);
        assert_eq!(player.hold_piece(), None);
    }

    #[test]
    fn blocked_spawn_is_game_over() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        for x in 0..10 {
            player.board_mut().set(x, 1, CELL_MONO);
            player.board_mut().set(x, 2, CELL_MONO);
        }
        player.board_mut().set(0, 1, 0);

        fx.step(&mut player, &MasterRuleset);
        assert_eq!(player.phase(), PlayPhase::GameOver);
        assert!(player.active().is_none());

        let index = player.mino_seq_index();
        let timer = player.timer();
        fx.step(&mut player, &MasterRuleset);
        assert_eq!(player.mino_seq_index(), index);
        assert_eq!(player.timer(), timer);
    }

    #[test]
    fn simple_combo_counts_consecutive_clears() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        let mut seen = Vec::new();
        for lines in [1, 1, 0, 1] {
            player.resolve_lock(LockResult { lines, all_clear: false }, &fx.mode, &MasterRuleset);
            seen.push(player.simple_combo());
        }
        assert_eq!(seen, [1, 2, 0, 1]);
        assert_eq!(player.statistics().max_combo, 2);
        assert_eq!(player.score_combo(), 1);
    }

    #[test]
    fn clears_raise_level_and_score() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        player.resolve_lock(LockResult { lines: 4, all_clear: true }, &fx.mode, &MasterRuleset);

        assert_eq!(player.level(), 4);
        assert_eq!(player.statistics().tetrises(), 1);
        assert_eq!(player.statistics().all_clears, 1);
        assert!(player.score() > 0);
        assert_eq!(player.grading().grade_points, 50);
        assert_eq!(player.placement().level_increment, 4);
    }

    #[test]
    fn sections_record_cool_and_section_times() {
        let mut fx = Fixture::new(ModeConfig {
            starting_level: 66,
            ..ModeConfig::master()
        });
        let mut player = fx.player();
        player.timer = 1000;
        player.resolve_lock(LockResult { lines: 4, all_clear: false }, &fx.mode, &MasterRuleset);
        assert_eq!(player.statistics().section_data[0].cool_time, Some(1000));

        player.level = 97;
        player.timer = 3000;
        player.resolve_lock(LockResult { lines: 4, all_clear: false }, &fx.mode, &MasterRuleset);
        assert_eq!(player.section(), 1);
        let sections = &player.statistics().section_data;
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].time, Some(3000));
        assert_eq!(sections[1].start_frame, 3000);
        assert_eq!(sections[1].tetrises, 0);
    }

    #[test]
    fn reaching_final_level_finishes() {
        let mut fx = Fixture::new(ModeConfig {
            starting_level: 996,
            ..ModeConfig::master()
        });
        let mut player = fx.player();
        player.resolve_lock(LockResult { lines: 4, all_clear: false }, &fx.mode, &MasterRuleset);
        assert_eq!(player.level(), 999);
        assert_eq!(player.phase(), PlayPhase::Finished);
        assert!(player.statistics().current_section().unwrap().time.is_some());
    }

    #[test]
    fn finishing_clear_keeps_the_remaining_stack_for_recovery() {
        let mut fx = Fixture::new(ModeConfig {
            starting_level: 996,
            ..ModeConfig::master()
        });
        let mut player = fx.player();
        // Rows 6..=19 filled except column 0, closed by a vertical I.
        for y in 6..20 {
            for x in 1..10 {
                player.board_mut().set(x, y, CELL_MONO);
            }
        }
        player.active = Some(ActivePiece {
            rotation: Rotation::East,
            ..ActivePiece::new(PieceKind::I, -2, 16)
        });
        player.recovery_armed = true;

        let result = player.lock().unwrap();
        assert_eq!(result.lines, 4);
        player.resolve_lock(result, &fx.mode, &MasterRuleset);

        assert_eq!(player.phase(), PlayPhase::Finished);
        assert_eq!(player.board().filled_cells(), 90);
        assert_eq!(player.statistics().recoveries, 0);
        assert!(player.recovery_armed);
    }

    #[test]
    fn recovery_counts_once_the_stack_is_low() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        for y in 17..20 {
            for x in 1..10 {
                player.board_mut().set(x, y, CELL_MONO);
            }
        }
        player.active = Some(ActivePiece {
            rotation: Rotation::East,
            ..ActivePiece::new(PieceKind::I, -2, 16)
        });
        player.recovery_armed = true;

        // 27 + 4 cells, three rows clear: one I cell stays.
        let result = player.lock().unwrap();
        assert_eq!(result.lines, 3);
        player.resolve_lock(result, &fx.mode, &MasterRuleset);
        assert_eq!(player.statistics().recoveries, 1);
        assert!(!player.recovery_armed);
    }

    #[test]
    fn initial_rotation_counts_as_a_rotation() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        player.press(GameAction::RotateCw);
        fx.step(&mut player, &MasterRuleset);

        assert_eq!(player.active().map(|p| p.rotation), Some(Rotation::East));
        assert_eq!(player.statistics().rotations, 1);
    }

    #[test]
    fn level_stop_holds_the_level() {
        let mut fx = Fixture::new(ModeConfig {
            starting_level: 99,
            ..ModeConfig::master()
        });
        let mut player = fx.player();
        fx.step(&mut player, &MasterRuleset);
        assert!(player.spawn(&fx.mode, &MasterRuleset));
        assert_eq!(player.level(), 99);
        assert!(player.statistics().current_section().unwrap().level_stop_time > 0);
    }

    #[test]
    fn ghost_flag_turns_off_at_100() {
        let mut fx = Fixture::new(ModeConfig {
            starting_level: 98,
            ..ModeConfig::master()
        });
        let mut player = fx.player();
        assert!(fx.session.has_flag(FLAG_GHOST));
        player.resolve_lock(LockResult { lines: 2, all_clear: false }, &fx.mode, &MasterRuleset);
        fx.step(&mut player, &MasterRuleset);
        assert!(!fx.session.has_flag(FLAG_GHOST));
    }

    #[test]
    fn decay_only_without_combo() {
        let mut fx = Fixture::new(ModeConfig::master());
        let mut player = fx.player();
        fx.step(&mut player, &MasterRuleset);
        player.grading.grade_points = 10;

        for _ in 0..125 {
            fx.step(&mut player, &MasterRuleset);
        }
        assert_eq!(player.grading().grade_points, 9);
        assert_eq!(player.grading().grade, Grade::G9);
    }

    #[test]
    fn receive_garbage_lifts_the_stack() {
        let mut fx = Fixture::new(ModeConfig::versus());
        let mut player = fx.player();
        assert!(player.receive_garbage(2, 3));
        assert_eq!(player.board().filled_cells(), 18);
    }
}
