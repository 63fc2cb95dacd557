//! Level events - actions keyed to a trigger level
//!
//! Events are kept sorted by trigger level (stable, so events sharing a level
//! run in the order they were listed). Each player owns an [`EventCursor`];
//! when the player's level changes the cursor runs every event whose trigger
//! is now `<=` the level, in ascending order, exactly once.
//!
//! Events may touch the session state or the player's timings, never the
//! level itself.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::game_state::GameState;
use crate::mode::ModeConfig;
use crate::speed::FrameTimings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelEventKind {
    /// Switch the player to new gravity and delays.
    Speed(FrameTimings),
    /// Set then clear `FLAG_*` bits on the session.
    SessionFlags { set: u32, clear: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEvent {
    pub level: u32,
    pub kind: LevelEventKind,
}

impl LevelEvent {
    pub fn execute(&self, session: &mut GameState, timings: &mut FrameTimings) {
        match self.kind {
            LevelEventKind::Speed(t) => *timings = t,
            LevelEventKind::SessionFlags { set, clear } => session.apply_flags(set, clear),
        }
    }
}

/// The level-sorted event list of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelEvents {
    events: Vec<LevelEvent>,
}

impl LevelEvents {
    pub fn new(mut events: Vec<LevelEvent>) -> Self {
        // `sort_by_key` is stable.
        events.sort_by_key(|e| e.level);
        Self { events }
    }

    /// Speed events generated from the mode's curve, followed by its flag events.
    pub fn from_mode(mode: &ModeConfig) -> Self {
        let speed = mode.speed_curve.steps().iter().map(|s| LevelEvent {
            level: s.level,
            kind: LevelEventKind::Speed(s.timings),
        });
        let flags = mode.flag_events.iter().map(|f| LevelEvent {
            level: f.level,
            kind: LevelEventKind::SessionFlags {
                set: f.set,
                clear: f.clear,
            },
        });
        let events = Self::new(speed.chain(flags).collect());
        if events.is_empty() {
            warn!(mode = %mode.name, "mode has no level events");
        }
        events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn as_slice(&self) -> &[LevelEvent] {
        &self.events
    }
}

/// Index of the next event a player has not run yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCursor {
    next: usize,
}

impl EventCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every pending event with trigger `<= level`. Returns how many ran.
    pub fn advance(
        &mut self,
        events: &LevelEvents,
        level: u32,
        session: &mut GameState,
        timings: &mut FrameTimings,
    ) -> usize {
        let start = self.next;
        while let Some(event) = events.events.get(self.next) {
            if event.level > level {
                break;
            }
            debug!(level = event.level, kind = ?event.kind, "level event");
            event.execute(session, timings);
            self.next += 1;
        }
        self.next - start
    }

    pub fn position(&self) -> usize {
        self.next
    }

    pub fn is_exhausted(&self, events: &LevelEvents) -> bool {
        self.next >= events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FLAG_GHOST, FLAG_VERSUS_GARBAGE};

    fn flags(level: u32, set: u32, clear: u32) -> LevelEvent {
        LevelEvent {
            level,
            kind: LevelEventKind::SessionFlags { set, clear },
        }
    }

    #[test]
    fn ties_keep_list_order() {
        let events = LevelEvents::new(vec![
            flags(100, 0, FLAG_GHOST),
            flags(50, FLAG_VERSUS_GARBAGE, 0),
            flags(100, FLAG_GHOST, 0),
        ]);
        let levels: Vec<u32> = events.as_slice().iter().map(|e| e.level).collect();
        assert_eq!(levels, [50, 100, 100]);

        let mut session = GameState::new(0, 0, 0);
        let mut timings = FrameTimings::default();
        let mut cursor = EventCursor::new();
        assert_eq!(cursor.advance(&events, 150, &mut session, &mut timings), 3);
        // Clear then set at 100: the set runs last.
        assert!(session.has_flag(FLAG_GHOST));
    }

    #[test]
    fn events_run_once() {
        let events = LevelEvents::new(vec![flags(10, FLAG_GHOST, 0)]);
        let mut session = GameState::new(0, 0, 0);
        let mut timings = FrameTimings::default();
        let mut cursor = EventCursor::new();

        assert_eq!(cursor.advance(&events, 9, &mut session, &mut timings), 0);
        assert_eq!(cursor.advance(&events, 10, &mut session, &mut timings), 1);
        session.apply_flags(0, FLAG_GHOST);
        assert_eq!(cursor.advance(&events, 20, &mut session, &mut timings), 0);
        assert!(!session.has_flag(FLAG_GHOST));
        assert!(cursor.is_exhausted(&events));
    }

    #[test]
    fn speed_event_replaces_timings() {
        let fast = FrameTimings::new(5120, 12, 6, 6, 17, 6);
        let events = LevelEvents::new(vec![LevelEvent {
            level: 0,
            kind: LevelEventKind::Speed(fast),
        }]);
        let mut session = GameState::default();
        let mut timings = FrameTimings::default();
        EventCursor::new().advance(&events, 0, &mut session, &mut timings);
        assert_eq!(timings, fast);
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let events = LevelEvents::default();
        let mut session = GameState::default();
        let mut timings = FrameTimings::default();
        let mut cursor = EventCursor::new();
        assert_eq!(cursor.advance(&events, 999, &mut session, &mut timings), 0);
        assert_eq!(cursor.position(), 0);
    }
}
