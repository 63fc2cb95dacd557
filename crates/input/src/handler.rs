//! Held-button tracker for terminal environments.
//!
//! The rule engine expects press/release edges. Terminals that report key
//! releases give them directly; the rest only repeat presses while a key is
//! down, so a button is released once no press was seen for a short timeout.

use std::time::{Duration, Instant};

use arrayvec::ArrayVec;
use crossterm::event::{KeyEvent, KeyEventKind};

use crate::map::KeyBindings;
use crate::types::{ButtonSet, GameAction, InputEvent};

/// Events produced by one call into the handler.
pub type InputEvents = ArrayVec<InputEvent, 32>;

// Long enough to bridge the autorepeat gap of most terminals after the first
// repeat, short enough that a tap does not turn into a long DAS charge.
pub const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

const SLOTS: usize = GameAction::ALL.len();

fn slot(action: GameAction) -> usize {
    action.bit().trailing_zeros() as usize
}

/// Turns key events into [`InputEvent`]s.
#[derive(Debug, Clone)]
pub struct InputHandler {
    held: ButtonSet,
    last_seen: [Option<Instant>; SLOTS],
    /// Set once the terminal delivered a real release event.
    has_release_events: bool,
    key_release_timeout_ms: u32,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            held: ButtonSet::EMPTY,
            last_seen: [None; SLOTS],
            has_release_events: false,
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    pub fn key_release_timeout_ms(&self) -> u32 {
        self.key_release_timeout_ms
    }

    pub fn held(&self) -> ButtonSet {
        self.held
    }

    /// Translate one key event. Unbound keys produce nothing.
    pub fn handle_key_event(&mut self, bindings: &KeyBindings, key: KeyEvent, out: &mut InputEvents) {
        let Some(action) = bindings.action_for(key.code) else {
            return;
        };
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => self.press(action, out),
            KeyEventKind::Release => {
                self.has_release_events = true;
                self.release(action, out);
            }
        }
    }

    pub fn press(&mut self, action: GameAction, out: &mut InputEvents) {
        // Session commands act on the edge only and are never held. Repeats
        // of a key that is still down only refresh its timestamp.
        if matches!(action, GameAction::Pause | GameAction::Restart) {
            if self.last_seen[slot(action)].replace(Instant::now()).is_none() {
                let _ = out.try_push(InputEvent::Press(action));
                let _ = out.try_push(InputEvent::Release(action));
            }
            return;
        }

        self.last_seen[slot(action)] = Some(Instant::now());
        if !self.held.contains(action) {
            self.held.insert(action);
            let _ = out.try_push(InputEvent::Press(action));
        }
    }

    pub fn release(&mut self, action: GameAction, out: &mut InputEvents) {
        self.last_seen[slot(action)] = None;
        if self.held.contains(action) {
            self.held.remove(action);
            let _ = out.try_push(InputEvent::Release(action));
        }
    }

    /// Release buttons whose key has not been seen within the timeout.
    ///
    /// Does nothing once the terminal has shown it reports releases itself.
    pub fn update(&mut self, out: &mut InputEvents) {
        if self.has_release_events {
            return;
        }
        let timeout = Duration::from_millis(self.key_release_timeout_ms as u64);
        for action in GameAction::ALL {
            let stale = self.last_seen[slot(action)].map_or(false, |t| t.elapsed() > timeout);
            if stale {
                self.release(action, out);
            }
        }
    }

    /// Release everything, e.g. after the terminal lost focus.
    pub fn reset(&mut self, out: &mut InputEvents) {
        for action in GameAction::ALL {
            self.release(action, out);
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
