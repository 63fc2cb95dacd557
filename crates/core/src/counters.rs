//! Frame counters - every delay in the rule engine is a count of frames
//!
//! A [`FrameCounter`] counts up from zero to its expire point. `value` never
//! exceeds `expire`; ticking an expired counter keeps it expired.

use crate::speed::FrameTimings;
use crate::types::{HOLD_FLASH_FRAMES, POST_LOCK_FLASH_FRAMES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameCounter {
    value: u32,
    expire: u32,
}

impl FrameCounter {
    /// A counter that expires after `expire` ticks. `new(0)` is already expired.
    pub const fn new(expire: u32) -> Self {
        Self { value: 0, expire }
    }

    /// Restart counting towards a new expire point.
    pub fn start(&mut self, expire: u32) {
        self.value = 0;
        self.expire = expire;
    }

    /// Restart counting towards the current expire point.
    pub fn restart(&mut self) {
        self.value = 0;
    }

    /// Jump straight to the expire point.
    pub fn finish(&mut self) {
        self.value = self.expire;
    }

    /// Advance one frame. Returns true once the counter has expired.
    pub fn tick(&mut self) -> bool {
        if self.value < self.expire {
            self.value += 1;
        }
        debug_assert!(self.value <= self.expire);
        self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.value >= self.expire
    }

    /// True while counting, false when expired.
    pub fn is_running(&self) -> bool {
        !self.is_expired()
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn expire(&self) -> u32 {
        self.expire
    }

    pub fn remaining(&self) -> u32 {
        self.expire.saturating_sub(self.value)
    }
}

/// The per-player counters driving the piece cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameCounters {
    /// Appearance delay before the next piece spawns.
    pub are: FrameCounter,
    /// Delay between a clear and the stack collapsing.
    pub line_clear: FrameCounter,
    /// Lock delay of the active piece.
    pub lock: FrameCounter,
    /// Delayed auto shift charge.
    pub das: FrameCounter,
    /// Stack flash after a lock.
    pub post_lock: FrameCounter,
    /// Hold box flash after a swap.
    pub hold_flash: FrameCounter,
}

impl FrameCounters {
    pub fn new(timings: &FrameTimings) -> Self {
        let mut post_lock = FrameCounter::new(POST_LOCK_FLASH_FRAMES);
        post_lock.finish();
        let mut hold_flash = FrameCounter::new(HOLD_FLASH_FRAMES);
        hold_flash.finish();

        Self {
            // The first piece appears on the first simulated frame.
            are: FrameCounter::new(0),
            line_clear: FrameCounter::new(timings.line_clear),
            lock: FrameCounter::new(timings.lock_delay),
            das: FrameCounter::new(timings.das),
            post_lock,
            hold_flash,
        }
    }

    /// Advance the purely cosmetic flash counters.
    pub fn tick_flashes(&mut self) {
        self.post_lock.tick();
        self.hold_flash.tick();
    }
}
