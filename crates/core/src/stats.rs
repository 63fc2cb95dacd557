//! Per-player statistics, updated only when a lock resolves.

use crate::types::{ClearKind, SECTION_SIZE};

/// Timing record of one section (100 levels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionRecord {
    pub section: u32,
    /// Game timer when the section was entered.
    pub start_frame: u64,
    /// Frames spent in the section, set when it is completed.
    pub time: Option<u64>,
    /// Frames from the start of the section to its x70 level.
    pub cool_time: Option<u64>,
    /// Frames spent waiting at a level stop.
    pub level_stop_time: u64,
    pub tetrises: u32,
    /// Entered above its first level (the game started mid-section).
    pub partial: bool,
}

impl SectionRecord {
    pub fn new(section: u32, start_frame: u64) -> Self {
        Self {
            section,
            start_frame,
            time: None,
            cool_time: None,
            level_stop_time: 0,
            tetrises: 0,
            partial: false,
        }
    }

    pub fn first_level(&self) -> u32 {
        self.section * SECTION_SIZE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    /// Locks by rows cleared: single, double, triple, tetris, pentris.
    clears: [u32; 5],
    pub lines: u32,
    pub pieces: u32,
    pub rotations: u32,
    pub all_clears: u32,
    pub recoveries: u32,
    pub max_combo: u32,
    /// Append-only, one record per section entered.
    pub section_data: Vec<SectionRecord>,
}

impl Statistics {
    pub fn new(starting_level: u32) -> Self {
        let mut section_data = Vec::with_capacity(16);
        section_data.push(SectionRecord {
            partial: starting_level % SECTION_SIZE != 0,
            ..SectionRecord::new(starting_level / SECTION_SIZE, 0)
        });
        Self {
            clears: [0; 5],
            lines: 0,
            pieces: 0,
            rotations: 0,
            all_clears: 0,
            recoveries: 0,
            max_combo: 0,
            section_data,
        }
    }

    pub fn count(&self, kind: ClearKind) -> u32 {
        match kind {
            ClearKind::None => 0,
            _ => self.clears[kind.lines() as usize - 1],
        }
    }

    pub fn singles(&self) -> u32 {
        self.count(ClearKind::Single)
    }

    pub fn doubles(&self) -> u32 {
        self.count(ClearKind::Double)
    }

    pub fn triples(&self) -> u32 {
        self.count(ClearKind::Triple)
    }

    pub fn tetrises(&self) -> u32 {
        self.count(ClearKind::Tetris)
    }

    pub fn pentrises(&self) -> u32 {
        self.count(ClearKind::Pentris)
    }

    pub fn record_clear(&mut self, kind: ClearKind, all_clear: bool) {
        if kind == ClearKind::None {
            return;
        }
        self.clears[kind.lines() as usize - 1] += 1;
        self.lines += kind.lines();
        if all_clear {
            self.all_clears += 1;
        }
        if matches!(kind, ClearKind::Tetris | ClearKind::Pentris) {
            if let Some(section) = self.section_data.last_mut() {
                section.tetrises += 1;
            }
        }
    }

    pub fn current_section(&self) -> Option<&SectionRecord> {
        self.section_data.last()
    }

    pub fn current_section_mut(&mut self) -> Option<&mut SectionRecord> {
        self.section_data.last_mut()
    }

    /// Fastest completed section, ignoring a partial first one.
    pub fn best_section_time(&self) -> Option<u64> {
        self.section_data
            .iter()
            .filter(|s| !s.partial)
            .filter_map(|s| s.time)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_clear_counts_by_kind() {
        let mut stats = Statistics::new(0);
        stats.record_clear(ClearKind::Single, false);
        stats.record_clear(ClearKind::Tetris, true);
        stats.record_clear(ClearKind::Tetris, false);
        stats.record_clear(ClearKind::None, true);

        assert_eq!(stats.singles(), 1);
        assert_eq!(stats.tetrises(), 2);
        assert_eq!(stats.doubles(), 0);
        assert_eq!(stats.lines, 9);
        assert_eq!(stats.all_clears, 1);
        assert_eq!(stats.current_section().map(|s| s.tetrises), Some(2));
    }

    #[test]
    fn first_section_follows_starting_level() {
        let stats = Statistics::new(250);
        assert_eq!(stats.section_data.len(), 1);
        assert_eq!(stats.section_data[0].first_level(), 200);
        assert!(stats.section_data[0].partial);
        assert!(!Statistics::new(300).section_data[0].partial);
    }

    #[test]
    fn best_section_ignores_open_sections() {
        let mut stats = Statistics::new(0);
        assert_eq!(stats.best_section_time(), None);
        stats.section_data[0].time = Some(4000);
        stats.section_data.push(SectionRecord::new(1, 4000));
        stats.section_data.push(SectionRecord {
            time: Some(3500),
            ..SectionRecord::new(2, 8000)
        });
        assert_eq!(stats.best_section_time(), Some(3500));
    }
}
