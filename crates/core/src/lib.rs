//! Core rule engine - pure, deterministic, frame-stepped
//!
//! This crate contains every game rule and the per-frame simulation. It has
//! **no dependencies** on the terminal, input devices or wall-clock time:
//!
//! - **Deterministic**: a mode and a seed reproduce the same game
//! - **Frame based**: every delay is counted in frames at [`types::FPS`]
//! - **Testable**: players can be stepped and inspected one frame at a time
//! - **Allocation free per frame**: sequences and buffers are reserved up front
//!
//! # Module Structure
//!
//! - [`board`]: the [`Playfield`] substrate trait and the [`Board`] grid
//! - [`pieces`]: tetromino shapes, arcade rotation with basic wall kicks
//! - [`rng`]: history and 7-bag randomizers
//! - [`counters`]: frame counters with expire points
//! - [`speed`]: gravity and delay curves
//! - [`mode`]: mode configuration and presets
//! - [`events`]: level-triggered events
//! - [`grading`] / [`ruleset`]: scoring and grading policies
//! - [`medals`]: medal evaluation
//! - [`player`]: one player's piece cycle
//! - [`game`]: the session loop
//! - [`snapshot`]: read-only views for rendering
//!
//! # Example
//!
//! ```
//! use shiro_tgm_core::{Game, ModeConfig};
//! use shiro_tgm_core::types::{GameAction, InputEvent, PlayPhase};
//!
//! let mut game = Game::new(ModeConfig::master(), 12345).unwrap();
//! game.frame();
//! assert_eq!(game.players()[0].phase(), PlayPhase::Falling);
//!
//! game.input(&[InputEvent::Press(GameAction::SonicDrop)]);
//! game.frame();
//! assert_eq!(game.players()[0].phase(), PlayPhase::Locking);
//! ```

pub mod board;
pub mod counters;
pub mod events;
pub mod game;
pub mod game_state;
pub mod grading;
pub mod medals;
pub mod mode;
pub mod pieces;
pub mod player;
pub mod rng;
pub mod ruleset;
pub mod snapshot;
pub mod speed;
pub mod stats;

pub use shiro_tgm_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, ClearedRows, Playfield, SpawnCollision, SpawnOffset};
pub use counters::{FrameCounter, FrameCounters};
pub use events::{EventCursor, LevelEvent, LevelEventKind, LevelEvents};
pub use game::{Game, PendingGarbage};
pub use game_state::GameState;
pub use grading::{GradeState, ScoreInput};
pub use medals::{Medal, MedalInputs, Medals};
pub use mode::{FieldOverride, FlagEvent, ModeConfig};
pub use pieces::{get_shape, try_rotate, ActivePiece, MinoStyle};
pub use player::{LockResult, Placement, PlayerState, StepContext, StepOutcome};
pub use rng::{BagRandomizer, HistoryRandomizer, PieceRandomizer, Randomizer, RandomizerKind, SimpleRng};
pub use ruleset::{ClassicRuleset, MasterRuleset, Ruleset, RulesetId};
pub use snapshot::{PlayerSnapshot, SessionSnapshot};
pub use speed::{FrameTimings, SpeedCurve, SpeedStep};
pub use stats::{SectionRecord, Statistics};
