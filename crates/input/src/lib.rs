//! Terminal input module (engine-facing).
//!
//! This module is independent of any UI framework. It maps `crossterm` key
//! events into [`crate::types::InputEvent`]s through configurable
//! [`KeyBindings`] and tracks held buttons for terminals that never report key
//! releases. Auto shift timing is frame based and lives in the rule engine.

pub mod handler;
pub mod map;

pub use shiro_tgm_types as types;

pub use handler::{InputEvents, InputHandler, DEFAULT_KEY_RELEASE_TIMEOUT_MS};
pub use map::{key_name, parse_key, should_quit, KeyBindings};
