//! Terminal "game renderer" module.
//!
//! A small, game-oriented rendering layer for terminal play. It avoids
//! widget/layout toolkits and renders a [`core::SessionSnapshot`] into a simple
//! framebuffer that is flushed to the terminal once per simulated frame.
//!
//! Goals:
//! - Keep `core` deterministic and testable
//! - Draw every player of a session side by side
//! - Allow precise control over aspect ratio (e.g. 2 chars wide per cell)

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use shiro_tgm_core as core;
pub use shiro_tgm_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{AnchorY, GameView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
