//! Shiro TGM (workspace facade crate).
//!
//! Re-exports the workspace crates as `shiro_tgm::{core,input,term,types}` and
//! holds the binary's [`Settings`].

pub mod settings;

pub use shiro_tgm_core as core;
pub use shiro_tgm_input as input;
pub use shiro_tgm_term as term;
pub use shiro_tgm_types as types;

pub use settings::Settings;
