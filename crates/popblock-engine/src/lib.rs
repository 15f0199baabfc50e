//! Simulation core for the Pop Block falling-block puzzle.
//!
//! The crate is split in two layers:
//!
//! - [`core`] - pure data structures: the shape catalog, the grid, and the active piece
//! - [`engine`] - scoring, the preview queue, configuration, commands, and the
//!   [`GameSession`] state machine that ties everything together
//!
//! The engine never draws, sleeps, or reads input devices. A presentation layer
//! feeds it [`Command`]s and [`GameSession::tick`] calls and renders from the
//! read-only accessors (or a [`SessionSnapshot`]).

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Configuration value rejected by [`GameConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("grid must be at least 4x4, got {width}x{height}")]
    GridTooSmall { width: usize, height: usize },
    #[display("spawn anchor ({x}, {y}) leaves no room for a 4x4 piece in a {width}x{height} grid")]
    SpawnOutsideGrid {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[display("preview queue depth must be at least 1")]
    EmptyQueue,
    #[display("visible preview length {visible} exceeds queue depth {depth}")]
    PreviewExceedsQueue { visible: usize, depth: usize },
    #[display("minimum fall time must be at least 1 tick")]
    ZeroFallTime,
}

/// Token that does not name any [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown command: {token:?}")]
pub struct ParseCommandError {
    pub token: String,
}

/// String that is not a 32-digit hexadecimal [`PieceSeed`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid piece seed {input:?}: expected 32 hex digits")]
pub struct ParseSeedError {
    pub input: String,
}
