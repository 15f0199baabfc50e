use serde::Serialize;

use crate::core::{
    piece::ActivePiece,
    shape::{ColorId, PieceKind},
};

use super::{
    score::ScoreState,
    session::{GameSession, SessionState},
};

/// Serializable read-only view of a session, sufficient to render a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Grid rows from top to bottom, one color code per cell, `.` for empty.
    pub grid: Vec<String>,
    pub active: PieceSnapshot,
    /// Where the active piece would land on a hard drop.
    pub landing: PieceSnapshot,
    pub preview: Vec<PieceKind>,
    pub score: ScoreState,
    pub fall_timer: u32,
    pub fall_speed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieceSnapshot {
    pub kind: PieceKind,
    pub color: ColorId,
    pub rotation: usize,
    pub x: i32,
    pub y: i32,
    /// Absolute grid coordinates of the occupied cells.
    pub cells: Vec<(i32, i32)>,
}

impl From<&ActivePiece> for PieceSnapshot {
    fn from(piece: &ActivePiece) -> Self {
        Self {
            kind: piece.kind(),
            color: piece.color(),
            rotation: piece.rotation().index(),
            x: piece.x(),
            y: piece.y(),
            cells: piece.cells().collect(),
        }
    }
}

impl GameSession {
    /// Captures the current state for presentation or serialization.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session_state(),
            grid: self
                .grid()
                .rows()
                .map(|row| row.iter().map(|cell| cell.code()).collect())
                .collect(),
            active: self.active_piece().into(),
            landing: (&self.landing_position()).into(),
            preview: self.preview().collect(),
            score: self.score().clone(),
            fall_timer: self.fall_timer(),
            fall_speed: self.fall_speed(),
        }
    }
}
