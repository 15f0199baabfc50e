use arrayvec::ArrayVec;
use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError,
    core::{
        grid::Grid,
        piece::{ActivePiece, RotationDirection},
        shape::PieceKind,
    },
};

use super::{
    command::Command,
    config::GameConfig,
    preview_queue::{PieceSeed, PreviewQueue},
    score::{ScoreEngine, ScoreState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Running,
    Paused,
    GameOver,
}

/// Observable outcome of a session step, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Restarted,
    PieceSpawned {
        kind: PieceKind,
    },
    PieceMoved {
        dx: i32,
        dy: i32,
    },
    PieceRotated {
        direction: RotationDirection,
    },
    HardDropped {
        rows: u32,
    },
    PieceLocked {
        kind: PieceKind,
        points: u64,
    },
    LinesCleared {
        count: usize,
        points: u64,
        combo: u32,
    },
    LevelChanged {
        level: u32,
    },
    Paused,
    Resumed,
    GameOver {
        score: u64,
    },
    QuitRequested,
}

/// Events produced by one call to [`GameSession::apply`] or [`GameSession::tick`].
pub type SessionEvents = ArrayVec<SessionEvent, 8>;

/// One game from first spawn to game over, and any number of restarts.
///
/// The session exclusively owns the grid, the active piece, the preview
/// queue, and the score. It is advanced by two inputs:
///
/// - [`Self::apply`] for player commands
/// - [`Self::tick`] once per frame for gravity
///
/// Both return the [`SessionEvents`] they caused. Nothing else mutates the
/// session, so the same seed and the same sequence of calls always produce
/// the same game.
///
/// # State machine
///
/// - `Running` and `Paused` toggle on [`Command::Pause`]
/// - Piece commands and ticks only act while `Running`
/// - A lock whose placement fails, or a spawn that collides, enters `GameOver`
/// - [`Command::Restart`] resets everything and resumes `Running` from any state
///
/// # Example
///
/// ```
/// use popblock_engine::{Command, GameConfig, GameSession, PieceSeed, SessionEvent};
///
/// let seed = PieceSeed::from_bytes([1; 16]);
/// let mut session = GameSession::with_seed(GameConfig::default(), seed).unwrap();
///
/// let events = session.apply(Command::HardDrop);
/// assert!(matches!(events[0], SessionEvent::HardDropped { rows: 18 | 19 }));
/// assert_eq!(session.score().pieces_locked, 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    seed: PieceSeed,
    grid: Grid,
    active: ActivePiece,
    queue: PreviewQueue,
    score: ScoreEngine,
    state: SessionState,
    fall_timer: u32,
    fall_speed: u32,
}

fn coord(v: usize) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

impl GameSession {
    /// Creates a running session with a random seed.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    pub fn with_seed(config: GameConfig, seed: PieceSeed) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut queue = PreviewQueue::with_seed(config.queue_depth, seed);
        let kind = queue.pop_next();
        let active = ActivePiece::new(kind, coord(config.spawn_x), coord(config.spawn_y));
        Ok(Self {
            grid: Grid::new(config.grid_width, config.grid_height),
            active,
            queue,
            score: ScoreEngine::new(),
            state: SessionState::Running,
            fall_timer: 0,
            fall_speed: config.fall_speed_for_level(1),
            seed,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed the session was created with. Restarts continue its random stream.
    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.seed
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The piece under player control.
    ///
    /// After game over this is the piece that could not be placed or spawned.
    #[must_use]
    pub fn active_piece(&self) -> &ActivePiece {
        &self.active
    }

    #[must_use]
    pub fn preview_queue(&self) -> &PreviewQueue {
        &self.queue
    }

    /// The upcoming kinds shown to the player.
    pub fn preview(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.visible(self.config.preview_visible)
    }

    #[must_use]
    pub fn score(&self) -> &ScoreState {
        self.score.state()
    }

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn fall_timer(&self) -> u32 {
        self.fall_timer
    }

    /// Ticks per row at the current level.
    #[must_use]
    pub fn fall_speed(&self) -> u32 {
        self.fall_speed
    }

    /// Where the active piece would land on a hard drop.
    #[must_use]
    pub fn landing_position(&self) -> ActivePiece {
        self.active.landing_position(&self.grid)
    }

    /// Applies one player command.
    pub fn apply(&mut self, command: Command) -> SessionEvents {
        let mut events = SessionEvents::new();
        match command {
            Command::Quit => events.push(SessionEvent::QuitRequested),
            Command::Restart => self.restart_into(&mut events),
            Command::Pause => {
                if let Some(event) = self.toggle_pause() {
                    events.push(event);
                }
            }
            _ if !self.state.is_running() => {}
            Command::MoveLeft => self.move_into(-1, 0, &mut events),
            Command::MoveRight => self.move_into(1, 0, &mut events),
            Command::SoftDrop => self.move_into(0, 1, &mut events),
            Command::RotateCw => self.rotate_into(RotationDirection::Clockwise, &mut events),
            Command::RotateCcw => {
                self.rotate_into(RotationDirection::CounterClockwise, &mut events);
            }
            Command::HardDrop => {
                let rows = self.active.hard_drop(&self.grid);
                events.push(SessionEvent::HardDropped { rows });
                self.lock_into(&mut events);
            }
        }
        events
    }

    /// Advances gravity by one frame.
    ///
    /// Once the fall timer reaches the fall speed the piece moves down one
    /// row, or locks if it cannot, and the timer starts over.
    pub fn tick(&mut self) -> SessionEvents {
        let mut events = SessionEvents::new();
        if !self.state.is_running() {
            return events;
        }
        self.fall_timer += 1;
        if self.fall_timer >= self.fall_speed {
            if self.active.try_move(0, 1, &self.grid) {
                events.push(SessionEvent::PieceMoved { dx: 0, dy: 1 });
            } else {
                self.lock_into(&mut events);
            }
            self.fall_timer = 0;
        }
        events
    }

    /// Resets the grid, score, and queue, and spawns a fresh piece.
    pub fn restart(&mut self) -> SessionEvents {
        let mut events = SessionEvents::new();
        self.restart_into(&mut events);
        events
    }

    /// Toggles between `Running` and `Paused`. Game over is left untouched.
    pub fn toggle_pause(&mut self) -> Option<SessionEvent> {
        let (state, event) = match self.state {
            SessionState::Running => (SessionState::Paused, SessionEvent::Paused),
            SessionState::Paused => (SessionState::Running, SessionEvent::Resumed),
            SessionState::GameOver => return None,
        };
        self.state = state;
        Some(event)
    }

    fn restart_into(&mut self, events: &mut SessionEvents) {
        self.grid.clear();
        self.score.reset();
        self.queue.refill();
        self.fall_timer = 0;
        self.fall_speed = self.config.fall_speed_for_level(self.score.level());
        self.state = SessionState::Running;
        events.push(SessionEvent::Restarted);
        self.spawn_into(events);
    }

    fn move_into(&mut self, dx: i32, dy: i32, events: &mut SessionEvents) {
        if self.active.try_move(dx, dy, &self.grid) {
            events.push(SessionEvent::PieceMoved { dx, dy });
        }
    }

    fn rotate_into(&mut self, direction: RotationDirection, events: &mut SessionEvents) {
        if self.active.try_rotate(direction, &self.grid) {
            events.push(SessionEvent::PieceRotated { direction });
        }
    }

    /// Scores, places, and clears, then spawns the next piece.
    fn lock_into(&mut self, events: &mut SessionEvents) {
        let points = self.score.on_piece_locked(&self.active);
        events.push(SessionEvent::PieceLocked {
            kind: self.active.kind(),
            points,
        });
        if !self.grid.place(&self.active) {
            self.game_over_into(events);
            return;
        }

        let rows = self.grid.completed_rows();
        self.grid.clear_rows(&rows);
        let cleared = self.score.on_lines_cleared(rows.len());
        if !rows.is_empty() {
            events.push(SessionEvent::LinesCleared {
                count: rows.len(),
                points: cleared.points,
                combo: self.score.state().combo,
            });
        }
        if let Some(level) = cleared.level_changed {
            events.push(SessionEvent::LevelChanged { level });
        }
        self.fall_speed = self.config.fall_speed_for_level(self.score.level());

        self.spawn_into(events);
    }

    fn spawn_into(&mut self, events: &mut SessionEvents) {
        let kind = self.queue.pop_next();
        self.active = ActivePiece::new(kind, coord(self.config.spawn_x), coord(self.config.spawn_y));
        events.push(SessionEvent::PieceSpawned { kind });
        if self.grid.is_collision(&self.active, 0, 0) {
            self.game_over_into(events);
        }
    }

    fn game_over_into(&mut self, events: &mut SessionEvents) {
        self.state = SessionState::GameOver;
        events.push(SessionEvent::GameOver {
            score: self.score.state().score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{grid::Cell, shape::ColorId};

    const SEED: PieceSeed = PieceSeed::from_bytes([0x5A; 16]);

    fn session() -> GameSession {
        GameSession::with_seed(GameConfig::default(), SEED).unwrap()
    }

    /// Moves the active piece to the left wall and fills the spawn area.
    fn block_spawn_area(session: &mut GameSession) {
        session.active = ActivePiece::new(PieceKind::O, 0, 0);
        for x in 4..8 {
            for y in 0..2 {
                session.grid.set(x, y, Cell::Occupied(ColorId::Red));
            }
        }
    }

    #[test]
    fn test_new_session_is_running() {
        let session = session();
        assert!(session.session_state().is_running());
        assert_eq!(session.active_piece().x(), 4);
        assert_eq!(session.active_piece().y(), 0);
        assert_eq!(session.active_piece().rotation().index(), 0);
        assert_eq!(session.preview().count(), 4);
        assert_eq!(session.preview_queue().len(), 10);
        assert_eq!(session.fall_speed(), 60);
        assert_eq!(session.score(), &ScoreState::new());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GameConfig {
            queue_depth: 0,
            ..GameConfig::default()
        };
        assert_eq!(
            GameSession::with_seed(config, SEED).unwrap_err(),
            ConfigError::EmptyQueue
        );
    }

    #[test]
    fn test_spawn_pops_preview_front() {
        let mut session = session();
        let next = session.preview_queue().peek().unwrap();
        let events = session.apply(Command::HardDrop);
        assert!(events.contains(&SessionEvent::PieceSpawned { kind: next }));
        assert_eq!(session.active_piece().kind(), next);
        assert_eq!(session.preview_queue().len(), 10);
    }

    #[test]
    fn test_gravity_after_fall_speed_ticks() {
        let mut session = session();
        for _ in 0..59 {
            assert!(session.tick().is_empty());
        }
        assert_eq!(session.fall_timer(), 59);
        assert_eq!(
            session.tick().as_slice(),
            [SessionEvent::PieceMoved { dx: 0, dy: 1 }]
        );
        assert_eq!(session.active_piece().y(), 1);
        assert_eq!(session.fall_timer(), 0);
    }

    #[test]
    fn test_gravity_locks_resting_piece() {
        let mut session = session();
        let kind = session.active_piece().kind();
        session.active.hard_drop(&session.grid);
        session.fall_timer = 59;

        let events = session.tick();
        assert_eq!(
            events[0],
            SessionEvent::PieceLocked { kind, points: 40 }
        );
        assert!(matches!(events[1], SessionEvent::PieceSpawned { .. }));
        assert_eq!(session.grid().occupied_count(), 4);
        assert_eq!(session.score().combo, 0);
        assert_eq!(session.score().clears[0], 1);
    }

    #[test]
    fn test_soft_drop_does_not_lock() {
        let mut session = session();
        session.active.hard_drop(&session.grid);
        let y = session.active_piece().y();
        assert!(session.apply(Command::SoftDrop).is_empty());
        assert_eq!(session.active_piece().y(), y);
        assert_eq!(session.score().pieces_locked, 0);
    }

    #[test]
    fn test_line_clear_through_hard_drop() {
        let mut session = session();
        let kind = session.active_piece().kind();
        // Fill the bottom row except where the active piece lands.
        let landing = session.landing_position();
        let bottom = coord(session.grid().height()) - 1;
        let covered: Vec<_> = landing.cells().filter(|&(_, y)| y == bottom).collect();
        for x in 0..10 {
            if !covered.contains(&(x, bottom)) {
                session.grid.set(x, bottom, Cell::Occupied(ColorId::Green));
            }
        }

        let events = session.apply(Command::HardDrop);
        assert_eq!(
            events[1],
            SessionEvent::PieceLocked { kind, points: 40 }
        );
        assert_eq!(
            events[2],
            SessionEvent::LinesCleared {
                count: 1,
                points: 100,
                combo: 1
            }
        );
        assert_eq!(session.score().score, 140);
        assert_eq!(session.score().lines_cleared, 1);
        assert!(!session.grid().is_row_complete(19));
    }

    #[test]
    fn test_spawn_collision_is_game_over() {
        let mut session = session();
        block_spawn_area(&mut session);
        let events = session.apply(Command::HardDrop);
        assert!(matches!(events.last(), Some(SessionEvent::GameOver { .. })));
        assert!(session.session_state().is_game_over());

        let grid = session.grid().clone();
        let piece = *session.active_piece();
        let score = session.score().clone();
        for _ in 0..200 {
            assert!(session.tick().is_empty());
        }
        for command in [
            Command::MoveLeft,
            Command::MoveRight,
            Command::SoftDrop,
            Command::RotateCw,
            Command::RotateCcw,
            Command::HardDrop,
        ] {
            assert!(session.apply(command).is_empty());
        }
        assert!(session.apply(Command::Pause).is_empty());
        assert!(session.session_state().is_game_over());
        assert_eq!(session.grid(), &grid);
        assert_eq!(session.active_piece(), &piece);
        assert_eq!(session.score(), &score);
    }

    #[test]
    fn test_placement_failure_is_game_over() {
        let mut session = session();
        // Piece poking above the grid cannot be placed.
        session.active = ActivePiece::new(PieceKind::I, 0, -1);
        let grid = session.grid().clone();
        session.fall_timer = 59;
        session.grid.set(0, 0, Cell::Occupied(ColorId::Red));
        let grid_before = session.grid().clone();

        let events = session.tick();
        assert_eq!(
            events.as_slice(),
            [
                SessionEvent::PieceLocked {
                    kind: PieceKind::I,
                    points: 40
                },
                SessionEvent::GameOver { score: 40 }
            ]
        );
        assert!(session.session_state().is_game_over());
        assert_eq!(session.grid(), &grid_before);
        assert_ne!(session.grid(), &grid);
    }

    #[test]
    fn test_restart_from_game_over() {
        let mut session = session();
        block_spawn_area(&mut session);
        session.apply(Command::HardDrop);
        assert!(session.session_state().is_game_over());

        let events = session.apply(Command::Restart);
        assert_eq!(events[0], SessionEvent::Restarted);
        assert!(matches!(events[1], SessionEvent::PieceSpawned { .. }));
        assert_eq!(events.len(), 2);
        assert!(session.session_state().is_running());
        assert_eq!(session.grid().occupied_count(), 0);
        assert_eq!(session.score(), &ScoreState::new());
        assert_eq!(session.fall_timer(), 0);
        assert_eq!(session.active_piece().y(), 0);
    }

    #[test]
    fn test_pause_blocks_piece_commands_and_ticks() {
        let mut session = session();
        assert_eq!(
            session.apply(Command::Pause).as_slice(),
            [SessionEvent::Paused]
        );
        let piece = *session.active_piece();
        assert!(session.apply(Command::MoveLeft).is_empty());
        assert!(session.apply(Command::HardDrop).is_empty());
        for _ in 0..100 {
            assert!(session.tick().is_empty());
        }
        assert_eq!(session.active_piece(), &piece);
        assert_eq!(session.fall_timer(), 0);

        assert_eq!(
            session.apply(Command::Pause).as_slice(),
            [SessionEvent::Resumed]
        );
        assert_eq!(
            session.apply(Command::MoveLeft).as_slice(),
            [SessionEvent::PieceMoved { dx: -1, dy: 0 }]
        );
    }

    #[test]
    fn test_restart_while_paused() {
        let mut session = session();
        session.apply(Command::Pause);
        session.apply(Command::Restart);
        assert!(session.session_state().is_running());
    }

    #[test]
    fn test_quit_does_not_mutate() {
        let mut session = session();
        let piece = *session.active_piece();
        assert_eq!(
            session.apply(Command::Quit).as_slice(),
            [SessionEvent::QuitRequested]
        );
        assert_eq!(session.active_piece(), &piece);
        assert!(session.session_state().is_running());
    }

    #[test]
    fn test_level_three_fall_speed() {
        let mut session = session();
        for _ in 0..5 {
            session.score.on_lines_cleared(4);
        }
        assert_eq!(session.score().level, 3);

        // Any lock recomputes the fall speed from the level.
        session.apply(Command::HardDrop);
        assert_eq!(session.fall_speed(), 50);
        assert_eq!(session.score().multiplier.to_string(), "x1.2");
    }

    #[test]
    fn test_level_changed_event() {
        let mut session = session();
        for _ in 0..2 {
            session.score.on_lines_cleared(4);
        }
        session.score.on_lines_cleared(1);
        assert_eq!(session.score().lines_cleared, 9);

        let kind = session.active_piece().kind();
        let landing = session.landing_position();
        let bottom = 19;
        for x in 0..10 {
            if !landing.cells().any(|c| c == (x, bottom)) {
                session.grid.set(x, bottom, Cell::Occupied(ColorId::Blue));
            }
        }
        let events = session.apply(Command::HardDrop);
        assert!(events.contains(&SessionEvent::PieceLocked { kind, points: 40 }));
        assert!(events.contains(&SessionEvent::LevelChanged { level: 2 }));
        assert_eq!(session.fall_speed(), 55);
    }

    #[test]
    fn test_same_seed_same_game() {
        let script = [
            Command::MoveLeft,
            Command::RotateCw,
            Command::HardDrop,
            Command::MoveRight,
            Command::MoveRight,
            Command::HardDrop,
            Command::RotateCcw,
            Command::HardDrop,
        ];
        let mut a = session();
        let mut b = session();
        for command in script {
            assert_eq!(a.apply(command), b.apply(command));
            for _ in 0..7 {
                assert_eq!(a.tick(), b.tick());
            }
        }
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.score(), b.score());
    }

    #[test]
    fn test_session_event_serialization() {
        let json = serde_json::to_string(&SessionEvent::LinesCleared {
            count: 2,
            points: 300,
            combo: 1,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"event":"lines_cleared","count":2,"points":300,"combo":1}"#
        );
    }
}
