use std::{collections::BTreeMap, path::PathBuf};

use popblock_engine::{
    Command, CommandLatch, GameConfig, GameSession, PieceSeed, ScoreState, SessionEvent,
    SessionSnapshot, SessionState,
};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Game config JSON file; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Piece seed as 32 hex digits (random if omitted)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Maximum number of frames to simulate
    #[arg(long, default_value_t = 10_000)]
    ticks: usize,
    /// Script file with one frame of held command tokens per line
    #[arg(long)]
    script: Option<PathBuf>,
    /// Include the final board snapshot in the summary
    #[arg(long)]
    board: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Source of the commands held during each frame.
trait Player {
    /// Returns the held commands for the next frame, or `None` when done.
    fn next_frame(&mut self, session: &GameSession) -> Option<Vec<Command>>;
}

#[derive(Debug)]
struct ScriptPlayer {
    frames: std::vec::IntoIter<Vec<Command>>,
}

impl ScriptPlayer {
    /// Parses a script, returning the player and the number of unknown tokens.
    ///
    /// Blank lines are frames with nothing held. Text after `#` is ignored.
    fn parse(script: &str) -> (Self, usize) {
        let mut unknown = 0;
        let frames = script
            .lines()
            .map(|line| {
                let line = line.split_once('#').map_or(line, |(code, _)| code);
                line.split_whitespace()
                    .filter_map(|token| match token.parse::<Command>() {
                        Ok(command) => Some(command),
                        Err(e) => {
                            eprintln!("Ignoring {e}");
                            unknown += 1;
                            None
                        }
                    })
                    .collect()
            })
            .collect::<Vec<_>>();
        let player = Self {
            frames: frames.into_iter(),
        };
        (player, unknown)
    }
}

impl Player for ScriptPlayer {
    fn next_frame(&mut self, _session: &GameSession) -> Option<Vec<Command>> {
        self.frames.next()
    }
}

/// Presses random piece commands until the game is over.
#[derive(Debug)]
struct RandomPlayer {
    rng: Pcg32,
}

impl RandomPlayer {
    const MOVES: [Command; 5] = [
        Command::MoveLeft,
        Command::MoveRight,
        Command::SoftDrop,
        Command::RotateCw,
        Command::RotateCcw,
    ];
}

impl Player for RandomPlayer {
    fn next_frame(&mut self, session: &GameSession) -> Option<Vec<Command>> {
        if session.session_state().is_game_over() {
            return None;
        }
        let held = match self.rng.random_range(0..8) {
            0..3 => vec![Self::MOVES[self.rng.random_range(0..Self::MOVES.len())]],
            3 => vec![Command::HardDrop],
            _ => vec![],
        };
        Some(held)
    }
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    seed: PieceSeed,
    player: &'static str,
    frames: usize,
    unknown_tokens: usize,
    quit: bool,
    state: SessionState,
    score: ScoreState,
    events: BTreeMap<&'static str, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<SessionSnapshot>,
}

fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::Restarted => "restarted",
        SessionEvent::PieceSpawned { .. } => "piece_spawned",
        SessionEvent::PieceMoved { .. } => "piece_moved",
        SessionEvent::PieceRotated { .. } => "piece_rotated",
        SessionEvent::HardDropped { .. } => "hard_dropped",
        SessionEvent::PieceLocked { .. } => "piece_locked",
        SessionEvent::LinesCleared { .. } => "lines_cleared",
        SessionEvent::LevelChanged { .. } => "level_changed",
        SessionEvent::Paused => "paused",
        SessionEvent::Resumed => "resumed",
        SessionEvent::GameOver { .. } => "game_over",
        SessionEvent::QuitRequested => "quit_requested",
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        config,
        seed,
        ticks,
        script,
        board,
        output,
    } = arg;

    let config: GameConfig = match config {
        Some(path) => util::read_json_file("config", path)?,
        None => GameConfig::default(),
    };
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut latch = CommandLatch::new(config.soft_drop_repeat);
    let mut session = GameSession::with_seed(config, seed)?;

    let (mut player, player_name, unknown_tokens): (Box<dyn Player>, _, _) = match script {
        Some(path) => {
            let text = util::read_text_file("script", path)?;
            let (player, unknown) = ScriptPlayer::parse(&text);
            (Box::new(player), "script", unknown)
        }
        None => {
            let rng = Pcg32::from_seed(*seed.as_bytes());
            (Box::new(RandomPlayer { rng }), "random", 0)
        }
    };

    eprintln!("Simulating up to {ticks} frames with seed {seed} ({player_name} player)...");

    let mut events = BTreeMap::new();
    let mut record = |step: &[SessionEvent]| {
        let mut quit = false;
        for event in step {
            *events.entry(event_name(event)).or_insert(0) += 1;
            quit |= matches!(event, SessionEvent::QuitRequested);
        }
        quit
    };

    let mut frames = 0;
    let mut quit = false;
    while frames < *ticks {
        let Some(held) = player.next_frame(&session) else {
            break;
        };
        frames += 1;
        for command in latch.update(&held) {
            quit |= record(&session.apply(command));
        }
        if quit {
            break;
        }
        record(&session.tick());
    }

    let score = session.score();
    eprintln!(
        "Finished after {frames} frames: {:?}, score {}, level {}, lines {}",
        session.session_state(),
        score.score,
        score.level,
        score.lines_cleared
    );

    let summary = SimulationSummary {
        seed,
        player: player_name,
        frames,
        unknown_tokens,
        quit,
        state: session.session_state(),
        score: score.clone(),
        events,
        snapshot: board.then(|| session.snapshot()),
    };
    Output::save_json(&summary, output.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;

    use super::*;

    fn session() -> GameSession {
        GameSession::with_seed(GameConfig::default(), PieceSeed::from_bytes([9; 16])).unwrap()
    }

    #[test]
    fn test_script_parsing() {
        let script = "left right\n\n# comment only\nhard_drop jump # trailing\nfly\n";
        let (mut player, unknown) = ScriptPlayer::parse(script);
        let session = session();
        assert_eq!(unknown, 2);
        assert_eq!(
            player.next_frame(&session),
            Some(vec![Command::MoveLeft, Command::MoveRight])
        );
        assert_eq!(player.next_frame(&session), Some(vec![]));
        assert_eq!(player.next_frame(&session), Some(vec![]));
        assert_eq!(player.next_frame(&session), Some(vec![Command::HardDrop]));
        assert_eq!(player.next_frame(&session), Some(vec![]));
        assert_eq!(player.next_frame(&session), None);
    }

    #[test]
    fn test_random_player_is_seeded() {
        let session = session();
        let mut a = RandomPlayer {
            rng: Pcg32::seed_from_u64(1),
        };
        let mut b = RandomPlayer {
            rng: Pcg32::seed_from_u64(1),
        };
        for _ in 0..100 {
            let frame = a.next_frame(&session);
            assert!(frame.as_ref().is_some_and(|held| held.len() <= 1));
            assert_eq!(frame, b.next_frame(&session));
        }
    }

    #[test]
    fn test_event_names_match_serialized_tags() {
        let events = [
            SessionEvent::Restarted,
            SessionEvent::LinesCleared {
                count: 1,
                points: 100,
                combo: 1,
            },
            SessionEvent::QuitRequested,
        ];
        for event in events {
            let value = serde_json::to_value(event).unwrap();
            assert_eq!(value["event"], event_name(&event));
        }
    }
}
