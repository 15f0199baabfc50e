//! Property tests for grid compaction, rotation, collision, scoring, and the
//! session state machine under arbitrary input.

use popblock_engine::{
    ActivePiece, Cell, ColorId, Command, GameConfig, GameSession, Grid, PieceKind, PieceSeed,
    PreviewQueue, RotationDirection, ScoreEngine, SessionState,
};
use proptest::prelude::*;

const W: usize = 10;
const H: usize = 20;

fn kind() -> impl Strategy<Value = PieceKind> {
    prop::sample::select(PieceKind::ALL.to_vec())
}

fn command() -> impl Strategy<Value = Command> {
    prop::sample::select(Command::ALL.to_vec())
}

/// Grid whose rows are either complete or contain a marker column.
///
/// Every incomplete row gets a distinct pattern so row order can be tracked.
fn grid_with_rows(complete: &[bool]) -> Grid {
    let mut grid = Grid::new(W, H);
    for (y, &full) in complete.iter().enumerate() {
        let y = i32::try_from(y).unwrap();
        if full {
            for x in 0..10 {
                grid.set(x, y, Cell::Occupied(ColorId::Red));
            }
        } else {
            grid.set(y % 10, y, Cell::Occupied(ColorId::Blue));
            if y >= 10 {
                grid.set(9, y, Cell::Occupied(ColorId::Green));
            }
        }
    }
    grid
}

fn row_strings(grid: &Grid) -> Vec<String> {
    grid.rows()
        .map(|row| row.iter().map(|c| c.code()).collect())
        .collect()
}

proptest! {
    #[test]
    fn clearing_completed_rows_compacts(complete in prop::collection::vec(any::<bool>(), H)) {
        let mut grid = grid_with_rows(&complete);
        let before = row_strings(&grid);
        let rows = grid.completed_rows();
        let expected_rows: Vec<_> = (0..H).filter(|&y| complete[y]).collect();
        prop_assert_eq!(&rows, &expected_rows);

        grid.clear_rows(&rows);
        prop_assert_eq!(grid.width(), W);
        prop_assert_eq!(grid.height(), H);

        let after = row_strings(&grid);
        let empty = ".".repeat(W);
        let kept: Vec<_> = before
            .iter()
            .enumerate()
            .filter(|(y, _)| !complete[*y])
            .map(|(_, row)| row.clone())
            .collect();
        prop_assert!(after[..rows.len()].iter().all(|row| *row == empty));
        prop_assert_eq!(&after[rows.len()..], &kept[..]);
        prop_assert!(grid.completed_rows().is_empty());
    }

    #[test]
    fn clearing_arbitrary_row_subset_preserves_order(
        remove in prop::collection::btree_set(0..H, 0..=8),
    ) {
        let mut grid = Grid::new(W, H);
        for y in 0..H {
            let yi = i32::try_from(y).unwrap();
            grid.set(yi % 10, yi, Cell::Occupied(ColorId::Purple));
            grid.set((yi / 10) + 5, yi, Cell::Occupied(ColorId::Orange));
        }
        let before = row_strings(&grid);
        let rows: Vec<_> = remove.iter().copied().rev().collect();
        grid.clear_rows(&rows);

        let after = row_strings(&grid);
        let kept: Vec<_> = (0..H).filter(|y| !remove.contains(y)).map(|y| before[y].clone()).collect();
        prop_assert_eq!(&after[remove.len()..], &kept[..]);
        let kept_cells = kept.iter().flat_map(|row| row.chars()).filter(|&c| c != '.').count();
        prop_assert_eq!(grid.occupied_count(), kept_cells);
    }

    #[test]
    fn four_rotations_restore_shape(kind in kind(), ccw in any::<bool>()) {
        let grid = Grid::new(W, H);
        let direction = if ccw {
            RotationDirection::CounterClockwise
        } else {
            RotationDirection::Clockwise
        };
        let mut piece = ActivePiece::new(kind, 3, 8);
        let original = *piece.current_shape();
        for _ in 0..4 {
            prop_assert!(piece.try_rotate(direction, &grid));
        }
        prop_assert_eq!(*piece.current_shape(), original);
        prop_assert_eq!(piece, ActivePiece::new(kind, 3, 8));
    }

    #[test]
    fn collision_matches_bounds(
        kind in kind(),
        rotations in 0usize..4,
        x in -5i32..15,
        y in -6i32..25,
    ) {
        let grid = Grid::new(W, H);
        let mut piece = ActivePiece::new(kind, x, y);
        for _ in 0..rotations {
            piece = piece.rotated(RotationDirection::Clockwise);
        }
        let out_of_bounds = piece
            .cells()
            .any(|(cx, cy)| cx < 0 || cx >= 10 || cy >= 20);
        prop_assert_eq!(grid.is_collision(&piece, 0, 0), out_of_bounds);
    }

    #[test]
    fn collision_with_occupied_cell(kind in kind(), x in 0i32..6, y in 0i32..16) {
        let mut grid = Grid::new(W, H);
        let piece = ActivePiece::new(kind, x, y);
        prop_assert!(!grid.is_collision(&piece, 0, 0));
        let (cx, cy) = piece.cells().last().unwrap();
        grid.set(cx, cy, Cell::Occupied(ColorId::Yellow));
        prop_assert!(grid.is_collision(&piece, 0, 0));
    }

    #[test]
    fn score_is_deterministic(
        events in prop::collection::vec((kind(), 0usize..6), 0..60),
    ) {
        let run = || {
            let mut score = ScoreEngine::new();
            for &(kind, rows) in &events {
                score.on_piece_locked(&ActivePiece::new(kind, 0, 0));
                score.on_lines_cleared(rows);
            }
            score.state().clone()
        };
        let a = run();
        let b = run();
        prop_assert_eq!(&a, &b);

        let lines: usize = events.iter().map(|&(_, rows)| rows).sum();
        prop_assert_eq!(a.lines_cleared as usize, lines);
        prop_assert_eq!(a.level as usize, lines / 10 + 1);
        prop_assert_eq!(a.multiplier.tenths(), 10 + a.level - 1);
        prop_assert_eq!(a.pieces_locked as usize, events.len());
        let trailing = events.iter().rev().take_while(|&&(_, rows)| rows > 0).count();
        prop_assert_eq!(a.combo as usize, trailing);
    }

    #[test]
    fn preview_queue_length_is_constant(
        seed in any::<[u8; 16]>(),
        depth in 1usize..12,
        pops in 0usize..100,
    ) {
        let mut queue = PreviewQueue::with_seed(depth, PieceSeed::from_bytes(seed));
        for _ in 0..pops {
            queue.pop_next();
            prop_assert_eq!(queue.len(), depth);
        }
    }

    #[test]
    fn random_play_keeps_session_invariants(
        seed in any::<[u8; 16]>(),
        steps in prop::collection::vec((command(), 0u32..40), 1..120),
    ) {
        let mut session =
            GameSession::with_seed(GameConfig::default(), PieceSeed::from_bytes(seed)).unwrap();
        let mut last_score = 0;
        for (command, ticks) in steps {
            if command == Command::Restart {
                last_score = 0;
            }
            let was_over = session.session_state().is_game_over();
            let grid_before = session.grid().clone();
            session.apply(command);
            for _ in 0..ticks {
                session.tick();
            }

            let grid = session.grid();
            prop_assert_eq!(grid.width(), W);
            prop_assert_eq!(grid.height(), H);
            prop_assert!(grid.completed_rows().is_empty());
            prop_assert_eq!(session.preview_queue().len(), 10);
            prop_assert!(session.score().score >= last_score);
            last_score = session.score().score;

            let state = session.session_state();
            if was_over && command != Command::Restart {
                prop_assert_eq!(state, SessionState::GameOver);
                prop_assert_eq!(grid, &grid_before);
            }
            if state.is_running() {
                prop_assert!(!grid.is_collision(session.active_piece(), 0, 0));
            }
        }
    }
}
