//! Game rules and session state.
//!
//! - [`ScoreEngine`] - score, level, combo, and multiplier
//! - [`PreviewQueue`] - seeded queue of upcoming piece kinds
//! - [`GameConfig`] - tunable session parameters
//! - [`Command`] and [`CommandLatch`] - player input
//! - [`GameSession`] - the state machine that ties everything together
//! - [`SessionSnapshot`] - serializable view for presentation
//!
//! # Game Flow
//!
//! 1. Create a [`GameSession`] from a validated [`GameConfig`]
//! 2. Each frame, feed the commands from [`CommandLatch::update`] to
//!    [`GameSession::apply`], then call [`GameSession::tick`]
//! 3. Pieces fall, lock, clear rows, and score until one cannot spawn
//! 4. [`Command::Restart`] starts over from any state
//!
//! ```
//! use popblock_engine::{Command, CommandLatch, GameConfig, GameSession};
//!
//! let config = GameConfig::default();
//! let mut latch = CommandLatch::new(config.soft_drop_repeat);
//! let mut session = GameSession::new(config).unwrap();
//!
//! for held in [&[Command::MoveLeft][..], &[][..], &[Command::HardDrop][..]] {
//!     for command in latch.update(held) {
//!         session.apply(command);
//!     }
//!     session.tick();
//! }
//! assert_eq!(session.score().pieces_locked, 1);
//! ```

pub use self::{command::*, config::*, preview_queue::*, score::*, session::*, snapshot::*};

mod command;
mod config;
mod preview_queue;
mod score;
mod session;
mod snapshot;
