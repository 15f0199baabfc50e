use std::{fmt, str::FromStr};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::ParseCommandError;

/// Discrete player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateCw,
    RotateCcw,
    HardDrop,
    Pause,
    Restart,
    Quit,
}

impl Command {
    pub const LEN: usize = 9;

    pub const ALL: [Self; Self::LEN] = [
        Self::MoveLeft,
        Self::MoveRight,
        Self::SoftDrop,
        Self::RotateCw,
        Self::RotateCcw,
        Self::HardDrop,
        Self::Pause,
        Self::Restart,
        Self::Quit,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Canonical token, accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MoveLeft => "left",
            Self::MoveRight => "right",
            Self::SoftDrop => "down",
            Self::RotateCw => "rotate_cw",
            Self::RotateCcw => "rotate_ccw",
            Self::HardDrop => "hard_drop",
            Self::Pause => "pause",
            Self::Restart => "restart",
            Self::Quit => "quit",
        }
    }

    /// Returns `true` for commands that manipulate the active piece.
    #[must_use]
    pub const fn is_piece_command(self) -> bool {
        !matches!(self, Self::Pause | Self::Restart | Self::Quit)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a command token.
///
/// Matching ignores ASCII case, `_`, and `-`, so `hard_drop`, `HardDrop`, and
/// `hard-drop` are the same token.
impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let command = match normalized.as_str() {
            "left" | "moveleft" => Self::MoveLeft,
            "right" | "moveright" => Self::MoveRight,
            "down" | "softdrop" => Self::SoftDrop,
            "rotatecw" | "cw" | "rotate" => Self::RotateCw,
            "rotateccw" | "ccw" => Self::RotateCcw,
            "harddrop" | "drop" => Self::HardDrop,
            "pause" => Self::Pause,
            "restart" => Self::Restart,
            "quit" => Self::Quit,
            _ => {
                return Err(ParseCommandError {
                    token: s.to_owned(),
                });
            }
        };
        Ok(command)
    }
}

/// Commands emitted for one frame by [`CommandLatch::update`].
pub type FrameCommands = ArrayVec<Command, 6>;

/// Turns per-frame sets of held commands into edge-triggered commands.
///
/// A command fires on the frame its input goes from released to held, not
/// while it stays held. Soft drop optionally fires on every held frame.
///
/// At most one movement (left, right, soft drop) and one rotation fire per
/// frame. Emission order is quit, restart, pause, movement, rotation, hard
/// drop. Quit and restart end the frame.
///
/// # Example
///
/// ```
/// use popblock_engine::{Command, CommandLatch};
///
/// let mut latch = CommandLatch::new(false);
/// assert_eq!(latch.update(&[Command::MoveLeft]).as_slice(), [Command::MoveLeft]);
/// assert!(latch.update(&[Command::MoveLeft]).is_empty());
/// assert!(latch.update(&[]).is_empty());
/// assert_eq!(latch.update(&[Command::MoveLeft]).as_slice(), [Command::MoveLeft]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandLatch {
    held: [bool; Command::LEN],
    soft_drop_repeat: bool,
}

impl CommandLatch {
    #[must_use]
    pub const fn new(soft_drop_repeat: bool) -> Self {
        Self {
            held: [false; Command::LEN],
            soft_drop_repeat,
        }
    }

    /// Releases every held input.
    pub fn reset(&mut self) {
        self.held = [false; Command::LEN];
    }

    /// Records the inputs held this frame and returns the commands to apply.
    pub fn update(&mut self, held: &[Command]) -> FrameCommands {
        let mut now = [false; Command::LEN];
        for command in held {
            now[command.index()] = true;
        }
        let fired = |command: Command| {
            let i = command.index();
            let repeat = command == Command::SoftDrop && self.soft_drop_repeat;
            now[i] && (repeat || !self.held[i])
        };

        let mut out = FrameCommands::new();
        'frame: {
            for terminal in [Command::Quit, Command::Restart] {
                if fired(terminal) {
                    out.push(terminal);
                    break 'frame;
                }
            }
            let groups: [&[Command]; 4] = [
                &[Command::Pause],
                &[Command::MoveLeft, Command::MoveRight, Command::SoftDrop],
                &[Command::RotateCw, Command::RotateCcw],
                &[Command::HardDrop],
            ];
            for group in groups {
                if let Some(&command) = group.iter().find(|&&c| fired(c)) {
                    out.push(command);
                }
            }
        }

        self.held = now;
        out
    }
}
