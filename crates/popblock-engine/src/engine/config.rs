use serde::{Deserialize, Serialize};

use crate::{ConfigError, core::shape::MAX_SHAPE_SIZE};

/// Tunable parameters of a game session.
///
/// Every field has a default, so a JSON config only needs the fields it
/// changes. Unknown fields are rejected.
///
/// ```
/// use popblock_engine::GameConfig;
///
/// let config: GameConfig = serde_json::from_str(r#"{ "base_fall_time": 30 }"#).unwrap();
/// assert_eq!(config.base_fall_time, 30);
/// assert_eq!(config.grid_width, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    /// Column of the spawn anchor (top-left of the new piece's matrix).
    pub spawn_x: usize,
    pub spawn_y: usize,
    /// Ticks per row at level 1.
    pub base_fall_time: u32,
    /// Lower bound of the fall speed.
    pub min_fall_time: u32,
    /// Ticks removed from the fall speed per level above 1.
    pub fall_time_step: u32,
    /// Number of queued kinds shown to the player.
    pub preview_visible: usize,
    /// Total length of the preview queue.
    pub queue_depth: usize,
    /// Whether a held soft drop repeats every frame.
    pub soft_drop_repeat: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 10,
            grid_height: 20,
            spawn_x: 4,
            spawn_y: 0,
            base_fall_time: 60,
            min_fall_time: 10,
            fall_time_step: 5,
            preview_visible: 4,
            queue_depth: 10,
            soft_drop_repeat: true,
        }
    }
}

impl GameConfig {
    /// Checks that a session can be built from this config.
    ///
    /// The grid must fit any piece in any rotation, and so must the area
    /// below and right of the spawn anchor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            grid_width: width,
            grid_height: height,
            spawn_x: x,
            spawn_y: y,
            ..
        } = *self;
        if width < MAX_SHAPE_SIZE || height < MAX_SHAPE_SIZE {
            return Err(ConfigError::GridTooSmall { width, height });
        }
        if x + MAX_SHAPE_SIZE > width || y + MAX_SHAPE_SIZE > height {
            return Err(ConfigError::SpawnOutsideGrid {
                x,
                y,
                width,
                height,
            });
        }
        if self.queue_depth == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        if self.preview_visible > self.queue_depth {
            return Err(ConfigError::PreviewExceedsQueue {
                visible: self.preview_visible,
                depth: self.queue_depth,
            });
        }
        if self.min_fall_time == 0 {
            return Err(ConfigError::ZeroFallTime);
        }
        Ok(())
    }

    /// Ticks per row at `level`: `max(min, base - (level - 1) * step)`.
    #[must_use]
    pub fn fall_speed_for_level(&self, level: u32) -> u32 {
        let reduction = level.saturating_sub(1).saturating_mul(self.fall_time_step);
        self.base_fall_time
            .saturating_sub(reduction)
            .max(self.min_fall_time)
    }
}
