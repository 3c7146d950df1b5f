//! Gameplay tuning
//!
//! Balance knobs live here rather than inline in the simulation so they can be
//! overridden from JSON without recompiling.

use serde::{Deserialize, Serialize};

/// Data-driven gameplay constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Movement ===
    /// Horizontal velocity target while walking (m/s)
    pub walk_speed: f32,
    /// Upward velocity added by a jump (m/s)
    pub jump_speed: f32,
    /// Upward velocity added by a jump while carrying a block
    pub jump_speed_holding: f32,
    /// Frames before another jump is accepted
    pub jump_cooldown_frames: u32,

    // === Stepping ===
    /// Largest physics step taken per frame (seconds)
    pub max_step: f32,
    /// Pixels per metre
    pub physics_scale: f32,
    /// Downward gravity (m/s²)
    pub gravity: f32,
    /// Constraint solver iterations per step
    pub solver_iterations: usize,

    // === Carrying ===
    /// Nearest horizontal distance ahead of the player a block can be grabbed from
    pub grab_near: f32,
    /// Farthest horizontal distance ahead of the player
    pub grab_far: f32,
    /// Vertical band below the player's centre (pixels, y-down)
    pub grab_drop: f32,
    /// Horizontal offset of a held block from the player's centre
    pub hold_offset: f32,
    /// Weld anchor on the held block, local to the block (pixels)
    pub hold_anchor_y: f32,

    // === Cannon ===
    /// Pause after firing before the cannon starts to turn (seconds)
    pub cannon_pause: f32,
    /// Distance from the cannon pivot to its mouth (pixels)
    pub cannon_muzzle_radius: f32,
    /// Launch velocity is the muzzle offset divided by this
    pub cannon_launch_divisor: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            jump_speed: 8.0,
            jump_speed_holding: 15.0,
            jump_cooldown_frames: 15,

            max_step: 2.0 / 60.0,
            physics_scale: 60.0,
            gravity: 9.8,
            solver_iterations: 8,

            grab_near: 25.0,
            grab_far: 75.0,
            grab_drop: 100.0,
            hold_offset: 50.0,
            hold_anchor_y: -40.0,

            cannon_pause: 0.5,
            cannon_muzzle_radius: 130.0,
            cannon_launch_divisor: 10.0,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
