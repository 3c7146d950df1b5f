//! Stack Hack - a physics stacking puzzle
//!
//! Core modules:
//! - `sim`: Gameplay state machine (contacts, placement, carrying, cannon, frame loop)
//! - `physics`: Physics adapter contract and the rapier2d-backed world
//! - `level`: Level descriptors and the built-in campaign
//! - `platform`: Browser/native platform abstraction (key state)
//! - `tuning`: Data-driven gameplay constants

pub mod error;
pub mod level;
pub mod physics;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use error::LevelError;
pub use level::Level;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Play area dimensions in pixels (y grows downward)
    pub const GAME_WIDTH: f32 = 960.0;
    pub const GAME_HEIGHT: f32 = 640.0;

    /// Number of distinct block (present) types
    pub const BLOCK_TYPES: usize = 6;
    /// Guide accept type meaning "any block type"
    pub const ANY_BLOCK_TYPE: u8 = 12;
}

/// Wrap an angle to [0, 2π)
#[inline]
pub fn wrap_angle(mut angle: f32) -> f32 {
    use std::f32::consts::TAU;
    while angle >= TAU {
        angle -= TAU;
    }
    while angle < 0.0 {
        angle += TAU;
    }
    angle
}

/// Signed shortest rotation from `from` to `to`.
///
/// Both directions are measured wrapped to [0, 2π); the smaller magnitude wins
/// and the sign is negative when `to < from`.
pub fn shortest_sweep(from: f32, to: f32) -> f32 {
    let forward = wrap_angle(to - from);
    let backward = wrap_angle(from - to);
    let magnitude = forward.min(backward);
    if to < from { -magnitude } else { magnitude }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-FRAC_PI_2) - 1.5 * PI).abs() < 1e-5);
        assert!((wrap_angle(TAU + 0.25) - 0.25).abs() < 1e-5);
        assert_eq!(wrap_angle(0.0), 0.0);
    }

    #[test]
    fn test_shortest_sweep_sign() {
        assert!((shortest_sweep(0.0, 1.0) - 1.0).abs() < 1e-5);
        assert!((shortest_sweep(1.0, -0.5) + 1.5).abs() < 1e-5);
        assert!((shortest_sweep(-FRAC_PI_2, FRAC_PI_2) - PI).abs() < 1e-5);
    }
}
