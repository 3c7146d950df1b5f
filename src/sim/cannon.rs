//! Block cannon
//!
//! The cannon idles for a short pause after each shot, then sweeps from its
//! last aim to a new random aim over the rest of the interval and fires when
//! the interval is up. Angles are in radians with 0 pointing straight down.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::catalog::Catalog;
use super::{BlockUid, PlayState};
use crate::consts::{BLOCK_TYPES, GAME_WIDTH};
use crate::physics::{BodyId, PhysicsWorld, PushMode};
use crate::shortest_sweep;
use crate::tuning::Tuning;

/// What the cannon does this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CannonAction {
    Hold,
    Rotate(f32),
    /// Snap to the angle and fire
    Fire(f32),
}

/// Aim and timing state
#[derive(Debug, Clone)]
pub struct CannonSchedule {
    frequency_min: f64,
    frequency_max: f64,
    pause: f64,

    pub last_angle: f32,
    pub next_angle: f32,
    /// Clock reading of the last shot (or of level start)
    pub last_fired: f64,
    /// Seconds from `last_fired` to the next shot
    pub next_interval: f64,
    /// Signed rotation from `last_angle` to `next_angle`
    pub sweep: f32,
}

impl CannonSchedule {
    /// Start aiming from straight down; the first interval runs from `now`
    pub fn new(
        frequency_min: f32,
        frequency_max: f32,
        pause: f32,
        now: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let mut schedule = Self {
            frequency_min: frequency_min as f64,
            frequency_max: frequency_max as f64,
            pause: pause as f64,
            last_angle: 0.0,
            next_angle: 0.0,
            last_fired: now,
            next_interval: 0.0,
            sweep: 0.0,
        };
        schedule.retarget(now, rng);
        schedule
    }

    fn retarget(&mut self, now: f64, rng: &mut impl Rng) {
        self.last_fired = now;
        self.last_angle = self.next_angle;
        self.next_angle = rng.random::<f32>() * PI - FRAC_PI_2;
        self.next_interval = self.frequency_min
            + rng.random::<f64>() * (self.frequency_max - self.frequency_min)
            + self.pause;
        self.sweep = shortest_sweep(self.last_angle, self.next_angle);
    }

    /// Decide this frame's action. Firing picks the next target.
    pub fn advance(&mut self, now: f64, rng: &mut impl Rng) -> CannonAction {
        let elapsed = now - self.last_fired;
        if elapsed >= self.next_interval {
            let angle = self.next_angle;
            self.retarget(now, rng);
            CannonAction::Fire(angle)
        } else if elapsed > self.pause {
            let progress = ((elapsed - self.pause) / (self.next_interval - self.pause)) as f32;
            CannonAction::Rotate(self.last_angle + self.sweep * progress)
        } else {
            CannonAction::Hold
        }
    }
}

/// Muzzle position and launch velocity for a shot at `angle`
pub fn launch(angle: f32, tuning: &Tuning) -> (Vec2, Vec2) {
    let a = angle + FRAC_PI_2;
    let r = tuning.cannon_muzzle_radius;
    let position = Vec2::new(GAME_WIDTH / 2.0 + r * a.cos(), r * a.sin());
    let velocity = Vec2::new(position.x - GAME_WIDTH / 2.0, position.y) / tuning.cannon_launch_divisor;
    (position, velocity)
}

/// Pick a block type, favouring types with fewer live blocks.
///
/// Type `i` has weight `highest + 1 - counts[i]`, so every type stays possible.
pub fn pick_block_type(counts: &[u32; BLOCK_TYPES], rng: &mut impl Rng) -> u8 {
    let highest = counts.iter().copied().max().unwrap_or(0);
    let weights = counts.iter().map(|&c| highest + 1 - c);
    match WeightedIndex::new(weights) {
        Ok(dist) => dist.sample(rng) as u8,
        Err(err) => {
            log::warn!("Block type weights rejected ({err}); using type 0");
            0
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cannon {
    pub body: BodyId,
    pub schedule: CannonSchedule,
}

impl Cannon {
    /// Turn or fire. Returns the uid of a freshly fired block.
    pub fn advance<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        play: &mut PlayState,
        catalog: &Catalog,
        tuning: &Tuning,
        rng: &mut impl Rng,
        now: f64,
    ) -> Option<BlockUid> {
        match self.schedule.advance(now, rng) {
            CannonAction::Hold => None,
            CannonAction::Rotate(angle) => {
                world.rotate(self.body, angle);
                None
            }
            CannonAction::Fire(angle) => {
                world.rotate(self.body, angle);
                let block_type = pick_block_type(&play.block_counts, rng);
                let (position, velocity) = launch(angle, tuning);
                let uid = play.add_block(world, catalog, position, block_type);
                if let Some(block) = play.blocks.get(&uid) {
                    world.push(block.body, Some(velocity.x), Some(velocity.y), PushMode::Add);
                }
                log::debug!("Cannon fired block {uid:?} of type {block_type} at {angle:.2} rad");
                Some(uid)
            }
        }
    }
}
