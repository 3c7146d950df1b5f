//! Per-frame game loop
//!
//! Advances a session by one host frame with a clamped variable timestep.

use super::player::Manipulation;
use super::tutorial::{TriggerContext, TutorialEvent};
use super::{BlockUid, GamePhase, GameSession, commit_matches};
use crate::physics::PhysicsWorld;

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    /// Jump
    pub up: bool,
    /// Grab or release (space)
    pub manipulate: bool,
}

/// What happened during a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub phase: GamePhase,
    /// Physics step taken, if any
    pub dt: Option<f32>,
    pub manipulation: Option<Manipulation>,
    pub jumped: bool,
    /// Guides filled this frame
    pub filled: usize,
    pub fired: Option<BlockUid>,
    pub tutorial: Option<TutorialEvent>,
}

impl<W: PhysicsWorld> GameSession<W> {
    /// Run one frame at host clock `now` (seconds).
    ///
    /// Once the phase has left `Running` this does nothing and keeps
    /// reporting the final phase.
    pub fn frame(&mut self, input: &FrameInput, now: f64) -> FrameReport {
        if self.phase.is_over() {
            return FrameReport {
                phase: self.phase,
                ..Default::default()
            };
        }
        let mut report = FrameReport::default();

        self.player.steer(
            &mut self.world,
            &mut self.play,
            &self.tuning,
            input.left,
            input.right,
        );
        report.manipulation = self.player.manipulate(
            &mut self.world,
            &mut self.play,
            &self.catalog,
            &self.tuning,
            input.manipulate,
        );
        report.jumped = self
            .player
            .jump_and_walk(&mut self.world, &self.play, &self.tuning, input.up);

        // No step on the first frame; afterwards at most `max_step`
        if let Some(last) = self.last_update {
            let dt = ((now - last) as f32).min(self.tuning.max_step);
            if dt > 0.0 {
                self.world.step(dt, &mut self.play);
                report.dt = Some(dt);
            }
        }
        self.last_update = Some(now);

        let commit = commit_matches(&mut self.world, &mut self.play);
        report.filled = commit.committed.len();
        if commit.level_complete {
            if let Some(timer) = &mut self.timer {
                timer.stop();
            }
            self.set_phase(GamePhase::Won);
        }

        if let Some(cannon) = &mut self.cannon {
            report.fired = cannon.advance(
                &mut self.world,
                &mut self.play,
                &self.catalog,
                &self.tuning,
                &mut self.rng,
                now,
            );
        }

        let expired = self.timer.as_mut().is_some_and(|t| t.poll(now));
        if expired && !self.phase.is_over() {
            self.set_phase(GamePhase::Lost);
        }

        let ctx = TriggerContext {
            remaining_guides: self.play.remaining_guides,
            holding: self.play.held.is_some(),
            elapsed_seconds: self.elapsed_seconds(now),
        };
        report.tutorial = self.tutorial.advance(&ctx);

        report.phase = self.phase;
        report
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::info!("Level '{}': {:?} -> {:?}", self.level.name, self.phase, phase);
            self.phase = phase;
        }
    }
}
