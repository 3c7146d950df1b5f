//! Player body and the carry/release protocol
//!
//! The player is a fixed-rotation body with two hinged arms. Carrying a block
//! welds it to both arms; while carrying, the arm hinges are limited to the
//! facing side.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use super::catalog::{Catalog, EntityKind, Supplement};
use super::{BlockUid, HeldBlock, PlayState};
use crate::physics::{BodyId, FixtureUpdate, JointDesc, JointId, PhysicsWorld, PushMode};
use crate::tuning::Tuning;

/// Horizontal movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Movement {
    Left,
    #[default]
    Stop,
    Right,
}

impl Movement {
    pub fn sign(self) -> f32 {
        match self {
            Movement::Left => -1.0,
            Movement::Stop => 0.0,
            Movement::Right => 1.0,
        }
    }
}

/// Sprite state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPose {
    Airborne,
    Walking,
    Standing,
}

/// Hinge limits for the arms
pub fn arm_limits(holding: bool, facing_right: bool) -> (f32, f32) {
    match (holding, facing_right) {
        (true, true) => (0.0, PI),
        (true, false) => (-PI, 0.0),
        (false, _) => (-FRAC_PI_2, FRAC_PI_2),
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: BodyId,
    pub front_arm: BodyId,
    pub rear_arm: BodyId,
    pub front_arm_joint: JointId,
    pub rear_arm_joint: JointId,
    pub facing_right: bool,
    pub movement: Movement,
    /// Movement applied on the last frame, for sprite selection
    pub last_move: Movement,
    /// Manipulate is held down; cleared on release of the key
    manipulating: bool,
    /// Frames until another jump is accepted
    jump_cooldown: u32,
}

impl Player {
    /// Create the player at `start` with both arms hinged at the shoulder
    pub fn spawn<W: PhysicsWorld + ?Sized>(
        world: &mut W,
        catalog: &Catalog,
        start: Vec2,
        facing_right: bool,
    ) -> Self {
        let body = catalog.spawn(world, EntityKind::Player, &Supplement::at(start.x, start.y));

        let shoulder = Supplement::at(start.x, start.y - 10.0);
        let arm = |world: &mut W| {
            let arm = catalog.spawn(world, EntityKind::Arm, &shoulder);
            let joint = world.create_joint(&JointDesc::Revolute {
                body_a: body,
                body_b: arm,
                anchor_a: Vec2::new(0.0, -20.0),
                anchor_b: Vec2::new(0.0, -12.0),
                limits: Some(arm_limits(false, facing_right)),
            });
            (arm, joint)
        };
        let (rear_arm, rear_arm_joint) = arm(&mut *world);
        let (front_arm, front_arm_joint) = arm(&mut *world);

        Self {
            body,
            front_arm,
            rear_arm,
            front_arm_joint,
            rear_arm_joint,
            facing_right,
            movement: Movement::Stop,
            last_move: Movement::Stop,
            manipulating: false,
            jump_cooldown: 0,
        }
    }

    pub fn pose(&self, foot_contacts: u32) -> PlayerPose {
        if foot_contacts == 0 {
            PlayerPose::Airborne
        } else if self.last_move != Movement::Stop {
            PlayerPose::Walking
        } else {
            PlayerPose::Standing
        }
    }

    pub fn jump_cooldown(&self) -> u32 {
        self.jump_cooldown
    }

    fn apply_arm_limits<W: PhysicsWorld + ?Sized>(&self, world: &mut W, holding: bool) {
        let (lower, upper) = arm_limits(holding, self.facing_right);
        world.set_joint_limits(self.front_arm_joint, lower, upper);
        world.set_joint_limits(self.rear_arm_joint, lower, upper);
    }

    /// Apply directional keys. Right wins when both are down.
    pub fn steer<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        play: &mut PlayState,
        tuning: &Tuning,
        left: bool,
        right: bool,
    ) {
        let direction = if right {
            Movement::Right
        } else if left {
            Movement::Left
        } else {
            return;
        };

        let facing_right = direction == Movement::Right;
        let flipped = facing_right != self.facing_right;
        self.facing_right = facing_right;
        self.movement = direction;

        if flipped {
            if let Some(uid) = play.holding() {
                self.hold(world, play, tuning, uid);
            }
        }
    }

    /// Edge-triggered grab/release. Returns what happened, if anything.
    pub fn manipulate<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        play: &mut PlayState,
        catalog: &Catalog,
        tuning: &Tuning,
        pressed: bool,
    ) -> Option<Manipulation> {
        if !pressed {
            self.manipulating = false;
            return None;
        }
        if self.manipulating {
            return None;
        }
        self.manipulating = true;

        if play.held.is_some() {
            self.release(world, play, catalog).map(Manipulation::Released)
        } else {
            self.try_grab(world, play, tuning).map(Manipulation::Grabbed)
        }
    }

    /// Nearest block in the grab window ahead of the player
    pub fn grab_candidate<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        play: &PlayState,
        tuning: &Tuning,
    ) -> Option<BlockUid> {
        let me = world.locate(self.body)?.position;
        let ahead = if self.facing_right { 1.0 } else { -1.0 };

        play.blocks
            .values()
            .filter_map(|block| {
                let at = world.locate(block.body)?.position;
                let dx = (at.x - me.x) * ahead;
                let dy = at.y - me.y;
                let in_window = (tuning.grab_near..=tuning.grab_far).contains(&dx)
                    && (0.0..=tuning.grab_drop).contains(&dy);
                in_window.then(|| (block.uid, me.distance(at)))
            })
            // Strict comparison keeps the lowest uid on ties
            .fold(None, |best: Option<(BlockUid, f32)>, (uid, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((uid, d)),
            })
            .map(|(uid, _)| uid)
    }

    /// Grab the nearest eligible block. No-op while already holding.
    pub fn try_grab<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        play: &mut PlayState,
        tuning: &Tuning,
    ) -> Option<BlockUid> {
        if play.held.is_some() {
            return None;
        }
        let uid = self.grab_candidate(world, play, tuning)?;
        self.hold(world, play, tuning, uid);
        log::debug!("Grabbed block {uid:?}");
        Some(uid)
    }

    /// Weld `uid` beside the player on the facing side, replacing any
    /// existing welds. Pending guide contacts are left alone.
    fn hold<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        play: &mut PlayState,
        tuning: &Tuning,
        uid: BlockUid,
    ) {
        let Some(block_body) = play.blocks.get(&uid).map(|b| b.body) else {
            return;
        };
        let Some(me) = world.locate(self.body) else {
            log::warn!("Player body missing; cannot hold {uid:?}");
            return;
        };

        if let Some(previous) = play.held.take() {
            world.destroy_joint(previous.front_joint);
            world.destroy_joint(previous.rear_joint);
        }

        let offset = if self.facing_right {
            tuning.hold_offset
        } else {
            -tuning.hold_offset
        };
        world.place(block_body, me.position.x + offset, me.position.y, 0.0);
        world.update_fixtures(block_body, &[FixtureUpdate::friction(0.0)]);

        let weld = |arm| JointDesc::Weld {
            body_a: arm,
            body_b: block_body,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::new(0.0, tuning.hold_anchor_y),
        };
        let front_joint = world.create_joint(&weld(self.front_arm));
        let rear_joint = world.create_joint(&weld(self.rear_arm));

        play.held = Some(HeldBlock {
            block: uid,
            front_joint,
            rear_joint,
        });
        self.apply_arm_limits(world, true);
    }

    /// Drop the held block and retry the guides it touched while carried.
    /// No-op while empty-handed.
    pub fn release<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        play: &mut PlayState,
        catalog: &Catalog,
    ) -> Option<BlockUid> {
        let held = play.held.take()?;
        world.destroy_joint(held.front_joint);
        world.destroy_joint(held.rear_joint);
        if let Some(block) = play.blocks.get(&held.block) {
            world.update_fixtures(
                block.body,
                &[FixtureUpdate::friction(catalog.friction(EntityKind::Block, 0))],
            );
        }
        self.apply_arm_limits(world, false);

        let pending = std::mem::take(&mut play.pending_guide_contacts);
        for guide in pending {
            if play.attempt_place(held.block, guide) {
                break;
            }
        }
        log::debug!("Released block {:?}", held.block);
        Some(held.block)
    }

    /// Jump if asked and allowed, then drive toward the walking speed.
    /// Returns whether a jump impulse was applied.
    pub fn jump_and_walk<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        play: &PlayState,
        tuning: &Tuning,
        jump_pressed: bool,
    ) -> bool {
        let jumping = jump_pressed && play.grounded() && self.jump_cooldown == 0;
        if jumping {
            self.jump_cooldown = tuning.jump_cooldown_frames;
        }
        self.jump_cooldown = self.jump_cooldown.saturating_sub(1);

        if jumping {
            let speed = if play.held.is_some() {
                tuning.jump_speed_holding
            } else {
                tuning.jump_speed
            };
            world.push(self.body, None, Some(-speed), PushMode::Add);
        }

        world.push(
            self.body,
            Some(self.movement.sign() * tuning.walk_speed),
            None,
            PushMode::TowardTarget,
        );
        self.last_move = self.movement;

        // Standing on something: the player stops unless the key is still held
        if play.grounded() {
            self.movement = Movement::Stop;
        }
        jumping
    }
}

/// Result of a manipulate press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manipulation {
    Grabbed(BlockUid),
    Released(BlockUid),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ANY_BLOCK_TYPE;
    use crate::physics::scripted::ScriptedWorld;
    use crate::physics::ContactListener;
    use crate::sim::{Guide, GuideId, Tag};

    struct Rig {
        world: ScriptedWorld,
        catalog: Catalog,
        tuning: Tuning,
        play: PlayState,
        player: Player,
    }

    impl Rig {
        fn new() -> Self {
            let mut world = ScriptedWorld::new();
            let catalog = Catalog::standard();
            let player = Player::spawn(&mut world, &catalog, Vec2::new(100.0, 500.0), true);
            Self {
                world,
                catalog,
                tuning: Tuning::default(),
                play: PlayState::default(),
                player,
            }
        }

        fn block_at(&mut self, x: f32, y: f32) -> BlockUid {
            self.play
                .add_block(&mut self.world, &self.catalog, Vec2::new(x, y), 0)
        }

        fn guide(&mut self) -> GuideId {
            let id = GuideId(self.play.guides.len() as u32);
            let body = self.catalog.spawn(
                &mut self.world,
                EntityKind::Guide,
                &Supplement::tagged(0.0, 0.0, Tag::Guide(id)),
            );
            self.play.guides.push(Guide {
                id,
                name: format!("G{}", id.0),
                body,
                accept_type: ANY_BLOCK_TYPE,
                dependencies: Vec::new(),
                filled: false,
            });
            self.play.remaining_guides += 1;
            id
        }

        fn press(&mut self, pressed: bool) -> Option<Manipulation> {
            self.player.manipulate(
                &mut self.world,
                &mut self.play,
                &self.catalog,
                &self.tuning,
                pressed,
            )
        }

        fn steer(&mut self, left: bool, right: bool) {
            self.player
                .steer(&mut self.world, &mut self.play, &self.tuning, left, right);
        }

        fn limits(&self) -> (Option<(f32, f32)>, Option<(f32, f32)>) {
            (
                self.world.joint_limits(self.player.front_arm_joint),
                self.world.joint_limits(self.player.rear_arm_joint),
            )
        }
    }

    #[test]
    fn test_spawn_arms_and_hinges() {
        let rig = Rig::new();
        let arm = rig.world.body(rig.player.front_arm);
        assert_eq!(arm.pose.position, Vec2::new(100.0, 490.0));
        assert_eq!(rig.world.joints.len(), 2);
        let hinge = arm_limits(false, true);
        assert_eq!(rig.limits(), (Some(hinge), Some(hinge)));
    }

    #[test]
    fn test_grab_picks_nearest_in_window() {
        let mut rig = Rig::new();
        let _behind = rig.block_at(40.0, 520.0);
        let far = rig.block_at(175.0, 520.0);
        let near = rig.block_at(140.0, 560.0);
        let _too_high = rig.block_at(130.0, 480.0);

        assert_eq!(rig.press(true), Some(Manipulation::Grabbed(near)));
        assert_eq!(rig.play.holding(), Some(near));
        assert_ne!(rig.play.holding(), Some(far));
    }

    #[test]
    fn test_grab_uses_both_axes_for_distance() {
        let mut rig = Rig::new();
        // Closer horizontally but much lower
        let low = rig.block_at(130.0, 600.0);
        let level = rig.block_at(140.0, 500.0);
        assert_eq!(rig.press(true), Some(Manipulation::Grabbed(level)));
        assert_ne!(rig.play.holding(), Some(low));
    }

    #[test]
    fn test_grab_facing_left_looks_left() {
        let mut rig = Rig::new();
        rig.player.facing_right = false;
        let right = rig.block_at(150.0, 500.0);
        assert_eq!(rig.press(true), None);
        let left = rig.block_at(50.0, 500.0);
        rig.press(false);
        assert_eq!(rig.press(true), Some(Manipulation::Grabbed(left)));
        assert_ne!(rig.play.holding(), Some(right));
    }

    #[test]
    fn test_hold_welds_and_positions_block() {
        let mut rig = Rig::new();
        let uid = rig.block_at(140.0, 540.0);
        rig.press(true);

        let body = rig.play.blocks[&uid].body;
        let block = rig.world.body(body);
        assert_eq!(block.pose.position, Vec2::new(150.0, 500.0));
        assert_eq!(block.pose.angle, 0.0);
        assert_eq!(block.fixtures[0].material.friction, 0.0);
        assert_eq!(rig.world.welds_on(body), 2);

        let held = rig.play.held.unwrap();
        match rig.world.joints[&held.front_joint].desc {
            JointDesc::Weld {
                body_a,
                anchor_a,
                anchor_b,
                ..
            } => {
                assert_eq!(body_a, rig.player.front_arm);
                assert_eq!(anchor_a, Vec2::ZERO);
                assert_eq!(anchor_b, Vec2::new(0.0, -40.0));
            }
            other => panic!("expected weld, got {other:?}"),
        }
        assert_eq!(rig.limits().0, Some((0.0, PI)));
    }

    #[test]
    fn test_manipulate_is_edge_triggered() {
        let mut rig = Rig::new();
        let uid = rig.block_at(140.0, 500.0);
        assert_eq!(rig.press(true), Some(Manipulation::Grabbed(uid)));
        // Still down: nothing
        assert_eq!(rig.press(true), None);
        assert_eq!(rig.play.holding(), Some(uid));
        rig.press(false);
        assert_eq!(rig.press(true), Some(Manipulation::Released(uid)));
        assert!(rig.play.held.is_none());
    }

    #[test]
    fn test_release_restores_friction_and_limits() {
        let mut rig = Rig::new();
        let uid = rig.block_at(140.0, 500.0);
        rig.press(true);
        rig.press(false);
        rig.press(true);

        let body = rig.play.blocks[&uid].body;
        assert_eq!(rig.world.body(body).fixtures[0].material.friction, 0.2);
        assert_eq!(rig.world.welds_on(body), 0);
        let hinge = arm_limits(false, true);
        assert_eq!(rig.limits(), (Some(hinge), Some(hinge)));
    }

    #[test]
    fn test_grab_and_release_guards() {
        let mut rig = Rig::new();
        assert_eq!(
            rig.player.release(&mut rig.world, &mut rig.play, &rig.catalog),
            None
        );
        let a = rig.block_at(140.0, 500.0);
        let _b = rig.block_at(150.0, 500.0);
        rig.press(true);
        let joints = rig.world.joints.len();
        assert_eq!(
            rig.player.try_grab(&mut rig.world, &mut rig.play, &rig.tuning),
            None
        );
        assert_eq!(rig.play.holding(), Some(a));
        assert_eq!(rig.world.joints.len(), joints);
    }

    #[test]
    fn test_flip_while_holding_rebuilds_on_new_side() {
        let mut rig = Rig::new();
        let uid = rig.block_at(140.0, 500.0);
        rig.press(true);
        let g = rig.guide();
        rig.play.begin_contact(Tag::Block(uid), Tag::Guide(g));
        let before = rig.play.held.unwrap();

        rig.steer(true, false);
        let after = rig.play.held.unwrap();
        assert_ne!(before.front_joint, after.front_joint);
        assert!(!rig.world.joints.contains_key(&before.front_joint));
        assert!(!rig.world.joints.contains_key(&before.rear_joint));

        let body = rig.play.blocks[&uid].body;
        assert_eq!(rig.world.body(body).pose.position, Vec2::new(50.0, 500.0));
        assert_eq!(rig.world.welds_on(body), 2);
        assert_eq!(rig.limits().0, Some((-PI, 0.0)));
        // Flip neither replays nor forgets
        assert_eq!(rig.play.pending_guide_contacts, vec![g]);
        assert!(rig.play.pending_matches.is_empty());
    }

    #[test]
    fn test_release_replays_pending_in_order() {
        let mut rig = Rig::new();
        let uid = rig.block_at(140.0, 500.0);
        rig.press(true);
        let first = rig.guide();
        let second = rig.guide();
        rig.play.guides[first.0 as usize].accept_type = 10;
        rig.play.begin_contact(Tag::Block(uid), Tag::Guide(first));
        rig.play.begin_contact(Tag::Guide(second), Tag::Block(uid));
        assert!(rig.play.pending_matches.is_empty());

        rig.press(false);
        rig.press(true);
        // First refuses the type, second accepts; nothing after is tried
        assert_eq!(rig.play.pending_matches.len(), 1);
        assert_eq!(rig.play.pending_matches[0].guide, second);
        assert!(rig.play.pending_guide_contacts.is_empty());
    }

    #[test]
    fn test_jump_requires_ground_and_cooldown() {
        let mut rig = Rig::new();
        assert!(!rig.player.jump_and_walk(&mut rig.world, &rig.play, &rig.tuning, true));

        rig.play.foot_contacts = 1;
        assert!(rig.player.jump_and_walk(&mut rig.world, &rig.play, &rig.tuning, true));
        let v = rig.world.body(rig.player.body).velocity;
        assert_eq!(v.y, -8.0);

        let mut blocked = 0;
        while !rig.player.jump_and_walk(&mut rig.world, &rig.play, &rig.tuning, true) {
            blocked += 1;
        }
        assert_eq!(blocked, 14);
    }

    #[test]
    fn test_heavier_jump_while_holding() {
        let mut rig = Rig::new();
        rig.block_at(140.0, 500.0);
        rig.press(true);
        rig.play.foot_contacts = 1;
        rig.player.jump_and_walk(&mut rig.world, &rig.play, &rig.tuning, true);
        assert_eq!(rig.world.body(rig.player.body).velocity.y, -15.0);
    }

    #[test]
    fn test_movement_stops_when_grounded() {
        let mut rig = Rig::new();
        rig.steer(false, true);
        rig.player.jump_and_walk(&mut rig.world, &rig.play, &rig.tuning, false);
        assert_eq!(rig.world.body(rig.player.body).velocity.x, 2.0);
        // Airborne: intent carries over
        assert_eq!(rig.player.movement, Movement::Right);

        rig.play.foot_contacts = 1;
        rig.player.jump_and_walk(&mut rig.world, &rig.play, &rig.tuning, false);
        assert_eq!(rig.player.movement, Movement::Stop);
        assert_eq!(rig.player.pose(1), PlayerPose::Walking);
        rig.player.jump_and_walk(&mut rig.world, &rig.play, &rig.tuning, false);
        assert_eq!(rig.world.body(rig.player.body).velocity.x, 0.0);
        assert_eq!(rig.player.pose(1), PlayerPose::Standing);
        assert_eq!(rig.player.pose(0), PlayerPose::Airborne);
    }
}
