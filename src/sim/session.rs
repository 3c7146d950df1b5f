//! Game session state
//!
//! A [`GameSession`] owns the physics world and every piece of gameplay
//! state for one level. [`PlayState`] is the part the contact callbacks are
//! allowed to touch; it never sees the world.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::cannon::{Cannon, CannonSchedule};
use super::catalog::{Catalog, EntityKind, FixtureOverride, Supplement};
use super::player::{Player, PlayerPose};
use super::timer::LevelTimer;
use super::tutorial::Tutorial;
use super::{BlockUid, GuideId, Tag};
use crate::consts::BLOCK_TYPES;
use crate::error::LevelError;
use crate::level::Level;
use crate::physics::{BodyId, JointId, PhysicsWorld};
use crate::tuning::Tuning;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    Running,
    /// Every guide was filled
    Won,
    /// The level timer ran out
    Lost,
}

impl GamePhase {
    pub fn is_over(self) -> bool {
        !matches!(self, GamePhase::Running)
    }

    /// Text shown on the end-of-level screen
    pub fn message(self) -> Option<&'static str> {
        match self {
            GamePhase::Running => None,
            GamePhase::Won => Some("Level complete"),
            GamePhase::Lost => Some("You're out of time"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub uid: BlockUid,
    pub body: BodyId,
    /// 0..BLOCK_TYPES
    pub block_type: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub id: GuideId,
    /// Name from the level data
    pub name: String,
    pub body: BodyId,
    /// `ANY_BLOCK_TYPE`, twice the wanted block type, or once filled
    /// `2 * block_type + 1`
    pub accept_type: u8,
    pub dependencies: Vec<GuideId>,
    pub filled: bool,
}

/// A validated placement waiting for the post-step commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMatch {
    pub block: BlockUid,
    pub guide: GuideId,
}

/// The block welded to the player's arms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldBlock {
    pub block: BlockUid,
    pub front_joint: JointId,
    pub rear_joint: JointId,
}

/// Gameplay state reachable from contact callbacks
#[derive(Debug, Default)]
pub struct PlayState {
    // === Registries ===
    pub blocks: BTreeMap<BlockUid, Block>,
    /// Live blocks per type
    pub block_counts: [u32; BLOCK_TYPES],
    /// Indexed by `GuideId`
    pub guides: Vec<Guide>,
    pub remaining_guides: usize,

    // === Queues ===
    pub pending_matches: Vec<PendingMatch>,
    pub held: Option<HeldBlock>,
    /// Guides touched by the held block, in first-contact order
    pub pending_guide_contacts: Vec<GuideId>,

    // === Foot sensor ===
    /// Unfilled guides overlapping the foot sensor
    pub foot_guide_contacts: Vec<GuideId>,
    /// Solid things under the foot sensor
    pub foot_contacts: u32,

    next_uid: u64,
}

impl PlayState {
    pub fn holding(&self) -> Option<BlockUid> {
        self.held.map(|h| h.block)
    }

    pub fn grounded(&self) -> bool {
        self.foot_contacts > 0
    }

    pub fn guide(&self, id: GuideId) -> Option<&Guide> {
        self.guides.get(id.0 as usize)
    }

    /// Create a block body and register it under a fresh uid
    pub fn add_block<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        catalog: &Catalog,
        position: Vec2,
        block_type: u8,
    ) -> BlockUid {
        let uid = BlockUid(self.next_uid);
        self.next_uid += 1;
        let body = catalog.spawn(
            world,
            EntityKind::Block,
            &Supplement::tagged(position.x, position.y, Tag::Block(uid)),
        );
        self.blocks.insert(
            uid,
            Block {
                uid,
                body,
                block_type,
            },
        );
        if let Some(count) = self.block_counts.get_mut(block_type as usize) {
            *count += 1;
        }
        uid
    }
}

/// One level in play
pub struct GameSession<W: PhysicsWorld> {
    pub(super) world: W,
    pub(super) catalog: Catalog,
    pub(super) tuning: Tuning,
    pub(super) level: Level,
    pub(super) play: PlayState,
    pub(super) player: Player,
    pub(super) cannon: Option<Cannon>,
    pub(super) timer: Option<LevelTimer>,
    pub(super) tutorial: Tutorial,
    pub(super) rng: Pcg32,
    pub(super) phase: GamePhase,
    /// When the level started (seconds, host clock)
    pub(super) started: f64,
    /// Clock reading of the previous frame
    pub(super) last_update: Option<f64>,
}

impl<W: PhysicsWorld> GameSession<W> {
    /// Build every body for `level` in `world` and start its clocks at `now`
    pub fn new(
        mut world: W,
        level: Level,
        tuning: Tuning,
        seed: u64,
        now: f64,
    ) -> Result<Self, LevelError> {
        level.validate()?;
        let catalog = Catalog::standard();
        let mut rng = Pcg32::seed_from_u64(seed);

        for kind in [EntityKind::Floor, EntityKind::LeftWall, EntityKind::RightWall] {
            catalog.spawn(&mut world, kind, &Supplement::default());
        }

        for platform in &level.platforms {
            let supplement = Supplement {
                position: Some(Vec2::new(platform.x, platform.y)),
                size: Some(Vec2::new(platform.width, 10.0)),
                fixtures: vec![FixtureOverride {
                    half_width: Some(platform.width),
                    tag: None,
                }],
            };
            catalog.spawn(&mut world, EntityKind::Platform, &supplement);
        }

        let cannon = level.cannon.as_ref().map(|c| {
            let body = catalog.spawn(&mut world, EntityKind::Cannon, &Supplement::default());
            Cannon {
                body,
                schedule: CannonSchedule::new(
                    c.frequency_min,
                    c.frequency_max,
                    tuning.cannon_pause,
                    now,
                    &mut rng,
                ),
            }
        });

        let mut play = PlayState::default();
        for (index, desc) in level.guides.iter().enumerate() {
            let id = GuideId(index as u32);
            let body = catalog.spawn(
                &mut world,
                EntityKind::Guide,
                &Supplement::tagged(desc.x, desc.y, Tag::Guide(id)),
            );
            let dependencies = desc
                .dependencies
                .iter()
                .filter_map(|name| level.guide_id(name))
                .collect();
            play.guides.push(Guide {
                id,
                name: desc.id.clone(),
                body,
                accept_type: desc.accept_type,
                dependencies,
                filled: false,
            });
        }
        play.remaining_guides = play.guides.len();

        for desc in &level.blocks {
            play.add_block(&mut world, &catalog, Vec2::new(desc.x, desc.y), desc.block_type);
        }

        let player = Player::spawn(
            &mut world,
            &catalog,
            Vec2::new(level.player.x, level.player.y),
            level.player.facing_right,
        );

        let timer = (level.time > 0).then(|| LevelTimer::start(level.time, now));
        let tutorial = Tutorial::new(level.tutorial.clone());

        log::info!(
            "Level '{}' started: {} guides, {} blocks, cannon: {}, time limit: {}s",
            level.name,
            play.guides.len(),
            play.blocks.len(),
            cannon.is_some(),
            level.time
        );

        Ok(Self {
            world,
            catalog,
            tuning,
            level,
            play,
            player,
            cannon,
            timer,
            tutorial,
            rng,
            phase: GamePhase::Running,
            started: now,
            last_update: None,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn play(&self) -> &PlayState {
        &self.play
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn cannon(&self) -> Option<&Cannon> {
        self.cannon.as_ref()
    }

    pub fn timer(&self) -> Option<&LevelTimer> {
        self.timer.as_ref()
    }

    pub fn tutorial(&self) -> &Tutorial {
        &self.tutorial
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Sprite state for the player
    pub fn pose(&self) -> PlayerPose {
        self.player.pose(self.play.foot_contacts)
    }

    /// `mm:ss` remaining, for timed levels
    pub fn clock_text(&self, now: f64) -> Option<String> {
        self.timer.as_ref().map(|t| t.clock_text(now))
    }

    /// Whole seconds since the level started
    pub fn elapsed_seconds(&self, now: f64) -> u64 {
        (now - self.started).max(0.0).floor() as u64
    }
}
