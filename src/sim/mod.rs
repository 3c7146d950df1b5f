//! Gameplay state machine
//!
//! Everything that turns contact events and timers into game-state changes
//! lives here. The rules this module keeps:
//! - Contact callbacks only enqueue; the world is mutated after `step` returns
//! - Seeded RNG only
//! - Stable iteration order (blocks by uid, guides by index)
//! - No rendering or platform dependencies

pub mod cannon;
pub mod catalog;
pub mod contact;
pub mod frame;
pub mod placement;
pub mod player;
pub mod session;
pub mod tag;
pub mod timer;
pub mod tutorial;

pub use cannon::{Cannon, CannonAction, CannonSchedule, pick_block_type};
pub use catalog::{Catalog, EntityDescriptor, EntityKind, FixtureOverride, Supplement, Visual};
pub use frame::{FrameInput, FrameReport};
pub use placement::{CommitReport, commit_matches};
pub use player::{Manipulation, Movement, Player, PlayerPose, arm_limits};
pub use session::{Block, GamePhase, GameSession, Guide, HeldBlock, PendingMatch, PlayState};
pub use tag::{BlockUid, GuideId, Tag};
pub use timer::LevelTimer;
pub use tutorial::{Region, Trigger, TriggerContext, Tutorial, TutorialEvent, TutorialStep};
