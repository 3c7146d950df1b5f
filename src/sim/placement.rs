//! Block placement
//!
//! Placements are validated as contacts arrive and committed in one batch
//! after the step. Dependencies are checked against the state before the
//! batch, so a guide never fills in the same step as one of its prerequisites.

use super::session::Guide;
use super::{BlockUid, GuideId, PendingMatch, PlayState, Tag};
use crate::consts::ANY_BLOCK_TYPE;
use crate::physics::{FixtureUpdate, PhysicsWorld};

impl Guide {
    /// Whether a block of `block_type` fits this guide
    pub fn accepts(&self, block_type: u8) -> bool {
        !self.filled
            && (self.accept_type == ANY_BLOCK_TYPE || block_type.checked_mul(2) == Some(self.accept_type))
    }
}

impl PlayState {
    /// Queue `block` for `guide` if the pair is valid right now.
    ///
    /// Returns `false` without side effects when the guide refuses the type,
    /// the block is already queued, or a dependency is still unfilled.
    pub fn attempt_place(&mut self, block: BlockUid, guide: GuideId) -> bool {
        let Some(block_type) = self.blocks.get(&block).map(|b| b.block_type) else {
            log::debug!("Placement of unknown block {block:?} ignored");
            return false;
        };
        let Some(target) = self.guide(guide) else {
            log::debug!("Placement into unknown guide {guide:?} ignored");
            return false;
        };

        if !target.accepts(block_type) {
            log::debug!(
                "Guide {} refuses block {:?} of type {block_type}",
                target.name,
                block
            );
            return false;
        }
        if self.pending_matches.iter().any(|m| m.block == block) {
            return false;
        }
        if let Some(missing) = target
            .dependencies
            .iter()
            .find(|dep| !self.guide(**dep).is_some_and(|g| g.filled))
        {
            log::debug!("Guide {} waits on {missing:?}", target.name);
            return false;
        }

        log::debug!("Queued block {block:?} for guide {}", target.name);
        self.pending_matches.push(PendingMatch { block, guide });
        true
    }
}

/// Outcome of one commit pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReport {
    pub committed: Vec<PendingMatch>,
    /// No unfilled guides remain
    pub level_complete: bool,
}

/// Apply every queued placement, in queue order
pub fn commit_matches<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    play: &mut PlayState,
) -> CommitReport {
    let queue = std::mem::take(&mut play.pending_matches);
    let mut committed = Vec::with_capacity(queue.len());

    for m in queue {
        let Some(block) = play.blocks.remove(&m.block) else {
            continue;
        };
        let Some(guide) = play.guides.get_mut(m.guide.0 as usize) else {
            continue;
        };
        if guide.filled {
            // Put the block back; another match took this guide first
            play.blocks.insert(block.uid, block);
            continue;
        }

        if let Some(held) = play.held.filter(|h| h.block == block.uid) {
            log::warn!("Committing held block {:?}; dropping its welds", block.uid);
            world.destroy_joint(held.front_joint);
            world.destroy_joint(held.rear_joint);
            play.held = None;
            play.pending_guide_contacts.clear();
        }

        world.destroy_body(block.body);
        if let Some(count) = play.block_counts.get_mut(block.block_type as usize) {
            *count = count.saturating_sub(1);
        }

        guide.filled = true;
        guide.accept_type = block.block_type * 2 + 1;
        world.update_fixtures(
            guide.body,
            &[FixtureUpdate {
                sensor: Some(false),
                tag: Some(Tag::Completed),
                friction: None,
            }],
        );
        play.remaining_guides = play.remaining_guides.saturating_sub(1);

        // The foot was on this guide; it is now solid ground
        if let Some(pos) = play.foot_guide_contacts.iter().position(|&g| g == m.guide) {
            play.foot_guide_contacts.remove(pos);
            play.foot_contacts += 1;
        }

        log::debug!("Guide {} filled with block {:?}", guide.name, block.uid);
        committed.push(m);
    }

    CommitReport {
        committed,
        level_complete: play.remaining_guides == 0,
    }
}
