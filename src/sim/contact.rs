//! Contact interpretation
//!
//! Classifies begin/end transitions by fixture tag. Runs nested inside the
//! physics step with access to [`PlayState`] only, so every reaction here is
//! bookkeeping or an enqueue.

use super::tag::either;
use super::{PlayState, Tag};
use crate::physics::ContactListener;

impl ContactListener for PlayState {
    fn begin_contact(&mut self, a: Tag, b: Tag) {
        if let Some(other) = foot_partner(a, b) {
            match other.guide() {
                // Remembered in case the guide turns solid underfoot
                Some(guide) => self.foot_guide_contacts.push(guide),
                None => self.foot_contacts += 1,
            }
            return;
        }

        let (Some(block), Some(guide)) = (either(a, b, Tag::block), either(a, b, Tag::guide))
        else {
            return;
        };

        if self.holding() == Some(block) {
            if !self.pending_guide_contacts.contains(&guide) {
                self.pending_guide_contacts.push(guide);
            }
        } else {
            self.attempt_place(block, guide);
        }
    }

    fn end_contact(&mut self, a: Tag, b: Tag) {
        if let Some(other) = foot_partner(a, b) {
            match other.guide() {
                Some(guide) => {
                    if let Some(pos) = self.foot_guide_contacts.iter().position(|&g| g == guide) {
                        self.foot_guide_contacts.remove(pos);
                    }
                }
                None => self.foot_contacts = self.foot_contacts.saturating_sub(1),
            }
            return;
        }

        let (Some(block), Some(guide)) = (either(a, b, Tag::block), either(a, b, Tag::guide))
        else {
            return;
        };

        if self.holding() == Some(block) {
            self.pending_guide_contacts.retain(|&g| g != guide);
        }
    }
}

/// The other tag of a pair involving the foot sensor
fn foot_partner(a: Tag, b: Tag) -> Option<Tag> {
    match (a, b) {
        (Tag::Foot, other) | (other, Tag::Foot) => Some(other),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::consts::ANY_BLOCK_TYPE;
    use crate::physics::scripted::ScriptedWorld;
    use crate::physics::{JointId, PhysicsWorld};
    use crate::sim::{BlockUid, Catalog, EntityKind, Guide, GuideId, HeldBlock, PendingMatch};

    fn state_with_guide(accept_type: u8) -> (PlayState, BlockUid) {
        let mut world = ScriptedWorld::new();
        let catalog = Catalog::standard();
        let mut play = PlayState::default();
        let body = world.create_body(&catalog.descriptor(EntityKind::Guide).body);
        play.guides.push(Guide {
            id: GuideId(0),
            name: "G0".into(),
            body,
            accept_type,
            dependencies: Vec::new(),
            filled: false,
        });
        play.remaining_guides = 1;
        let uid = play.add_block(&mut world, &catalog, Vec2::new(0.0, 0.0), 0);
        (play, uid)
    }

    #[test]
    fn test_foot_counts_solid_contacts() {
        let mut play = PlayState::default();
        play.begin_contact(Tag::Foot, Tag::None);
        play.begin_contact(Tag::Block(BlockUid(3)), Tag::Foot);
        assert_eq!(play.foot_contacts, 2);
        play.end_contact(Tag::None, Tag::Foot);
        assert_eq!(play.foot_contacts, 1);
        play.end_contact(Tag::Foot, Tag::Completed);
        play.end_contact(Tag::Foot, Tag::None);
        assert_eq!(play.foot_contacts, 0);
    }

    #[test]
    fn test_foot_on_guide_is_tracked_separately() {
        let mut play = PlayState::default();
        play.begin_contact(Tag::Foot, Tag::Guide(GuideId(1)));
        assert_eq!(play.foot_contacts, 0);
        assert_eq!(play.foot_guide_contacts, vec![GuideId(1)]);
        play.end_contact(Tag::Guide(GuideId(1)), Tag::Foot);
        assert!(play.foot_guide_contacts.is_empty());
    }

    #[test]
    fn test_free_block_on_guide_queues_match() {
        let (mut play, uid) = state_with_guide(ANY_BLOCK_TYPE);
        play.begin_contact(Tag::Guide(GuideId(0)), Tag::Block(uid));
        assert_eq!(
            play.pending_matches,
            vec![PendingMatch {
                block: uid,
                guide: GuideId(0)
            }]
        );
        // End contact of a free block is ignored
        play.end_contact(Tag::Guide(GuideId(0)), Tag::Block(uid));
        assert_eq!(play.pending_matches.len(), 1);
    }

    #[test]
    fn test_held_block_on_guide_is_deferred() {
        let (mut play, uid) = state_with_guide(ANY_BLOCK_TYPE);
        play.held = Some(HeldBlock {
            block: uid,
            front_joint: JointId(0),
            rear_joint: JointId(1),
        });
        play.begin_contact(Tag::Block(uid), Tag::Guide(GuideId(0)));
        play.begin_contact(Tag::Block(uid), Tag::Guide(GuideId(0)));
        assert!(play.pending_matches.is_empty());
        assert_eq!(play.pending_guide_contacts, vec![GuideId(0)]);

        play.end_contact(Tag::Guide(GuideId(0)), Tag::Block(uid));
        assert!(play.pending_guide_contacts.is_empty());
    }

    #[test]
    fn test_unrelated_pairs_are_ignored() {
        let (mut play, uid) = state_with_guide(ANY_BLOCK_TYPE);
        play.begin_contact(Tag::Block(uid), Tag::None);
        play.begin_contact(Tag::Block(uid), Tag::Completed);
        play.begin_contact(Tag::Guide(GuideId(0)), Tag::None);
        assert!(play.pending_matches.is_empty());
        assert_eq!(play.foot_contacts, 0);
    }
}
