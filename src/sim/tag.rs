//! Fixture identity tags
//!
//! Every fixture carries a [`Tag`] so contact callbacks can classify a pair
//! without looking anything up.

use serde::{Deserialize, Serialize};

/// Index of a guide within its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuideId(pub u32);

/// Unique id of a block, minted from a per-level counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockUid(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tag {
    /// Untagged fixture (walls, platforms, player torso, arms)
    #[default]
    None,
    /// The player's foot sensor
    Foot,
    /// An unfilled guide
    Guide(GuideId),
    /// A guide that has been filled and turned solid
    Completed,
    Block(BlockUid),
}

impl Tag {
    pub fn guide(self) -> Option<GuideId> {
        match self {
            Tag::Guide(id) => Some(id),
            _ => None,
        }
    }

    pub fn block(self) -> Option<BlockUid> {
        match self {
            Tag::Block(uid) => Some(uid),
            _ => None,
        }
    }
}

/// Pick the first tag of a pair satisfying `f`, in either order
pub fn either<T>(a: Tag, b: Tag, f: impl Fn(Tag) -> Option<T>) -> Option<T> {
    f(a).or_else(|| f(b))
}
