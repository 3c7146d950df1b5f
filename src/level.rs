//! Level descriptors
//!
//! Levels are plain JSON. The built-in campaign is compiled in from
//! `assets/levels.json`.

use serde::{Deserialize, Serialize};

use crate::consts::{ANY_BLOCK_TYPE, BLOCK_TYPES};
use crate::error::LevelError;
use crate::sim::{GuideId, TutorialStep};

const CAMPAIGN_JSON: &str = include_str!("../assets/levels.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStart {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_true")]
    pub facing_right: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDesc {
    pub x: f32,
    pub y: f32,
    /// Half width in pixels
    pub width: f32,
}

/// Seconds between shots are drawn from `frequency_min..=frequency_max`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannonDesc {
    pub frequency_min: f32,
    pub frequency_max: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideDesc {
    pub id: String,
    pub x: f32,
    pub y: f32,
    /// `12` for any block, otherwise twice the wanted block type
    pub accept_type: u8,
    /// Guides that must be filled first
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDesc {
    pub x: f32,
    pub y: f32,
    pub block_type: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub name: String,
    pub player: PlayerStart,
    #[serde(default)]
    pub platforms: Vec<PlatformDesc>,
    #[serde(default)]
    pub cannon: Option<CannonDesc>,
    /// Time limit in seconds; 0 means untimed
    #[serde(default)]
    pub time: u32,
    pub guides: Vec<GuideDesc>,
    #[serde(default)]
    pub blocks: Vec<BlockDesc>,
    #[serde(default)]
    pub tutorial: Vec<TutorialStep>,
}

impl Level {
    /// Parse and validate a single level
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        for (i, guide) in self.guides.iter().enumerate() {
            if self.guides[..i].iter().any(|g| g.id == guide.id) {
                return Err(LevelError::DuplicateGuide(guide.id.clone()));
            }
            let wanted = guide.accept_type as usize / 2;
            let valid = guide.accept_type == ANY_BLOCK_TYPE
                || (guide.accept_type % 2 == 0 && wanted < BLOCK_TYPES);
            if !valid {
                return Err(LevelError::InvalidAcceptType {
                    guide: guide.id.clone(),
                    accept_type: guide.accept_type,
                });
            }
        }

        for guide in &self.guides {
            if let Some(missing) = guide
                .dependencies
                .iter()
                .find(|dep| self.guide_id(dep).is_none())
            {
                return Err(LevelError::UnknownDependency {
                    guide: guide.id.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        if let Some((index, block)) = self
            .blocks
            .iter()
            .enumerate()
            .find(|(_, b)| b.block_type as usize >= BLOCK_TYPES)
        {
            return Err(LevelError::InvalidBlockType {
                index,
                block_type: block.block_type,
            });
        }

        if let Some(cannon) = &self.cannon {
            let (min, max) = (cannon.frequency_min, cannon.frequency_max);
            if !(min.is_finite() && max.is_finite() && min >= 0.0 && min <= max) {
                return Err(LevelError::InvalidCannonFrequency { min, max });
            }
        }
        Ok(())
    }

    /// Index of the guide called `name`
    pub fn guide_id(&self, name: &str) -> Option<GuideId> {
        self.guides
            .iter()
            .position(|g| g.id == name)
            .map(|i| GuideId(i as u32))
    }
}

/// The built-in levels, in play order
pub fn campaign() -> Result<Vec<Level>, LevelError> {
    let levels: Vec<Level> = serde_json::from_str(CAMPAIGN_JSON)?;
    for level in &levels {
        level.validate()?;
    }
    Ok(levels)
}

/// One built-in level by index
pub fn campaign_level(index: usize) -> Result<Level, LevelError> {
    campaign()?
        .into_iter()
        .nth(index)
        .ok_or(LevelError::NoSuchLevel(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Trigger;

    const MINIMAL: &str = r#"{
        "player": { "x": 100, "y": 100 },
        "guides": [
            { "id": "G0", "x": 750, "y": 605, "accept_type": 12 },
            { "id": "G1", "x": 750, "y": 555, "accept_type": 4, "dependencies": ["G0"] }
        ]
    }"#;

    #[test]
    fn test_campaign_loads() {
        let levels = campaign().unwrap();
        assert_eq!(levels.len(), 5);
        assert_eq!(levels[0].guides.len(), 2);
        assert_eq!(levels[0].blocks.len(), 2);
        assert_eq!(levels[0].tutorial.len(), 3);
        assert!(levels[0].cannon.is_none());
        assert_eq!(levels[3].time, 60);
        assert_eq!(levels[4].time, 90);
        assert_eq!(levels[4].platforms.len(), 2);
        let cannon = levels[2].cannon.as_ref().unwrap();
        assert_eq!((cannon.frequency_min, cannon.frequency_max), (3.0, 6.0));
        assert!(matches!(levels[3].tutorial[0].trigger, Trigger::All(_)));
    }

    #[test]
    fn test_minimal_level_defaults() {
        let level = Level::from_json(MINIMAL).unwrap();
        assert!(level.player.facing_right);
        assert!(level.platforms.is_empty());
        assert!(level.cannon.is_none());
        assert_eq!(level.time, 0);
        assert_eq!(level.guide_id("G1"), Some(GuideId(1)));
        assert_eq!(level.guide_id("G7"), None);
    }

    #[test]
    fn test_no_such_level() {
        assert!(matches!(campaign_level(5), Err(LevelError::NoSuchLevel(5))));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Level::from_json("{"), Err(LevelError::Parse(_))));
        assert!(matches!(
            Level::from_json(r#"{ "guides": [] }"#),
            Err(LevelError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_guide() {
        let mut level = Level::from_json(MINIMAL).unwrap();
        level.guides[1].id = "G0".into();
        level.guides[1].dependencies.clear();
        assert!(matches!(
            level.validate(),
            Err(LevelError::DuplicateGuide(id)) if id == "G0"
        ));
    }

    #[test]
    fn test_unknown_dependency() {
        let mut level = Level::from_json(MINIMAL).unwrap();
        level.guides[1].dependencies.push("G3".into());
        assert!(matches!(
            level.validate(),
            Err(LevelError::UnknownDependency { dependency, .. }) if dependency == "G3"
        ));
    }

    #[test]
    fn test_invalid_accept_types() {
        for bad in [1, 7, 13, 14, 200] {
            let mut level = Level::from_json(MINIMAL).unwrap();
            level.guides[0].accept_type = bad;
            assert!(
                matches!(level.validate(), Err(LevelError::InvalidAcceptType { .. })),
                "accept type {bad}"
            );
        }
    }

    #[test]
    fn test_invalid_block_type() {
        let mut level = Level::from_json(MINIMAL).unwrap();
        level.blocks.push(BlockDesc {
            x: 0.0,
            y: 0.0,
            block_type: 3,
        });
        level.blocks.push(BlockDesc {
            x: 0.0,
            y: 0.0,
            block_type: 6,
        });
        assert!(matches!(
            level.validate(),
            Err(LevelError::InvalidBlockType {
                index: 1,
                block_type: 6
            })
        ));
    }

    #[test]
    fn test_invalid_cannon_frequency() {
        let mut level = Level::from_json(MINIMAL).unwrap();
        level.cannon = Some(CannonDesc {
            frequency_min: 4.0,
            frequency_max: 2.0,
        });
        assert!(matches!(
            level.validate(),
            Err(LevelError::InvalidCannonFrequency { .. })
        ));
        level.cannon = Some(CannonDesc {
            frequency_min: 2.0,
            frequency_max: 2.0,
        });
        assert!(level.validate().is_ok());
    }
}
