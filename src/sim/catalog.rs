//! Entity catalog
//!
//! Immutable templates for every physical entity kind. A body is created by
//! cloning a template and layering a [`Supplement`] of per-instance overrides
//! on top; the template itself is never touched.

use glam::Vec2;

use super::Tag;
use crate::consts::{GAME_HEIGHT, GAME_WIDTH};
use crate::physics::{BodyDesc, BodyId, BodyType, FixtureSpec, Material, PhysicsWorld, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Floor,
    LeftWall,
    RightWall,
    Platform,
    Cannon,
    Guide,
    Block,
    Player,
    Arm,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Floor,
        EntityKind::LeftWall,
        EntityKind::RightWall,
        EntityKind::Platform,
        EntityKind::Cannon,
        EntityKind::Guide,
        EntityKind::Block,
        EntityKind::Player,
        EntityKind::Arm,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// How an entity is drawn. Only consumed by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    /// Sprite sheet path
    pub sheet: &'static str,
    /// Offset of the sprite centre from the body origin
    pub offset: Vec2,
    /// Width of one sprite frame as a fraction of the drawn width
    pub clip_width: f32,
}

impl Visual {
    fn sheet(sheet: &'static str) -> Self {
        Self {
            sheet,
            offset: Vec2::ZERO,
            clip_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub body: BodyDesc,
    /// Half extents of the drawn entity
    pub size: Vec2,
    /// `None` for entities that are never drawn (floor, walls)
    pub visual: Option<Visual>,
}

/// Per-fixture override, matched to the template's fixtures by index
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixtureOverride {
    /// New half width for rectangle fixtures
    pub half_width: Option<f32>,
    pub tag: Option<Tag>,
}

impl FixtureOverride {
    pub fn tag(tag: Tag) -> Self {
        Self {
            tag: Some(tag),
            ..Default::default()
        }
    }
}

/// Per-instance overrides applied on top of a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Supplement {
    pub position: Option<Vec2>,
    pub size: Option<Vec2>,
    pub fixtures: Vec<FixtureOverride>,
}

impl Supplement {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Some(Vec2::new(x, y)),
            ..Default::default()
        }
    }

    pub fn tagged(x: f32, y: f32, tag: Tag) -> Self {
        Self {
            position: Some(Vec2::new(x, y)),
            fixtures: vec![FixtureOverride::tag(tag)],
            ..Default::default()
        }
    }
}

/// The full set of entity templates, indexed by [`EntityKind`]
#[derive(Debug, Clone)]
pub struct Catalog {
    descriptors: Vec<EntityDescriptor>,
}

impl Catalog {
    pub fn standard() -> Self {
        Self {
            descriptors: EntityKind::ALL.iter().map(|&k| template(k)).collect(),
        }
    }

    pub fn descriptor(&self, kind: EntityKind) -> &EntityDescriptor {
        &self.descriptors[kind.index()]
    }

    /// Merge the template for `kind` with `supplement`.
    ///
    /// Scalars are replaced outright; fixture overrides apply element-wise by
    /// index and overrides past the end of the template are ignored.
    pub fn instantiate(&self, kind: EntityKind, supplement: &Supplement) -> EntityDescriptor {
        let mut desc = self.descriptor(kind).clone();
        if let Some(position) = supplement.position {
            desc.body.position = position;
        }
        if let Some(size) = supplement.size {
            desc.size = size;
        }
        for (fixture, over) in desc.body.fixtures.iter_mut().zip(&supplement.fixtures) {
            if let Some(half_width) = over.half_width {
                if let Shape::Rectangle { half_extents } = &mut fixture.shape {
                    half_extents.x = half_width;
                }
            }
            if let Some(tag) = over.tag {
                fixture.tag = tag;
            }
        }
        desc
    }

    /// Instantiate and hand the body to the physics world
    pub fn spawn<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        kind: EntityKind,
        supplement: &Supplement,
    ) -> BodyId {
        let desc = self.instantiate(kind, supplement);
        world.create_body(&desc.body)
    }

    /// Friction the template gives fixture `index` of `kind`
    pub fn friction(&self, kind: EntityKind, index: usize) -> f32 {
        self.descriptor(kind)
            .body
            .fixtures
            .get(index)
            .map_or(Material::default().friction, |f| f.material.friction)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn body(body_type: BodyType, position: Vec2, fixtures: Vec<FixtureSpec>) -> BodyDesc {
    BodyDesc {
        body_type,
        position,
        fixed_rotation: false,
        fixtures,
    }
}

fn template(kind: EntityKind) -> EntityDescriptor {
    let wall = Material::new(1.0, 0.0, 0.2);
    match kind {
        EntityKind::Floor => EntityDescriptor {
            body: body(
                BodyType::Static,
                Vec2::new(GAME_WIDTH / 2.0, GAME_HEIGHT),
                vec![FixtureSpec::rectangle(
                    GAME_WIDTH / 2.0,
                    10.0,
                    Material::new(1.0, 1.0, 0.2),
                )],
            ),
            size: Vec2::new(GAME_WIDTH / 2.0, 10.0),
            visual: None,
        },
        EntityKind::LeftWall | EntityKind::RightWall => {
            let x = if kind == EntityKind::LeftWall {
                0.0
            } else {
                GAME_WIDTH
            };
            EntityDescriptor {
                body: body(
                    BodyType::Static,
                    Vec2::new(x, GAME_HEIGHT / 2.0),
                    vec![FixtureSpec::rectangle(10.0, GAME_HEIGHT / 2.0, wall)],
                ),
                size: Vec2::new(10.0, GAME_HEIGHT / 2.0),
                visual: None,
            }
        }
        // Width comes from the level; the template only fixes the thickness
        EntityKind::Platform => EntityDescriptor {
            body: body(
                BodyType::Static,
                Vec2::ZERO,
                vec![FixtureSpec::rectangle(
                    10.0,
                    10.0,
                    Material::new(1.0, 1.0, 0.2),
                )],
            ),
            size: Vec2::new(10.0, 10.0),
            visual: Some(Visual::sheet("images/platform.png")),
        },
        EntityKind::Cannon => EntityDescriptor {
            body: body(
                BodyType::Static,
                Vec2::new(GAME_WIDTH / 2.0, 0.0),
                vec![
                    FixtureSpec::circle(60.0, Material::default()),
                    FixtureSpec::rectangle(30.0, 40.0, Material::default())
                        .with_offset(Vec2::new(0.0, 90.0)),
                ],
            ),
            size: Vec2::new(60.0, 95.0),
            visual: Some(Visual {
                offset: Vec2::new(0.0, 35.0),
                ..Visual::sheet("images/Cannon.png")
            }),
        },
        EntityKind::Guide => EntityDescriptor {
            body: body(
                BodyType::Static,
                Vec2::ZERO,
                vec![FixtureSpec::rectangle(25.0, 25.0, Material::default()).with_sensor(true)],
            ),
            size: Vec2::new(25.0, 25.0),
            visual: Some(Visual::sheet("images/GuideSprites.png")),
        },
        EntityKind::Block => EntityDescriptor {
            body: body(
                BodyType::Dynamic,
                Vec2::ZERO,
                vec![FixtureSpec::rectangle(
                    25.0,
                    25.0,
                    Material::new(1.0, 0.2, 0.3),
                )],
            ),
            size: Vec2::new(25.0, 25.0),
            visual: Some(Visual::sheet("images/BlockSprites.png")),
        },
        EntityKind::Player => EntityDescriptor {
            body: BodyDesc {
                fixed_rotation: true,
                ..body(
                    BodyType::Dynamic,
                    Vec2::ZERO,
                    vec![
                        // Torso
                        FixtureSpec::rectangle(10.0, 45.0, Material::new(1.0, 0.0, 0.3))
                            .with_offset(Vec2::new(0.0, -5.0)),
                        // Feet roll on a circle so the player doesn't snag on edges
                        FixtureSpec::circle(10.0, Material::new(1.0, 0.1, 0.3))
                            .with_offset(Vec2::new(0.0, 35.0)),
                        FixtureSpec::rectangle(10.0, 6.0, Material::new(0.0, 0.0, 0.0))
                            .with_offset(Vec2::new(0.0, 51.0))
                            .with_sensor(true)
                            .with_tag(Tag::Foot),
                    ],
                )
            },
            size: Vec2::new(50.0, 50.0),
            visual: Some(Visual::sheet("images/character.png")),
        },
        EntityKind::Arm => EntityDescriptor {
            body: body(
                BodyType::Dynamic,
                Vec2::ZERO,
                vec![FixtureSpec::rectangle(4.0, 17.0, Material::new(1.0, 0.0, 0.3))],
            ),
            size: Vec2::new(4.0, 17.0),
            visual: Some(Visual::sheet("images/character_arms.png")),
        },
    }
}
