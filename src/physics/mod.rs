//! Physics adapter contract
//!
//! The gameplay core talks to the rigid-body engine only through
//! [`PhysicsWorld`]. Positions and anchors are in pixels (y-down); velocities
//! passed to [`PhysicsWorld::push`] are in engine units (m/s).
//!
//! Contact callbacks are delivered to a [`ContactListener`] from inside
//! [`PhysicsWorld::step`]. The listener never sees the world, so it cannot
//! create or destroy bodies mid-step.

pub mod rapier;
#[cfg(test)]
pub mod scripted;

use glam::Vec2;

use crate::sim::Tag;

pub use rapier::RapierWorld;

/// Opaque handle to a body owned by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub(crate) u32);

/// Opaque handle to a joint owned by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Static,
    Dynamic,
}

/// Physical material of a fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Material {
    pub const fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        // Box2D fixture defaults
        Self::new(0.0, 0.2, 0.0)
    }
}

/// Fixture geometry (pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rectangle { half_extents: Vec2 },
    Circle { radius: f32 },
}

/// One fixture of a body, in creation order
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSpec {
    pub shape: Shape,
    /// Offset of the fixture from the body origin
    pub offset: Vec2,
    /// Rotation of the fixture relative to the body
    pub angle: f32,
    pub material: Material,
    pub sensor: bool,
    pub tag: Tag,
}

impl FixtureSpec {
    pub fn rectangle(half_width: f32, half_height: f32, material: Material) -> Self {
        Self {
            shape: Shape::Rectangle {
                half_extents: Vec2::new(half_width, half_height),
            },
            offset: Vec2::ZERO,
            angle: 0.0,
            material,
            sensor: false,
            tag: Tag::None,
        }
    }

    pub fn circle(radius: f32, material: Material) -> Self {
        Self {
            shape: Shape::Circle { radius },
            offset: Vec2::ZERO,
            angle: 0.0,
            material,
            sensor: false,
            tag: Tag::None,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }
}

/// Concrete body creation request
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub fixed_rotation: bool,
    pub fixtures: Vec<FixtureSpec>,
}

/// Joint creation request. Anchors are local to their body, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointDesc {
    /// Hinge, optionally limited to `(lower, upper)` radians
    Revolute {
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
        limits: Option<(f32, f32)>,
    },
    /// Keeps the anchors `length` pixels apart
    Distance {
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
        length: f32,
    },
    /// Rigidly locks the anchors together
    Weld {
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
    },
}

/// Position (pixels) and angle (radians) of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f32,
}

/// How a velocity passed to [`PhysicsWorld::push`] is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Impulse of `mass * v`, added to the current velocity
    Add,
    /// Impulse of `mass * (v - current)`, reaching `v` on the given axes
    TowardTarget,
}

/// Positional fixture change; `None` fields are left untouched
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixtureUpdate {
    pub sensor: Option<bool>,
    pub tag: Option<Tag>,
    pub friction: Option<f32>,
}

impl FixtureUpdate {
    pub fn friction(friction: f32) -> Self {
        Self {
            friction: Some(friction),
            ..Default::default()
        }
    }
}

/// Receives contact transitions during a step
pub trait ContactListener {
    fn begin_contact(&mut self, a: Tag, b: Tag);
    fn end_contact(&mut self, a: Tag, b: Tag);
}

/// Capability interface of the rigid-body engine
pub trait PhysicsWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId;
    fn destroy_body(&mut self, body: BodyId);

    fn create_joint(&mut self, desc: &JointDesc) -> JointId;
    fn destroy_joint(&mut self, joint: JointId);
    /// Re-arm the angular limits of a revolute joint
    fn set_joint_limits(&mut self, joint: JointId, lower: f32, upper: f32);

    /// Advance the simulation, reporting each contact begin/end once
    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener);

    fn locate(&self, body: BodyId) -> Option<Pose>;
    fn place(&mut self, body: BodyId, x: f32, y: f32, angle: f32);
    fn rotate(&mut self, body: BodyId, angle: f32);

    fn push(&mut self, body: BodyId, vx: Option<f32>, vy: Option<f32>, mode: PushMode);

    /// Apply updates to the body's fixtures in creation order
    fn update_fixtures(&mut self, body: BodyId, updates: &[FixtureUpdate]);
}
