//! Deterministic in-memory world for tests
//!
//! Bodies never move on their own. Tests position them with `place`, queue
//! contact transitions with [`ScriptedWorld::script_begin`] and friends, and the
//! queued transitions are delivered on the next `step`, in order.

use std::collections::BTreeMap;

use glam::Vec2;

use super::{
    BodyDesc, BodyId, ContactListener, FixtureSpec, FixtureUpdate, JointDesc, JointId,
    PhysicsWorld, Pose, PushMode,
};
use crate::sim::Tag;

#[derive(Debug, Clone)]
pub struct ScriptedBody {
    pub desc: BodyDesc,
    pub pose: Pose,
    pub velocity: Vec2,
    pub fixtures: Vec<FixtureSpec>,
}

#[derive(Debug, Clone)]
pub struct ScriptedJoint {
    pub desc: JointDesc,
    pub limits: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Copy)]
enum Scripted {
    Begin(Tag, Tag),
    End(Tag, Tag),
}

#[derive(Debug, Default)]
pub struct ScriptedWorld {
    pub bodies: BTreeMap<BodyId, ScriptedBody>,
    pub joints: BTreeMap<JointId, ScriptedJoint>,
    /// Every dt passed to `step`
    pub steps: Vec<f32>,
    pub destroyed: Vec<BodyId>,
    script: Vec<Scripted>,
    next_body: u32,
    next_joint: u32,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_begin(&mut self, a: Tag, b: Tag) {
        self.script.push(Scripted::Begin(a, b));
    }

    pub fn script_end(&mut self, a: Tag, b: Tag) {
        self.script.push(Scripted::End(a, b));
    }

    pub fn body(&self, body: BodyId) -> &ScriptedBody {
        &self.bodies[&body]
    }

    pub fn is_alive(&self, body: BodyId) -> bool {
        self.bodies.contains_key(&body)
    }

    pub fn joint_limits(&self, joint: JointId) -> Option<(f32, f32)> {
        self.joints.get(&joint).and_then(|j| j.limits)
    }

    /// Weld joints currently attached to `body`
    pub fn welds_on(&self, body: BodyId) -> usize {
        self.joints
            .values()
            .filter(|j| matches!(j.desc, JointDesc::Weld { body_b, .. } if body_b == body))
            .count()
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.bodies.insert(
            id,
            ScriptedBody {
                desc: desc.clone(),
                pose: Pose {
                    position: desc.position,
                    angle: 0.0,
                },
                velocity: Vec2::ZERO,
                fixtures: desc.fixtures.clone(),
            },
        );
        id
    }

    fn destroy_body(&mut self, body: BodyId) {
        if self.bodies.remove(&body).is_some() {
            self.destroyed.push(body);
        }
    }

    fn create_joint(&mut self, desc: &JointDesc) -> JointId {
        let id = JointId(self.next_joint);
        self.next_joint += 1;
        let limits = match *desc {
            JointDesc::Revolute { limits, .. } => limits,
            _ => None,
        };
        self.joints.insert(
            id,
            ScriptedJoint {
                desc: *desc,
                limits,
            },
        );
        id
    }

    fn destroy_joint(&mut self, joint: JointId) {
        self.joints.remove(&joint);
    }

    fn set_joint_limits(&mut self, joint: JointId, lower: f32, upper: f32) {
        if let Some(j) = self.joints.get_mut(&joint) {
            j.limits = Some((lower, upper));
        }
    }

    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener) {
        self.steps.push(dt);
        for event in std::mem::take(&mut self.script) {
            match event {
                Scripted::Begin(a, b) => listener.begin_contact(a, b),
                Scripted::End(a, b) => listener.end_contact(a, b),
            }
        }
    }

    fn locate(&self, body: BodyId) -> Option<Pose> {
        self.bodies.get(&body).map(|b| b.pose)
    }

    fn place(&mut self, body: BodyId, x: f32, y: f32, angle: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pose = Pose {
                position: Vec2::new(x, y),
                angle,
            };
        }
    }

    fn rotate(&mut self, body: BodyId, angle: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pose.angle = angle;
        }
    }

    fn push(&mut self, body: BodyId, vx: Option<f32>, vy: Option<f32>, mode: PushMode) {
        if let Some(b) = self.bodies.get_mut(&body) {
            match mode {
                PushMode::Add => {
                    b.velocity += Vec2::new(vx.unwrap_or(0.0), vy.unwrap_or(0.0));
                }
                PushMode::TowardTarget => {
                    if let Some(x) = vx {
                        b.velocity.x = x;
                    }
                    if let Some(y) = vy {
                        b.velocity.y = y;
                    }
                }
            }
        }
    }

    fn update_fixtures(&mut self, body: BodyId, updates: &[FixtureUpdate]) {
        if let Some(b) = self.bodies.get_mut(&body) {
            for (fixture, update) in b.fixtures.iter_mut().zip(updates) {
                if let Some(sensor) = update.sensor {
                    fixture.sensor = sensor;
                }
                if let Some(tag) = update.tag {
                    fixture.tag = tag;
                }
                if let Some(friction) = update.friction {
                    fixture.material.friction = friction;
                }
            }
        }
    }
}
