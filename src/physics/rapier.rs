//! rapier2d-backed physics world
//!
//! Wraps the rapier boilerplate behind [`PhysicsWorld`]. The adapter works in
//! metres internally and converts at the boundary using `scale` pixels per
//! metre. Fixture tags are kept on the adapter side, keyed by collider.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::{
    ActiveEvents, CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, CollisionEvent,
    ContactPair, DefaultBroadPhase, EventHandler, FixedJointBuilder, GenericJoint,
    ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, IslandManager, Isometry,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point, QueryPipeline, Real,
    RevoluteJointBuilder, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Rotation,
    SpringJointBuilder, Vector,
};

use super::{
    BodyDesc, BodyId, BodyType, ContactListener, FixtureUpdate, JointDesc, JointId, PhysicsWorld,
    Pose, PushMode, Shape,
};
use crate::sim::Tag;
use crate::tuning::Tuning;

/// Stiffness used to approximate a rigid distance joint with a spring
const DISTANCE_JOINT_STIFFNESS: Real = 1.0e4;
const DISTANCE_JOINT_DAMPING: Real = 50.0;

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        let mut guard = self.collisions.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

type PairKey = (ColliderHandle, ColliderHandle);

fn pair_key(a: ColliderHandle, b: ColliderHandle) -> PairKey {
    if a.into_raw_parts() <= b.into_raw_parts() {
        (a, b)
    } else {
        (b, a)
    }
}

struct BodyEntry {
    handle: RigidBodyHandle,
    /// Colliders in creation order, for positional fixture updates
    colliders: Vec<ColliderHandle>,
}

struct JointEntry {
    handle: ImpulseJointHandle,
    desc: JointDesc,
}

// ---------------------------------------------------------------------------
// RapierWorld
// ---------------------------------------------------------------------------

pub struct RapierWorld {
    scale: f32,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,

    body_entries: HashMap<BodyId, BodyEntry>,
    joint_entries: HashMap<JointId, JointEntry>,
    tags: HashMap<ColliderHandle, Tag>,
    /// Pairs currently reported as touching
    touching: HashSet<PairKey>,
    /// End contacts caused by body removal, delivered on the next step
    removed_contacts: Vec<(Tag, Tag)>,
    next_body: u32,
    next_joint: u32,
}

impl RapierWorld {
    /// Create a world with downward gravity, configured from tuning
    pub fn new(tuning: &Tuning) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(tuning.solver_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            scale: tuning.physics_scale,
            gravity: Vector::new(0.0, tuning.gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            body_entries: HashMap::new(),
            joint_entries: HashMap::new(),
            tags: HashMap::new(),
            touching: HashSet::new(),
            removed_contacts: Vec::new(),
            next_body: 0,
            next_joint: 0,
        }
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live joints
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    /// Current linear velocity in m/s
    pub fn velocity(&self, body: BodyId) -> Option<Vec2> {
        let entry = self.body_entries.get(&body)?;
        let rb = self.bodies.get(entry.handle)?;
        Some(Vec2::new(rb.linvel().x, rb.linvel().y))
    }

    fn to_metres(&self, v: Vec2) -> Vector<Real> {
        Vector::new(v.x / self.scale, v.y / self.scale)
    }

    fn to_point(&self, v: Vec2) -> Point<Real> {
        Point::new(v.x / self.scale, v.y / self.scale)
    }

    fn tag_of(&self, collider: ColliderHandle) -> Tag {
        self.tags.get(&collider).copied().unwrap_or(Tag::None)
    }

    fn body_handle(&self, body: BodyId) -> Option<RigidBodyHandle> {
        let handle = self.body_entries.get(&body).map(|e| e.handle);
        if handle.is_none() {
            log::warn!("Unknown body {:?}", body);
        }
        handle
    }

    fn build_joint(&self, desc: &JointDesc) -> Option<(RigidBodyHandle, RigidBodyHandle, GenericJoint)> {
        let joint = match *desc {
            JointDesc::Revolute {
                body_a,
                body_b,
                anchor_a,
                anchor_b,
                limits,
            } => {
                let mut builder = RevoluteJointBuilder::new()
                    .local_anchor1(self.to_point(anchor_a))
                    .local_anchor2(self.to_point(anchor_b))
                    .contacts_enabled(false);
                if let Some((lower, upper)) = limits {
                    builder = builder.limits([lower, upper]);
                }
                (body_a, body_b, builder.build().into())
            }
            JointDesc::Distance {
                body_a,
                body_b,
                anchor_a,
                anchor_b,
                length,
            } => {
                let joint = SpringJointBuilder::new(
                    length / self.scale,
                    DISTANCE_JOINT_STIFFNESS,
                    DISTANCE_JOINT_DAMPING,
                )
                .local_anchor1(self.to_point(anchor_a))
                .local_anchor2(self.to_point(anchor_b))
                .build();
                (body_a, body_b, joint.into())
            }
            JointDesc::Weld {
                body_a,
                body_b,
                anchor_a,
                anchor_b,
            } => {
                let joint = FixedJointBuilder::new()
                    .local_anchor1(self.to_point(anchor_a))
                    .local_anchor2(self.to_point(anchor_b))
                    .contacts_enabled(false)
                    .build();
                (body_a, body_b, joint.into())
            }
        };
        let (a, b, data) = joint;
        Some((self.body_handle(a)?, self.body_handle(b)?, data))
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId {
        let builder = match desc.body_type {
            BodyType::Static => RigidBodyBuilder::fixed(),
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let mut builder = builder
            .translation(self.to_metres(desc.position))
            .can_sleep(false);
        if desc.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = self.bodies.insert(builder.build());

        let mut colliders = Vec::with_capacity(desc.fixtures.len());
        for fixture in &desc.fixtures {
            let builder = match fixture.shape {
                Shape::Rectangle { half_extents } => ColliderBuilder::cuboid(
                    half_extents.x / self.scale,
                    half_extents.y / self.scale,
                ),
                Shape::Circle { radius } => ColliderBuilder::ball(radius / self.scale),
            };
            let collider = builder
                .position(Isometry::new(self.to_metres(fixture.offset), fixture.angle))
                .density(fixture.material.density)
                .friction(fixture.material.friction)
                .restitution(fixture.material.restitution)
                .sensor(fixture.sensor)
                .active_events(ActiveEvents::COLLISION_EVENTS)
                .build();
            let collider_handle =
                self.colliders
                    .insert_with_parent(collider, handle, &mut self.bodies);
            if fixture.tag != Tag::None {
                self.tags.insert(collider_handle, fixture.tag);
            }
            colliders.push(collider_handle);
        }

        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.body_entries.insert(id, BodyEntry { handle, colliders });
        id
    }

    fn destroy_body(&mut self, body: BodyId) {
        let Some(entry) = self.body_entries.remove(&body) else {
            log::warn!("Destroying unknown body {:?}", body);
            return;
        };

        // Report contacts the removal breaks, resolving tags before they go away
        let owned: HashSet<ColliderHandle> = entry.colliders.iter().copied().collect();
        let broken: Vec<PairKey> = self
            .touching
            .iter()
            .filter(|(a, b)| owned.contains(a) || owned.contains(b))
            .copied()
            .collect();
        for key in broken {
            self.touching.remove(&key);
            self.removed_contacts
                .push((self.tag_of(key.0), self.tag_of(key.1)));
        }
        for collider in &entry.colliders {
            self.tags.remove(collider);
        }

        self.bodies.remove(
            entry.handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn create_joint(&mut self, desc: &JointDesc) -> JointId {
        let id = JointId(self.next_joint);
        self.next_joint += 1;
        if let Some((a, b, data)) = self.build_joint(desc) {
            let handle = self.impulse_joints.insert(a, b, data, true);
            self.joint_entries.insert(id, JointEntry { handle, desc: *desc });
        }
        id
    }

    fn destroy_joint(&mut self, joint: JointId) {
        match self.joint_entries.remove(&joint) {
            Some(entry) => {
                self.impulse_joints.remove(entry.handle, true);
            }
            None => log::warn!("Destroying unknown joint {:?}", joint),
        }
    }

    fn set_joint_limits(&mut self, joint: JointId, lower: f32, upper: f32) {
        let Some(entry) = self.joint_entries.get(&joint) else {
            log::warn!("Setting limits on unknown joint {:?}", joint);
            return;
        };
        let JointDesc::Revolute {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            ..
        } = entry.desc
        else {
            log::warn!("Joint {:?} is not revolute, limits ignored", joint);
            return;
        };

        // Rebuild the hinge in place with the new limits
        let desc = JointDesc::Revolute {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            limits: Some((lower, upper)),
        };
        let old = entry.handle;
        if let Some((a, b, data)) = self.build_joint(&desc) {
            self.impulse_joints.remove(old, true);
            let handle = self.impulse_joints.insert(a, b, data, true);
            self.joint_entries.insert(joint, JointEntry { handle, desc });
        }
    }

    fn step(&mut self, dt: f32, listener: &mut dyn ContactListener) {
        for (a, b) in self.removed_contacts.drain(..) {
            listener.end_contact(a, b);
        }

        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        // Collapse events to one net transition per pair (a sensor flip can
        // produce a stop/start pair for the same contact within one step)
        let mut net: Vec<(PairKey, bool)> = Vec::new();
        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            let key = pair_key(h1, h2);
            match net.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = started,
                None => net.push((key, started)),
            }
        }

        for (key, started) in net {
            let was_touching = self.touching.contains(&key);
            if started && !was_touching {
                self.touching.insert(key);
                listener.begin_contact(self.tag_of(key.0), self.tag_of(key.1));
            } else if !started && was_touching {
                self.touching.remove(&key);
                listener.end_contact(self.tag_of(key.0), self.tag_of(key.1));
            }
        }
    }

    fn locate(&self, body: BodyId) -> Option<Pose> {
        let entry = self.body_entries.get(&body)?;
        let rb = self.bodies.get(entry.handle)?;
        let t = rb.translation();
        Some(Pose {
            position: Vec2::new(t.x * self.scale, t.y * self.scale),
            angle: rb.rotation().angle(),
        })
    }

    fn place(&mut self, body: BodyId, x: f32, y: f32, angle: f32) {
        let position = Isometry::new(self.to_metres(Vec2::new(x, y)), angle);
        if let Some(handle) = self.body_handle(body)
            && let Some(rb) = self.bodies.get_mut(handle)
        {
            rb.set_position(position, true);
        }
    }

    fn rotate(&mut self, body: BodyId, angle: f32) {
        if let Some(handle) = self.body_handle(body)
            && let Some(rb) = self.bodies.get_mut(handle)
        {
            rb.set_rotation(Rotation::new(angle), true);
        }
    }

    fn push(&mut self, body: BodyId, vx: Option<f32>, vy: Option<f32>, mode: PushMode) {
        let Some(handle) = self.body_handle(body) else {
            return;
        };
        let Some(rb) = self.bodies.get_mut(handle) else {
            return;
        };
        let current = *rb.linvel();
        let (dvx, dvy) = match mode {
            PushMode::Add => (vx, vy),
            PushMode::TowardTarget => (vx.map(|x| x - current.x), vy.map(|y| y - current.y)),
        };
        // An impulse of mass * dv changes velocity by exactly dv
        let delta = Vector::new(dvx.unwrap_or(0.0), dvy.unwrap_or(0.0));
        rb.set_linvel(current + delta, true);
    }

    fn update_fixtures(&mut self, body: BodyId, updates: &[FixtureUpdate]) {
        let Some(entry) = self.body_entries.get(&body) else {
            log::warn!("Updating fixtures of unknown body {:?}", body);
            return;
        };
        for (handle, update) in entry.colliders.iter().zip(updates) {
            if let Some(collider) = self.colliders.get_mut(*handle) {
                if let Some(sensor) = update.sensor {
                    collider.set_sensor(sensor);
                }
                if let Some(friction) = update.friction {
                    collider.set_friction(friction);
                }
            }
            if let Some(tag) = update.tag {
                self.tags.insert(*handle, tag);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
