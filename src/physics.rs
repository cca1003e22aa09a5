//! Physics world
//!
//! Thin owner of a rapier2d pipeline and its sets. World units are pixels
//! and the y axis points down the screen, so gravity is positive y and a
//! positive angle is a clockwise rotation on screen.
//!
//! The kart and the track talk to the solver only through this type; they
//! hold handles, never references into the sets.

use rapier2d::prelude::*;

/// Gravity used by every track, in pixels per second squared
pub const TRACK_GRAVITY: (f32, f32) = (0.0, 900.0);

/// Moment of inertia of a thick line segment about its body origin
///
/// `a` and `b` are the segment endpoints in body space and `radius` its
/// half thickness. The rounded ends count towards the length.
pub fn moment_for_segment(mass: f32, a: (f32, f32), b: (f32, f32), radius: f32) -> f32 {
    let offset = ((a.0 + b.0) * 0.5, (a.1 + b.1) * 0.5);
    let length = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt() + 2.0 * radius;
    mass * (length * length / 12.0 + offset.0 * offset.0 + offset.1 * offset.1)
}

/// Moment of inertia of a solid disc about its center
pub fn moment_for_circle(mass: f32, radius: f32) -> f32 {
    mass * radius * radius * 0.5
}

/// Collider outline in world space, used by the wireframe view
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Circle {
        center: (f32, f32),
        radius: f32,
        angle: f32,
    },
    /// Segment with rounded ends
    Capsule {
        a: (f32, f32),
        b: (f32, f32),
        radius: f32,
    },
    /// Closed polygon
    Polygon(Vec<(f32, f32)>),
}

pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
}

impl PhysicsWorld {
    pub fn new(gravity: (f32, f32)) -> Self {
        Self {
            gravity: vector![gravity.0, gravity.1],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
        }
    }

    /// Advance the simulation by exactly `dt` seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    pub fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.rigid_body_set.insert(body)
    }

    pub fn insert_collider(
        &mut self,
        collider: Collider,
        parent: RigidBodyHandle,
    ) -> ColliderHandle {
        self.collider_set.insert_with_parent(collider, parent, &mut self.rigid_body_set)
    }

    pub fn insert_joint(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        joint: impl Into<GenericJoint>,
    ) -> ImpulseJointHandle {
        self.impulse_joint_set.insert(body1, body2, joint, true)
    }

    /// Add an axis-aligned static box given its top-left corner and size
    pub fn add_static_box(&mut self, x: f32, y: f32, width: f32, height: f32) -> ColliderHandle {
        let body = self.insert_body(
            RigidBodyBuilder::fixed()
                .translation(vector![x + width * 0.5, y + height * 0.5])
                .build(),
        );
        let collider = ColliderBuilder::cuboid(width * 0.5, height * 0.5)
            .friction(1.0)
            .build();
        self.insert_collider(collider, body)
    }

    /// Add a static segment of the given half thickness
    pub fn add_static_segment(
        &mut self,
        a: (f32, f32),
        b: (f32, f32),
        radius: f32,
    ) -> ColliderHandle {
        let body = self.insert_body(RigidBodyBuilder::fixed().build());
        let collider =
            ColliderBuilder::capsule_from_endpoints(point![a.0, a.1], point![b.0, b.1], radius)
                .friction(1.0)
                .build();
        self.insert_collider(collider, body)
    }

    /// Set the target relative angular velocity of a velocity-motor joint
    ///
    /// Returns false if the joint no longer exists.
    pub fn set_motor_rate(&mut self, joint: ImpulseJointHandle, rate: f32, factor: f32) -> bool {
        let Some((body1, body2)) = self
            .impulse_joint_set
            .iter_mut()
            .find(|(handle, _)| *handle == joint)
            .map(|(_, joint)| {
                joint.data.set_motor_velocity(JointAxis::AngX, rate, factor);
                (joint.body1, joint.body2)
            })
        else {
            return false;
        };

        // A sleeping wheel ignores its motor until something wakes it
        for handle in [body1, body2] {
            if let Some(body) = self.rigid_body_set.get_mut(handle) {
                body.wake_up(true);
            }
        }
        true
    }

    /// Current target rate of a velocity-motor joint
    #[cfg(test)]
    pub fn motor_rate(&self, joint: ImpulseJointHandle) -> Option<f32> {
        self.impulse_joint_set
            .get(joint)
            .and_then(|j| j.data.motor(JointAxis::AngX))
            .map(|motor| motor.target_vel)
    }

    pub fn apply_impulse(&mut self, body: RigidBodyHandle, impulse: (f32, f32)) -> bool {
        match self.rigid_body_set.get_mut(body) {
            Some(body) => {
                body.apply_impulse(vector![impulse.0, impulse.1], true);
                true
            }
            None => false,
        }
    }

    pub fn body_position(&self, body: RigidBodyHandle) -> Option<(f32, f32)> {
        self.rigid_body_set.get(body).map(|b| {
            let t = b.translation();
            (t.x, t.y)
        })
    }

    /// Body rotation in radians, positive clockwise on screen
    pub fn body_angle(&self, body: RigidBodyHandle) -> Option<f32> {
        self.rigid_body_set.get(body).map(|b| b.rotation().angle())
    }

    #[cfg(test)]
    pub fn body_velocity(&self, body: RigidBodyHandle) -> Option<(f32, f32)> {
        self.rigid_body_set.get(body).map(|b| {
            let v = b.linvel();
            (v.x, v.y)
        })
    }

    /// Remove a body with its colliders and joints
    pub fn remove_body(&mut self, body: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }

    /// World-space outlines of every collider
    pub fn outlines(&self) -> Vec<Outline> {
        self.collider_set
            .iter()
            .filter_map(|(_, collider)| {
                let iso = collider.position();
                let to_world = |p: Point<Real>| {
                    let w = iso * p;
                    (w.x, w.y)
                };
                let shape = collider.shape();

                if let Some(ball) = shape.as_ball() {
                    Some(Outline::Circle {
                        center: to_world(Point::origin()),
                        radius: ball.radius,
                        angle: iso.rotation.angle(),
                    })
                } else if let Some(cuboid) = shape.as_cuboid() {
                    let h = cuboid.half_extents;
                    Some(Outline::Polygon(vec![
                        to_world(point![-h.x, -h.y]),
                        to_world(point![h.x, -h.y]),
                        to_world(point![h.x, h.y]),
                        to_world(point![-h.x, h.y]),
                    ]))
                } else {
                    shape.as_capsule().map(|capsule| Outline::Capsule {
                        a: to_world(capsule.segment.a),
                        b: to_world(capsule.segment.b),
                        radius: capsule.radius,
                    })
                }
            })
            .collect()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(TRACK_GRAVITY)
    }
}
