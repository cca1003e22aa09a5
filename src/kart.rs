//! Karts
//!
//! A kart is a chassis body carried by two wheels. Each wheel hangs from the
//! chassis on three joints:
//!
//! - a groove: the wheel may only travel along the chassis' vertical axis,
//!   within a fixed range
//! - a damped spring: pulls the wheel back to its rest offset
//! - a motor: drives the wheel's spin relative to the chassis
//!
//! The kart is inert until [`Kart::init_physics`] puts it in a world.
//! Driving is done by changing the motor rates; jumping is a single impulse
//! on the chassis.

use crate::error::{GameError, GameResult};
use crate::physics::{moment_for_circle, moment_for_segment, PhysicsWorld};
use crate::resources::ResourceCatalog;
use rapier2d::prelude::*;
use sdl2::rect::Rect;
use sdl2::render::Canvas;
use sdl2::video::Window;
use tracing::{debug, warn};

/// Facing, as used by the motor control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// How hard a kart drives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KartPerformance {
    /// Motor rates must stay strictly below this in magnitude
    pub max_motor_rate: f32,
    /// Rate change per accelerate call
    pub acceleration_rate: f32,
    /// Rate change per decelerate call
    pub brake_rate: f32,
}

impl Default for KartPerformance {
    fn default() -> Self {
        KartPerformance {
            max_motor_rate: 30.0,
            acceleration_rate: 8.0,
            brake_rate: 8.0,
        }
    }
}

/// Physical constants of a kart chassis
///
/// These used to be tweaked in place between builds; keeping them in one
/// value lets different kart classes share the assembly code.
#[derive(Debug, Clone, PartialEq)]
pub struct KartTuning {
    pub chassis_mass: f32,
    /// Half thickness of the chassis segment
    pub chassis_radius: f32,
    pub chassis_friction: f32,
    pub wheel_mass: f32,
    pub wheel_friction: f32,
    /// Rear and front wheel x offsets as fractions of the body width
    pub wheel_offsets: [f32; 2],
    /// Rest offset of the wheels below the chassis center
    pub wheel_y_offset: f32,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    /// How far a wheel may travel above or below its rest offset
    pub groove_travel: f32,
    /// How quickly the motors reach their target rate
    pub motor_factor: f32,
    /// Upward impulse applied to the chassis by a jump
    pub jump_impulse: f32,
    /// Vertical sprite corrections so the images sit on their bodies
    pub body_sprite_offset: i32,
    pub wheel_sprite_offset: i32,
}

impl Default for KartTuning {
    fn default() -> Self {
        KartTuning {
            chassis_mass: 100.0,
            chassis_radius: 5.0,
            chassis_friction: 0.7,
            wheel_mass: 10.0,
            wheel_friction: 1.5,
            wheel_offsets: [-0.35, 0.35],
            wheel_y_offset: 18.0,
            spring_stiffness: 6000.0,
            spring_damping: 400.0,
            groove_travel: 8.0,
            motor_factor: 50.0,
            jump_impulse: 30000.0,
            body_sprite_offset: -6,
            wheel_sprite_offset: 0,
        }
    }
}

/// Physical size of a kart, taken from its sprites
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KartDimensions {
    pub body_width: f32,
    pub body_height: f32,
    pub wheel_radius: f32,
}

impl KartDimensions {
    /// Body size from the body image, wheel radius from the wheel image width
    pub fn from_sprites(body: (u32, u32), wheel: (u32, u32)) -> Self {
        KartDimensions {
            body_width: body.0 as f32,
            body_height: body.1 as f32,
            wheel_radius: wheel.0 as f32 * 0.5,
        }
    }
}

impl Default for KartDimensions {
    fn default() -> Self {
        KartDimensions {
            body_width: 64.0,
            body_height: 24.0,
            wheel_radius: 8.0,
        }
    }
}

/// A selectable kart
#[derive(Debug, Clone, PartialEq)]
pub struct KartProfile {
    pub id: &'static str,
    pub label: &'static str,
    pub body_image: &'static str,
    pub wheel_image: &'static str,
    pub performance: KartPerformance,
}

/// Karts offered on the kart selection screen, in display order
pub fn kart_roster() -> Vec<KartProfile> {
    vec![
        KartProfile {
            id: "red-kart",
            label: "RED",
            body_image: "red-kart-body",
            wheel_image: "kart-wheel",
            performance: KartPerformance::default(),
        },
        KartProfile {
            id: "green-kart",
            label: "GREEN",
            body_image: "green-kart-body",
            wheel_image: "kart-wheel",
            performance: KartPerformance {
                max_motor_rate: 40.0,
                acceleration_rate: 6.0,
                brake_rate: 10.0,
            },
        },
        KartProfile {
            id: "blue-kart",
            label: "BLUE",
            body_image: "blue-kart-body",
            wheel_image: "kart-wheel",
            performance: KartPerformance {
                max_motor_rate: 25.0,
                acceleration_rate: 10.0,
                brake_rate: 6.0,
            },
        },
    ]
}

/// Profile for `id`, or the first profile when there is no such kart
pub fn find_profile(roster: &[KartProfile], id: Option<&str>) -> Option<KartProfile> {
    id.and_then(|id| roster.iter().find(|p| p.id == id))
        .or_else(|| roster.first())
        .cloned()
}

/// Image keys for drawing a kart
#[derive(Debug, Clone, PartialEq)]
pub struct KartSprites {
    pub body: String,
    pub wheel: String,
}

/// Handles of everything a kart owns in the world
#[derive(Debug, Clone)]
pub struct KartPhysics {
    pub chassis: RigidBodyHandle,
    /// Rear, front
    pub wheels: [RigidBodyHandle; 2],
    /// Velocity motors; the groove and spring joints go with the wheel bodies
    pub motors: [ImpulseJointHandle; 2],
}

pub struct Kart {
    pub id: String,
    start: (f32, f32),
    dimensions: KartDimensions,
    performance: KartPerformance,
    tuning: KartTuning,
    sprites: Option<KartSprites>,
    direction: Direction,
    motor_rates: [f32; 2],
    physics: Option<KartPhysics>,
}

impl Kart {
    pub fn new(
        id: impl Into<String>,
        start: (f32, f32),
        dimensions: KartDimensions,
        performance: KartPerformance,
        tuning: KartTuning,
    ) -> Self {
        Kart {
            id: id.into(),
            start,
            dimensions,
            performance,
            tuning,
            sprites: None,
            direction: Direction::default(),
            motor_rates: [0.0; 2],
            physics: None,
        }
    }

    /// Draw with these images instead of the wireframe fallback
    pub fn with_sprites(mut self, sprites: KartSprites) -> Self {
        self.sprites = Some(sprites);
        self
    }

    pub fn has_sprites(&self) -> bool {
        self.sprites.is_some()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn motor_rates(&self) -> [f32; 2] {
        self.motor_rates
    }

    pub fn performance(&self) -> &KartPerformance {
        &self.performance
    }

    pub fn physics(&self) -> Option<&KartPhysics> {
        self.physics.as_ref()
    }

    /// Chassis center, once the kart is in a world
    pub fn position(&self, world: &PhysicsWorld) -> Option<(f32, f32)> {
        self.physics.as_ref().and_then(|p| world.body_position(p.chassis))
    }

    fn validate(&self) -> GameResult<()> {
        let d = &self.dimensions;
        let t = &self.tuning;
        let positive = [
            ("body width", d.body_width),
            ("wheel radius", d.wheel_radius),
            ("chassis mass", t.chassis_mass),
            ("chassis radius", t.chassis_radius),
            ("wheel mass", t.wheel_mass),
        ];
        for (what, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GameError::Physics(format!(
                    "kart {}: {} must be positive, got {}",
                    self.id, what, value
                )));
            }
        }
        if !(self.start.0.is_finite() && self.start.1.is_finite()) {
            return Err(GameError::Physics(format!(
                "kart {}: start position is not finite",
                self.id
            )));
        }
        Ok(())
    }

    /// Create the chassis, wheels and joints in `world`
    ///
    /// Everything is validated before the world is touched, so an error
    /// leaves the world unchanged. Calling this again is a no-op.
    pub fn init_physics(&mut self, world: &mut PhysicsWorld) -> GameResult<()> {
        if self.physics.is_some() {
            warn!(kart = %self.id, "Physics already initialized");
            return Ok(());
        }
        self.validate()?;

        let d = self.dimensions;
        let t = &self.tuning;
        let (x, y) = self.start;

        // Chassis: a thick segment spanning the body width
        let half_length = (d.body_width * 0.5 - t.chassis_radius).max(0.0);
        let chassis_moment = moment_for_segment(
            t.chassis_mass,
            (-d.body_width * 0.5, 0.0),
            (d.body_width * 0.5, 0.0),
            t.chassis_radius,
        );
        let chassis = world.insert_body(
            RigidBodyBuilder::dynamic()
                .translation(vector![x, y])
                .additional_mass_properties(MassProperties::new(
                    point![0.0, 0.0],
                    t.chassis_mass,
                    chassis_moment,
                ))
                .build(),
        );
        world.insert_collider(
            ColliderBuilder::capsule_x(half_length, t.chassis_radius)
                .density(0.0)
                .friction(t.chassis_friction)
                .build(),
            chassis,
        );

        let wheel_moment = moment_for_circle(t.wheel_mass, d.wheel_radius);
        let mut wheels = Vec::with_capacity(2);
        let mut motors = Vec::with_capacity(2);

        for fraction in t.wheel_offsets {
            let anchor = point![fraction * d.body_width, t.wheel_y_offset];
            let wheel = world.insert_body(
                RigidBodyBuilder::dynamic()
                    .translation(vector![x + anchor.x, y + anchor.y])
                    .additional_mass_properties(MassProperties::new(
                        point![0.0, 0.0],
                        t.wheel_mass,
                        wheel_moment,
                    ))
                    .build(),
            );
            world.insert_collider(
                ColliderBuilder::ball(d.wheel_radius)
                    .density(0.0)
                    .friction(t.wheel_friction)
                    .build(),
                wheel,
            );

            // Groove: no sideways slip, bounded vertical travel
            let groove = GenericJointBuilder::new(JointAxesMask::LIN_X)
                .local_anchor1(anchor)
                .local_anchor2(point![0.0, 0.0])
                .limits(JointAxis::LinY, [-t.groove_travel, t.groove_travel])
                .build();
            world.insert_joint(chassis, wheel, groove);

            // Spring: pulls the wheel back to its rest offset
            let spring = GenericJointBuilder::new(JointAxesMask::empty())
                .local_anchor1(anchor)
                .local_anchor2(point![0.0, 0.0])
                .motor_position(JointAxis::LinY, 0.0, t.spring_stiffness, t.spring_damping)
                .build();
            world.insert_joint(chassis, wheel, spring);

            let motor = GenericJointBuilder::new(JointAxesMask::empty())
                .local_anchor1(anchor)
                .local_anchor2(point![0.0, 0.0])
                .motor_velocity(JointAxis::AngX, 0.0, t.motor_factor)
                .build();
            motors.push(world.insert_joint(chassis, wheel, motor));

            wheels.push(wheel);
        }

        let physics = KartPhysics {
            chassis,
            wheels: [wheels[0], wheels[1]],
            motors: [motors[0], motors[1]],
        };
        debug!(kart = %self.id, x, y, ?physics, "Kart physics created");

        self.motor_rates = [0.0; 2];
        self.physics = Some(physics);
        Ok(())
    }

    /// Take the kart out of `world`
    pub fn remove_from(&mut self, world: &mut PhysicsWorld) {
        if let Some(physics) = self.physics.take() {
            // removing a body also drops its colliders and joints
            world.remove_body(physics.chassis);
            for wheel in physics.wheels {
                world.remove_body(wheel);
            }
            self.motor_rates = [0.0; 2];
        }
    }

    /// Spin the wheels faster towards `direction`
    ///
    /// A motor only takes the change if its new rate stays strictly below
    /// the maximum; otherwise that call leaves it alone.
    pub fn accelerate(&mut self, world: &mut PhysicsWorld, direction: Direction) {
        self.direction = direction;
        let delta = direction.sign() * self.performance.acceleration_rate;

        for rate in &mut self.motor_rates {
            if (*rate + delta).abs() < self.performance.max_motor_rate {
                *rate += delta;
            }
        }
        self.push_motor_rates(world);
    }

    /// Brake against the current facing, stopping at zero
    pub fn decelerate(&mut self, world: &mut PhysicsWorld) {
        let amount = self.direction.sign() * self.performance.brake_rate;

        for rate in &mut self.motor_rates {
            *rate -= amount;
            match self.direction {
                Direction::Right if *rate < 0.0 => *rate = 0.0,
                Direction::Left if *rate > 0.0 => *rate = 0.0,
                _ => {}
            }
        }
        self.push_motor_rates(world);
    }

    /// Kick the chassis upwards; wheels and motors are untouched
    pub fn jump(&mut self, world: &mut PhysicsWorld) {
        if let Some(physics) = &self.physics {
            world.apply_impulse(physics.chassis, (0.0, -self.tuning.jump_impulse));
        }
    }

    fn push_motor_rates(&self, world: &mut PhysicsWorld) {
        let Some(physics) = &self.physics else {
            return;
        };
        for (joint, rate) in physics.motors.iter().zip(self.motor_rates) {
            world.set_motor_rate(*joint, rate, self.tuning.motor_factor);
        }
    }

    /// Draw the wheels then the body, positioned relative to `camera`
    ///
    /// Positions and angles are read from the world on every call.
    pub fn draw(
        &self,
        canvas: &mut Canvas<Window>,
        world: &PhysicsWorld,
        resources: &ResourceCatalog,
        camera: (i32, i32),
    ) -> GameResult<()> {
        let (Some(physics), Some(sprites)) = (&self.physics, &self.sprites) else {
            return Ok(());
        };

        let wheel = resources.image(&sprites.wheel)?;
        for handle in physics.wheels {
            blit_rotated(
                canvas,
                wheel,
                world,
                handle,
                camera,
                self.tuning.wheel_sprite_offset,
            )?;
        }

        let body = resources.image(&sprites.body)?;
        blit_rotated(
            canvas,
            body,
            world,
            physics.chassis,
            camera,
            self.tuning.body_sprite_offset,
        )
    }
}

fn blit_rotated(
    canvas: &mut Canvas<Window>,
    texture: &sdl2::render::Texture,
    world: &PhysicsWorld,
    body: RigidBodyHandle,
    camera: (i32, i32),
    y_correction: i32,
) -> GameResult<()> {
    let (Some((x, y)), Some(angle)) = (world.body_position(body), world.body_angle(body)) else {
        return Ok(());
    };
    let query = texture.query();
    let dst = Rect::from_center(
        (x as i32 - camera.0, y as i32 - camera.1 + y_correction),
        query.width,
        query.height,
    );
    // sdl2 angles are degrees, clockwise on screen like the world's y-down frame
    canvas.copy_ex(texture, None, dst, (angle as f64).to_degrees(), None, false, false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kart_in_world() -> (Kart, PhysicsWorld) {
        let mut world = PhysicsWorld::default();
        let mut kart = Kart::new(
            "test",
            (150.0, 150.0),
            KartDimensions::default(),
            KartPerformance::default(),
            KartTuning::default(),
        );
        kart.init_physics(&mut world).unwrap();
        (kart, world)
    }

    #[test]
    fn test_init_physics_creates_one_batch() {
        let (kart, world) = kart_in_world();
        assert_eq!(world.body_count(), 3);
        assert_eq!(world.collider_count(), 3);
        assert_eq!(world.joint_count(), 6);
        assert!(kart.physics().is_some());
        assert_eq!(kart.position(&world), Some((150.0, 150.0)));
    }

    #[test]
    fn test_init_physics_is_idempotent() {
        let (mut kart, mut world) = kart_in_world();
        kart.init_physics(&mut world).unwrap();
        assert_eq!(world.body_count(), 3);
        assert_eq!(world.joint_count(), 6);
    }

    #[test]
    fn test_invalid_kart_leaves_world_untouched() {
        let mut world = PhysicsWorld::default();
        let mut kart = Kart::new(
            "broken",
            (0.0, 0.0),
            KartDimensions {
                wheel_radius: 0.0,
                ..Default::default()
            },
            KartPerformance::default(),
            KartTuning::default(),
        );

        assert!(matches!(kart.init_physics(&mut world), Err(GameError::Physics(_))));
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.joint_count(), 0);
        assert!(kart.physics().is_none());
    }

    #[test]
    fn test_accelerate_refuses_to_reach_max() {
        let (mut kart, mut world) = kart_in_world();
        let mut seen = Vec::new();
        for _ in 0..4 {
            kart.accelerate(&mut world, Direction::Right);
            seen.push(kart.motor_rates()[0]);
        }
        assert_eq!(seen, vec![8.0, 16.0, 24.0, 24.0]);
        assert_eq!(kart.motor_rates(), [24.0, 24.0]);

        let motor = kart.physics().unwrap().motors[1];
        assert_eq!(world.motor_rate(motor), Some(24.0));
    }

    #[test]
    fn test_accelerate_rejects_exact_boundary() {
        let (mut kart, mut world) = kart_in_world();
        kart.performance = KartPerformance {
            max_motor_rate: 24.0,
            acceleration_rate: 8.0,
            brake_rate: 8.0,
        };
        for _ in 0..5 {
            kart.accelerate(&mut world, Direction::Left);
        }
        // |-16 - 8| == 24 is not below the maximum
        assert_eq!(kart.motor_rates(), [-16.0, -16.0]);
        assert_eq!(kart.direction(), Direction::Left);
    }

    #[test]
    fn test_rates_never_reach_max_for_mixed_input() {
        let (mut kart, mut world) = kart_in_world();
        let pattern = [
            Direction::Right,
            Direction::Right,
            Direction::Left,
            Direction::Right,
            Direction::Right,
            Direction::Right,
            Direction::Right,
        ];
        for direction in pattern.iter().cycle().take(50) {
            kart.accelerate(&mut world, *direction);
            for rate in kart.motor_rates() {
                assert!(rate.abs() < kart.performance().max_motor_rate);
            }
        }
    }

    #[test]
    fn test_decelerate_stops_at_zero() {
        let (mut kart, mut world) = kart_in_world();
        kart.performance.brake_rate = 5.0;
        for _ in 0..3 {
            kart.accelerate(&mut world, Direction::Right);
        }

        let mut previous = kart.motor_rates()[0];
        for _ in 0..10 {
            kart.decelerate(&mut world);
            let rate = kart.motor_rates()[0];
            assert!(rate <= previous);
            assert!(rate >= 0.0);
            previous = rate;
        }
        assert_eq!(kart.motor_rates(), [0.0, 0.0]);
    }

    #[test]
    fn test_decelerate_facing_left() {
        let (mut kart, mut world) = kart_in_world();
        kart.accelerate(&mut world, Direction::Left);
        kart.accelerate(&mut world, Direction::Left);
        assert_eq!(kart.motor_rates(), [-16.0, -16.0]);

        kart.decelerate(&mut world);
        assert_eq!(kart.motor_rates(), [-8.0, -8.0]);
        kart.decelerate(&mut world);
        kart.decelerate(&mut world);
        assert_eq!(kart.motor_rates(), [0.0, 0.0]);
    }

    #[test]
    fn test_decelerate_before_accelerate_uses_left_facing() {
        let (mut kart, mut world) = kart_in_world();
        assert_eq!(kart.direction(), Direction::Left);
        kart.decelerate(&mut world);
        assert_eq!(kart.motor_rates(), [0.0, 0.0]);
    }

    #[test]
    fn test_jump_moves_only_the_chassis() {
        let mut world = PhysicsWorld::new((0.0, 0.0));
        let mut kart = Kart::new(
            "jumper",
            (0.0, 0.0),
            KartDimensions::default(),
            KartPerformance::default(),
            KartTuning::default(),
        );
        kart.init_physics(&mut world).unwrap();
        world.step(1.0 / 60.0);
        kart.accelerate(&mut world, Direction::Right);
        let rates = kart.motor_rates();
        let physics = kart.physics().unwrap().clone();
        let (_, before) = world.body_velocity(physics.chassis).unwrap();
        let wheels_before: Vec<_> =
            physics.wheels.iter().map(|w| world.body_velocity(*w)).collect();

        kart.jump(&mut world);

        // 30000 / 100 kg
        let (_, after) = world.body_velocity(physics.chassis).unwrap();
        assert!((after - before + 300.0).abs() < 1e-2, "vy change = {}", after - before);
        let wheels_after: Vec<_> = physics.wheels.iter().map(|w| world.body_velocity(*w)).collect();
        assert_eq!(wheels_after, wheels_before);
        assert_eq!(kart.motor_rates(), rates);
    }

    #[test]
    fn test_controls_without_physics_only_track_rates() {
        let mut world = PhysicsWorld::default();
        let mut kart = Kart::new(
            "idle",
            (0.0, 0.0),
            KartDimensions::default(),
            KartPerformance::default(),
            KartTuning::default(),
        );
        kart.accelerate(&mut world, Direction::Right);
        kart.jump(&mut world);
        assert_eq!(kart.motor_rates(), [8.0, 8.0]);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_kart_settles_on_floor() {
        let (kart, mut world) = kart_in_world();
        world.add_static_box(0.0, 200.0, 400.0, 40.0);
        for _ in 0..150 {
            world.step(1.0 / 30.0);
        }
        let (_, y) = kart.position(&world).unwrap();
        assert!(y < 200.0, "kart fell through the floor: y = {}", y);
    }

    #[test]
    fn test_remove_from_world() {
        let (mut kart, mut world) = kart_in_world();
        kart.remove_from(&mut world);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.joint_count(), 0);
        assert!(kart.physics().is_none());
    }

    #[test]
    fn test_find_profile_falls_back_to_first() {
        let roster = kart_roster();
        assert_eq!(find_profile(&roster, Some("blue-kart")).unwrap().label, "BLUE");
        assert_eq!(find_profile(&roster, Some("hovercraft")).unwrap().id, "red-kart");
        assert_eq!(find_profile(&roster, None).unwrap().id, "red-kart");
        assert!(find_profile(&[], Some("red-kart")).is_none());
    }

    #[test]
    fn test_dimensions_from_sprites() {
        let d = KartDimensions::from_sprites((80, 30), (20, 20));
        assert_eq!(d.body_width, 80.0);
        assert_eq!(d.body_height, 30.0);
        assert_eq!(d.wheel_radius, 10.0);
    }
}
