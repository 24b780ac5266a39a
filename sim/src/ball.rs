//! Dynamic balls: creation, anti-tunneling measures and out-of-bounds recovery.

use maze_shared::BallSpec;
use rapier3d::na::{UnitQuaternion, Vector3};
use rapier3d::prelude::*;

use crate::config::SimConfig;
use crate::math::{clamp_length, isometry, vec3};
use crate::physics::{PhysicsWorld, Released};
use crate::zones::BallProbe;

#[derive(Debug, Clone)]
pub struct Ball {
    pub spawn: Vector3<f32>,
    pub radius: f32,
    pub color: u32,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    /// Pose read back after the last physics step.
    position: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
}

impl Ball {
    pub fn create(spec: &BallSpec, config: &SimConfig, world: &mut PhysicsWorld) -> Self {
        let spawn = vec3(spec.position);
        let body = world.insert_body(
            RigidBodyBuilder::dynamic()
                .translation(spawn)
                .linear_damping(config.ball_linear_damping)
                .angular_damping(config.ball_angular_damping)
                .ccd_enabled(true)
                .can_sleep(false),
        );
        let collider = world.attach(
            ColliderBuilder::ball(spec.radius)
                .mass(config.ball_mass)
                .friction(config.ball_friction)
                .restitution(config.ball_restitution)
                .active_events(ActiveEvents::CONTACT_FORCE_EVENTS)
                .contact_force_event_threshold(0.0),
            body,
        );
        Self {
            spawn,
            radius: spec.radius,
            color: spec.color,
            body,
            collider,
            position: spawn,
            rotation: UnitQuaternion::identity(),
        }
    }

    pub fn body_handle(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn collider_handle(&self) -> ColliderHandle {
        self.collider
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    pub fn probe(&self) -> BallProbe {
        BallProbe {
            center: self.position,
            radius: self.radius,
        }
    }

    pub fn velocity(&self, world: &PhysicsWorld) -> Vector3<f32> {
        world
            .bodies
            .get(self.body)
            .map(|b| *b.linvel())
            .unwrap_or_else(Vector3::zeros)
    }

    /// Clamp speed to `max_speed` and switch CCD on when moving at or above
    /// `ccd_threshold`. Returns the speed seen before clamping.
    pub fn prepare_step(&self, max_speed: f32, ccd_threshold: f32, world: &mut PhysicsWorld) -> f32 {
        let Some(body) = world.bodies.get_mut(self.body) else {
            return 0.0;
        };
        let v = *body.linvel();
        let speed = v.norm();
        if speed > max_speed {
            body.set_linvel(clamp_length(v, max_speed), true);
        }
        body.enable_ccd(speed.min(max_speed) >= ccd_threshold);
        speed
    }

    /// Remove the velocity component that carries the ball away from any
    /// surface the solver pushed it off during the last step.
    pub fn strip_rebound(&self, world: &mut PhysicsWorld) {
        let mut v = self.velocity(world);
        let before = v;
        for contact in world.solved_contacts() {
            let Some((other, n)) = contact.normal_toward(self.collider) else {
                continue;
            };
            if world.colliders.get(other).is_none_or(|c| c.is_sensor()) {
                continue;
            }
            let away = v.dot(&n);
            if away > 0.0 {
                v -= n * away;
            }
        }
        if v != before {
            if let Some(body) = world.bodies.get_mut(self.body) {
                body.set_linvel(v, true);
            }
        }
    }

    /// Copy the simulated pose into the readable state.
    pub fn read_back(&mut self, world: &PhysicsWorld) {
        if let Some(body) = world.bodies.get(self.body) {
            self.position = body.position().translation.vector;
            self.rotation = body.position().rotation;
        }
    }

    pub fn is_out_of_bounds(&self, floor: f32, radius: f32) -> bool {
        let p = self.position;
        p.y < floor || (p.x * p.x + p.z * p.z).sqrt() > radius
    }

    /// Back to spawn, at rest, unrotated.
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        if let Some(body) = world.bodies.get_mut(self.body) {
            body.set_position(isometry(self.spawn, UnitQuaternion::identity()), true);
            body.set_linvel(Vector3::zeros(), true);
            body.set_angvel(Vector3::zeros(), true);
        }
        self.position = self.spawn;
        self.rotation = UnitQuaternion::identity();
    }

    pub fn remove(self, world: &mut PhysicsWorld) -> Released {
        Released {
            bodies: 1,
            colliders: world.remove_body(self.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> BallSpec {
        BallSpec {
            position: [-5.0, 20.0, -5.0],
            color: 0xffffff,
            radius: 0.5,
        }
    }

    fn setup() -> (PhysicsWorld, Ball, SimConfig) {
        let config = SimConfig::default();
        let mut world = PhysicsWorld::new(&config);
        let ball = Ball::create(&spec(), &config, &mut world);
        (world, ball, config)
    }

    #[test]
    fn clamp_halves_double_speed() {
        let (mut world, ball, config) = setup();
        let v = Vector3::new(3.0, -4.0, 12.0).normalize() * (2.0 * config.max_ball_speed);
        world.bodies[ball.body_handle()].set_linvel(v, true);
        ball.prepare_step(config.max_ball_speed, config.ccd_speed_threshold, &mut world);
        let after = ball.velocity(&world);
        assert!((after.norm() - config.max_ball_speed).abs() < 1e-4);
        assert!((after.normalize().dot(&v.normalize()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ccd_follows_speed_threshold() {
        let (mut world, ball, config) = setup();
        world.bodies[ball.body_handle()].set_linvel(Vector3::zeros(), true);
        ball.prepare_step(config.max_ball_speed, 0.05, &mut world);
        assert!(!world.bodies[ball.body_handle()].is_ccd_enabled());

        world.bodies[ball.body_handle()].set_linvel(Vector3::new(0.0, -0.06, 0.0), true);
        ball.prepare_step(config.max_ball_speed, 0.05, &mut world);
        assert!(world.bodies[ball.body_handle()].is_ccd_enabled());
    }

    #[test]
    fn out_of_bounds_checks_floor_and_radius() {
        let (_, mut ball, _) = setup();
        ball.position = Vector3::new(0.0, -11.0, 0.0);
        assert!(ball.is_out_of_bounds(-10.0, 40.0));
        ball.position = Vector3::new(30.0, 1.0, 30.0);
        assert!(ball.is_out_of_bounds(-10.0, 40.0));
        ball.position = Vector3::new(10.0, 1.0, 10.0);
        assert!(!ball.is_out_of_bounds(-10.0, 40.0));
    }

    #[test]
    fn reset_restores_spawn_at_rest() {
        let (mut world, mut ball, _) = setup();
        {
            let body = &mut world.bodies[ball.body_handle()];
            body.set_position(
                isometry(Vector3::new(3.0, -50.0, 2.0), UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 1.0)),
                true,
            );
            body.set_linvel(Vector3::new(1.0, -20.0, 3.0), true);
            body.set_angvel(Vector3::new(4.0, 0.0, -2.0), true);
        }
        ball.read_back(&world);
        assert!(ball.is_out_of_bounds(-10.0, 40.0));

        ball.reset(&mut world);
        let body = &world.bodies[ball.body_handle()];
        assert_eq!(*body.linvel(), Vector3::zeros());
        assert_eq!(*body.angvel(), Vector3::zeros());
        assert!((body.translation() - ball.spawn).norm() < 1e-6);
        assert!(body.rotation().angle() < 1e-6);
        assert_eq!(ball.position(), ball.spawn);
    }

    #[test]
    fn collider_reports_solver_contacts() {
        let (world, ball, _) = setup();
        let collider = &world.colliders[ball.collider_handle()];
        assert!(collider.active_events().contains(ActiveEvents::CONTACT_FORCE_EVENTS));
        assert_eq!(collider.contact_force_event_threshold(), 0.0);
    }

    #[test]
    fn rebound_is_stripped_after_contact() {
        let config = SimConfig {
            ball_restitution: 1.0,
            ..Default::default()
        };
        let mut world = PhysicsWorld::new(&config);
        let floor = world.insert_body(RigidBodyBuilder::fixed());
        world.attach(ColliderBuilder::halfspace(Vector3::y_axis()).restitution(1.0), floor);
        let ball = Ball::create(
            &BallSpec {
                position: [0.0, 0.49, 0.0],
                color: 0,
                radius: 0.5,
            },
            &config,
            &mut world,
        );
        world.bodies[ball.body_handle()].set_linvel(Vector3::new(1.0, -3.0, 0.0), true);
        world.step();
        assert!(ball.velocity(&world).y > 0.5, "solver should have bounced the ball");

        ball.strip_rebound(&mut world);
        let v = ball.velocity(&world);
        assert!(v.y <= 1e-5, "still bouncing: {v:?}");
        assert!(v.x > 0.5, "tangential motion kept: {v:?}");
    }

    #[test]
    fn free_flight_is_left_alone() {
        let (mut world, ball, _) = setup();
        world.bodies[ball.body_handle()].set_linvel(Vector3::new(0.0, 4.0, 0.0), true);
        world.step();
        let before = ball.velocity(&world);
        ball.strip_rebound(&mut world);
        assert_eq!(ball.velocity(&world), before);
    }

    #[test]
    fn sensor_contacts_are_ignored() {
        let config = SimConfig::default();
        let mut world = PhysicsWorld::new(&config);
        let zone = world.insert_body(RigidBodyBuilder::fixed());
        world.attach(ColliderBuilder::cuboid(2.0, 2.0, 2.0).sensor(true), zone);
        let ball = Ball::create(
            &BallSpec {
                position: [0.0, 0.0, 0.0],
                color: 0,
                radius: 0.5,
            },
            &config,
            &mut world,
        );
        world.bodies[ball.body_handle()].set_linvel(Vector3::new(0.0, 2.0, 0.0), true);
        world.step();
        assert!(world.solved_contacts().is_empty());
        let before = ball.velocity(&world);
        ball.strip_rebound(&mut world);
        assert_eq!(ball.velocity(&world), before);
    }
}
