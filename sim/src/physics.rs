//! Rapier world plus the fixed-step accumulator that advances it.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use rapier3d::prelude::*;

use crate::config::SimConfig;

/// Bodies and colliders taken out of the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Released {
    pub bodies: usize,
    pub colliders: usize,
}

impl std::ops::AddAssign for Released {
    fn add_assign(&mut self, rhs: Self) {
        self.bodies += rhs.bodies;
        self.colliders += rhs.colliders;
    }
}

/// A manifold the solver pushed apart during the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolvedContact {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    /// World space, from `collider1` toward `collider2`, as seen by the solver.
    pub normal: Vector<Real>,
}

impl SolvedContact {
    /// The normal pointing away from `other` toward `collider`, if this
    /// contact is between the two.
    pub fn normal_toward(&self, collider: ColliderHandle) -> Option<(ColliderHandle, Vector<Real>)> {
        if self.collider1 == collider {
            Some((self.collider2, -self.normal))
        } else if self.collider2 == collider {
            Some((self.collider1, self.normal))
        } else {
            None
        }
    }
}

/// Receives contact force events from the pipeline. Only colliders built
/// with `ActiveEvents::CONTACT_FORCE_EVENTS` report here.
#[derive(Default)]
struct ContactRecorder {
    contacts: Mutex<Vec<SolvedContact>>,
}

impl ContactRecorder {
    fn clear(&self) {
        if let Ok(mut contacts) = self.contacts.lock() {
            contacts.clear();
        }
    }

    fn take(&self) -> Vec<SolvedContact> {
        self.contacts
            .lock()
            .map(|mut c| std::mem::take(&mut *c))
            .unwrap_or_default()
    }
}

impl EventHandler for ContactRecorder {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
        let Ok(mut contacts) = self.contacts.lock() else {
            return;
        };
        // Speculative manifolds carry no solver contacts.
        for manifold in &contact_pair.manifolds {
            if manifold.data.solver_contacts.is_empty() {
                continue;
            }
            contacts.push(SolvedContact {
                collider1: contact_pair.collider1,
                collider2: contact_pair.collider2,
                normal: manifold.data.normal,
            });
        }
    }
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub islands: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
    recorder: ContactRecorder,
    solved: Vec<SolvedContact>,
    fixed_dt: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl PhysicsWorld {
    pub fn new(config: &SimConfig) -> Self {
        let mut integration_parameters = IntegrationParameters {
            dt: config.fixed_dt,
            max_ccd_substeps: config.ccd_iterations.max(1),
            ..Default::default()
        };
        if let Some(iterations) = NonZeroUsize::new(config.solver_iterations) {
            integration_parameters.num_solver_iterations = iterations;
        }

        Self {
            gravity: vector![0.0, config.gravity, 0.0],
            integration_parameters,
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
            recorder: ContactRecorder::default(),
            solved: Vec::new(),
            fixed_dt: config.fixed_dt,
            max_substeps: config.max_substeps,
            accumulator: 0.0,
        }
    }

    /// One fixed step. Contacts the solver acted on are kept until the next
    /// step, see [`PhysicsWorld::solved_contacts`].
    pub fn step(&mut self) {
        self.recorder.clear();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.recorder,
        );
        self.solved = self.recorder.take();
    }

    /// Contacts pushed apart during the last step, for colliders that asked
    /// for contact force events. The narrow phase itself already reflects the
    /// post-step positions by the time a step returns.
    pub fn solved_contacts(&self) -> &[SolvedContact] {
        &self.solved
    }

    /// Advance by a frame's wall-clock delta in fixed steps, calling
    /// `after_step` after each one. Runs at most `max_substeps` steps;
    /// time beyond that is dropped. Returns the number of steps run.
    pub fn advance(&mut self, frame_dt: f32, mut after_step: impl FnMut(&mut PhysicsWorld)) -> u32 {
        let frame_dt = if frame_dt.is_finite() { frame_dt.max(0.0) } else { 0.0 };
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_substeps {
            self.step();
            after_step(self);
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }

        if self.accumulator >= self.fixed_dt {
            tracing::debug!(
                "Dropping {:.4}s of simulation time after {} steps",
                self.accumulator,
                steps
            );
            self.accumulator = 0.0;
        }
        steps
    }

    /// Time carried over to the next frame.
    pub fn pending_time(&self) -> f32 {
        self.accumulator
    }

    pub fn insert_body(&mut self, body: impl Into<RigidBody>) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    pub fn attach(&mut self, collider: impl Into<Collider>, parent: RigidBodyHandle) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies)
    }

    /// Remove a body and its colliders. Returns how many colliders went with it.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> usize {
        let collider_count = self
            .bodies
            .get(handle)
            .map(|b| b.colliders().len())
            .unwrap_or(0);
        let removed = self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_some() {
            collider_count
        } else {
            0
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}
