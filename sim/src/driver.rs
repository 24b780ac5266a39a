//! Per-frame synchronization of input, maze, dependent geometry and physics.
//!
//! Every frame runs the same sequence to completion:
//! read tilt, rotate the maze, re-derive boundary and zone poses from the
//! maze body, step physics, read balls back, then test zones and the win.

use crate::input::{tilt_angles, TiltInput};
use crate::level::Level;
use crate::zones::ZoneEvent;

/// One-shot signal raised on the frame a level is won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Won {
    pub next_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub substeps: u32,
    pub zone_events: Vec<ZoneEvent>,
    pub occupied: usize,
    pub total_zones: usize,
    /// Indices of balls sent back to their spawn this frame.
    pub resets: Vec<usize>,
    /// Fastest ball after the speed clamp, before stepping.
    pub max_ball_speed: f32,
    /// Fastest ball seen at the end of any sub-step this frame.
    pub max_step_speed: f32,
    pub won: Option<Won>,
    pub frozen: bool,
}

/// Stateless apart from the pause gate; all entities live in the [`Level`].
#[derive(Debug, Default)]
pub struct Driver {
    paused: bool,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether frames for this level currently do nothing.
    pub fn is_frozen(&self, level: &Level) -> bool {
        self.paused || level.win.is_won() || !level.maze.is_loaded()
    }

    pub fn frame(&mut self, level: &mut Level, input: &mut TiltInput, frame_dt: f32) -> FrameReport {
        let mut report = FrameReport {
            occupied: level.zones.occupied_count(),
            total_zones: level.zones.len(),
            ..Default::default()
        };
        if self.is_frozen(level) {
            report.frozen = true;
            return report;
        }

        // 1. input
        let max_tilt = level.sim.max_tilt;
        let [x, y, z] = tilt_angles(input.read(), max_tilt, level.base_yaw());

        // 2. maze
        level.maze.set_rotation(x, y, z, &mut level.world);

        // 3-4. dependent geometry follows the body, not the visual
        let Some(rotation) = level.maze.body_rotation(&level.world) else {
            report.frozen = true;
            return report;
        };
        level.boundary.sync(&rotation, &mut level.world);
        level.zones.sync(&rotation, &mut level.world);

        // 5. physics
        let sim = &level.sim;
        for ball in &level.balls {
            ball.prepare_step(sim.max_ball_speed, sim.ccd_speed_threshold, &mut level.world);
            report.max_ball_speed = report.max_ball_speed.max(ball.velocity(&level.world).norm());
        }
        let balls = &level.balls;
        let rebound_correction = sim.rebound_correction;
        let mut step_speed = 0.0_f32;
        report.substeps = level.world.advance(frame_dt, |world| {
            for ball in balls {
                if rebound_correction {
                    ball.strip_rebound(world);
                }
                step_speed = step_speed.max(ball.velocity(world).norm());
            }
        });
        report.max_step_speed = step_speed;

        // 6. read back, recover strays
        for ball in &mut level.balls {
            ball.read_back(&level.world);
        }
        report.resets = recover_out_of_bounds(level, input);

        // 7. zones and win
        let probes = level.ball_probes();
        report.zone_events = level.zones.evaluate_overlap(&probes);
        report.occupied = level.zones.occupied_count();
        if level.win.update(report.occupied, report.total_zones) {
            tracing::info!(
                "Level '{}' won, next: {}",
                level.id(),
                level.next_level().unwrap_or("none")
            );
            report.won = Some(Won {
                next_level: level.next_level().map(str::to_string),
            });
            report.frozen = true;
        }
        report
    }
}

/// Reset strays to spawn. Any reset also levels the maze and clears input.
fn recover_out_of_bounds(level: &mut Level, input: &mut TiltInput) -> Vec<usize> {
    let floor = level.sim.out_of_bounds_floor;
    let radius = level.sim.out_of_bounds_radius;
    let mut resets = Vec::new();
    for (index, ball) in level.balls.iter_mut().enumerate() {
        if ball.is_out_of_bounds(floor, radius) {
            let at = ball.position();
            ball.reset(&mut level.world);
            tracing::info!(
                "Ball {} out of bounds at ({:.1}, {:.1}, {:.1}), reset to spawn",
                index,
                at.x,
                at.y,
                at.z
            );
            resets.push(index);
        }
    }
    if !resets.is_empty() {
        reset_tilt(level, input);
    }
    resets
}

/// Level the maze (keeping its yaw) and forget stored input.
pub fn reset_tilt(level: &mut Level, input: &mut TiltInput) {
    input.reset();
    let yaw = level.base_yaw();
    level.maze.set_rotation(0.0, yaw, 0.0, &mut level.world);
    if let Some(rotation) = level.maze.body_rotation(&level.world) {
        level.boundary.sync(&rotation, &mut level.world);
        level.zones.sync(&rotation, &mut level.world);
    }
}
