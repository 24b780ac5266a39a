//! Tilt input: an exclusive source router and the gyroscope capability.

use std::future::Future;

use maze_shared::input::gyro_signal;
use maze_shared::TiltSignal;
use tokio::sync::watch;

/// Default gyroscope deflection (degrees) for a full-scale signal.
pub const DEFAULT_GYRO_RANGE_DEG: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    #[default]
    Mouse,
    Joystick,
    Gyroscope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroState {
    Unavailable,
    AwaitingPermission,
    Enabled,
    Disabled,
}

/// Device side of the gyroscope: reports permission outcomes and readings.
#[derive(Debug, Clone)]
pub struct GyroHandle {
    state: watch::Sender<GyroState>,
    reading: watch::Sender<TiltSignal>,
    range_deg: f32,
}

/// Frame-loop side of the gyroscope. Only ever reads the latest values.
#[derive(Debug, Clone)]
pub struct Gyroscope {
    state: watch::Receiver<GyroState>,
    reading: watch::Receiver<TiltSignal>,
}

impl Gyroscope {
    pub fn channel(available: bool, range_deg: f32) -> (GyroHandle, Gyroscope) {
        let initial = if available {
            GyroState::Disabled
        } else {
            GyroState::Unavailable
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let (reading_tx, reading_rx) = watch::channel(TiltSignal::NEUTRAL);
        (
            GyroHandle {
                state: state_tx,
                reading: reading_tx,
                range_deg,
            },
            Gyroscope {
                state: state_rx,
                reading: reading_rx,
            },
        )
    }

    /// A capability on a device without a gyroscope.
    pub fn unavailable() -> Self {
        Self::channel(false, DEFAULT_GYRO_RANGE_DEG).1
    }

    pub fn state(&self) -> GyroState {
        *self.state.borrow()
    }

    /// Latest reading while enabled, neutral otherwise.
    pub fn signal(&self) -> TiltSignal {
        if self.state() == GyroState::Enabled {
            *self.reading.borrow()
        } else {
            TiltSignal::NEUTRAL
        }
    }
}

impl GyroHandle {
    pub fn state(&self) -> GyroState {
        *self.state.borrow()
    }

    /// Run a one-shot permission request on the tokio runtime. The frame loop
    /// sees `AwaitingPermission` until it resolves. Does nothing when the
    /// device has no gyroscope.
    pub fn request_permission<F>(&self, request: F) -> Option<tokio::task::JoinHandle<GyroState>>
    where
        F: Future<Output = bool> + Send + 'static,
    {
        if self.state() == GyroState::Unavailable {
            tracing::info!("Gyroscope unavailable, ignoring permission request");
            return None;
        }
        self.state.send_replace(GyroState::AwaitingPermission);
        let handle = self.clone();
        Some(tokio::spawn(async move {
            let granted = request.await;
            handle.resolve_permission(granted)
        }))
    }

    pub fn resolve_permission(&self, granted: bool) -> GyroState {
        if self.state() == GyroState::Unavailable {
            return GyroState::Unavailable;
        }
        let next = if granted {
            GyroState::Enabled
        } else {
            GyroState::Disabled
        };
        self.state.send_replace(next);
        tracing::info!("Gyroscope permission {}", if granted { "granted" } else { "denied" });
        next
    }

    pub fn disable(&self) {
        if self.state() != GyroState::Unavailable {
            self.state.send_replace(GyroState::Disabled);
        }
    }

    /// Device orientation in degrees (`beta` pitch, `gamma` roll).
    pub fn push_reading(&self, beta_deg: f32, gamma_deg: f32) {
        self.reading
            .send_replace(gyro_signal(beta_deg, gamma_deg, self.range_deg));
    }
}

/// Routes exactly one source to the driver.
#[derive(Debug, Clone)]
pub struct TiltInput {
    source: InputSource,
    mouse: TiltSignal,
    joystick: TiltSignal,
    gyro: Gyroscope,
    /// Gyroscope reading treated as level, taken at the last reset.
    gyro_neutral: TiltSignal,
}

impl Default for TiltInput {
    fn default() -> Self {
        Self::new(Gyroscope::unavailable())
    }
}

impl TiltInput {
    pub fn new(gyro: Gyroscope) -> Self {
        Self {
            source: InputSource::Mouse,
            mouse: TiltSignal::NEUTRAL,
            joystick: TiltSignal::NEUTRAL,
            gyro,
            gyro_neutral: TiltSignal::NEUTRAL,
        }
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn set_source(&mut self, source: InputSource) {
        if source != self.source {
            tracing::debug!("Tilt source {:?} -> {:?}", self.source, source);
            self.source = source;
        }
    }

    pub fn set_mouse(&mut self, signal: TiltSignal) {
        self.mouse = signal;
    }

    pub fn set_joystick(&mut self, signal: TiltSignal) {
        self.joystick = signal;
    }

    pub fn gyroscope(&self) -> &Gyroscope {
        &self.gyro
    }

    pub fn read(&self) -> TiltSignal {
        match self.source {
            InputSource::Mouse => self.mouse,
            InputSource::Joystick => self.joystick,
            InputSource::Gyroscope => {
                let raw = self.gyro.signal();
                TiltSignal::new(raw.x - self.gyro_neutral.x, raw.y - self.gyro_neutral.y)
            }
        }
    }

    /// Forget stored pointer and stick positions and re-level the gyroscope.
    pub fn reset(&mut self) {
        self.mouse = TiltSignal::NEUTRAL;
        self.joystick = TiltSignal::NEUTRAL;
        self.gyro_neutral = self.gyro.signal();
    }
}

/// Euler angles for a tilt signal: pitch from `y`, roll from `-x`, each within
/// `max_tilt`. Yaw stays at the level's base value.
pub fn tilt_angles(signal: TiltSignal, max_tilt: f32, base_yaw: f32) -> [f32; 3] {
    let x = (signal.y * max_tilt).clamp(-max_tilt, max_tilt);
    let z = (-signal.x * max_tilt).clamp(-max_tilt, max_tilt);
    [x, base_yaw, z]
}

#[cfg(test)]
mod tests {
    use super::*;

    mod router {
        use super::*;

        #[test]
        fn only_active_source_is_read() {
            let mut input = TiltInput::default();
            input.set_mouse(TiltSignal::new(0.5, 0.0));
            input.set_joystick(TiltSignal::new(0.0, -0.5));
            assert_eq!(input.read(), TiltSignal::new(0.5, 0.0));
            input.set_source(InputSource::Joystick);
            assert_eq!(input.read(), TiltSignal::new(0.0, -0.5));
        }

        #[test]
        fn reset_clears_stored_signals() {
            let mut input = TiltInput::default();
            input.set_mouse(TiltSignal::new(1.0, 1.0));
            input.set_joystick(TiltSignal::new(-1.0, 0.3));
            input.reset();
            assert!(input.read().is_neutral());
            input.set_source(InputSource::Joystick);
            assert!(input.read().is_neutral());
        }

        #[test]
        fn unavailable_gyro_reads_neutral() {
            let mut input = TiltInput::default();
            input.set_source(InputSource::Gyroscope);
            assert_eq!(input.gyroscope().state(), GyroState::Unavailable);
            assert!(input.read().is_neutral());
        }
    }

    mod gyro {
        use super::*;

        #[test]
        fn readings_ignored_until_enabled() {
            let (handle, gyro) = Gyroscope::channel(true, 30.0);
            handle.push_reading(15.0, -30.0);
            assert_eq!(gyro.state(), GyroState::Disabled);
            assert!(gyro.signal().is_neutral());

            handle.resolve_permission(true);
            let s = gyro.signal();
            assert!((s.x + 1.0).abs() < 1e-6);
            assert!((s.y - 0.5).abs() < 1e-6);
        }

        #[test]
        fn unavailable_stays_unavailable() {
            let (handle, gyro) = Gyroscope::channel(false, 30.0);
            assert_eq!(handle.resolve_permission(true), GyroState::Unavailable);
            handle.disable();
            assert_eq!(gyro.state(), GyroState::Unavailable);
        }

        #[tokio::test]
        async fn permission_request_resolves_in_background() {
            let (handle, gyro) = Gyroscope::channel(true, 30.0);
            let (tx, rx) = tokio::sync::oneshot::channel::<bool>();
            let task = handle
                .request_permission(async move { rx.await.unwrap_or(false) })
                .unwrap();
            assert_eq!(gyro.state(), GyroState::AwaitingPermission);
            tx.send(true).unwrap();
            assert_eq!(task.await.unwrap(), GyroState::Enabled);
            assert_eq!(gyro.state(), GyroState::Enabled);
        }

        #[tokio::test]
        async fn denied_permission_disables() {
            let (handle, gyro) = Gyroscope::channel(true, 30.0);
            let task = handle.request_permission(async { false }).unwrap();
            assert_eq!(task.await.unwrap(), GyroState::Disabled);
            assert_eq!(gyro.state(), GyroState::Disabled);
        }

        #[test]
        fn reset_relevels_gyroscope() {
            let (handle, gyro) = Gyroscope::channel(true, 30.0);
            handle.resolve_permission(true);
            handle.push_reading(6.0, 3.0);
            let mut input = TiltInput::new(gyro);
            input.set_source(InputSource::Gyroscope);
            assert!(!input.read().is_neutral());
            input.reset();
            assert!(input.read().is_neutral());
            handle.push_reading(12.0, 3.0);
            assert!((input.read().y - 0.2).abs() < 1e-6);
        }
    }

    mod mapping {
        use super::*;

        #[test]
        fn full_deflection_hits_max_tilt() {
            let [x, y, z] = tilt_angles(TiltSignal::new(1.0, -1.0), 0.35, 0.8);
            assert!((x + 0.35).abs() < 1e-6);
            assert!((y - 0.8).abs() < 1e-6);
            assert!((z + 0.35).abs() < 1e-6);
        }

        #[test]
        fn out_of_range_signal_is_clamped() {
            let signal = TiltSignal { x: 4.0, y: -3.0 };
            let [x, _, z] = tilt_angles(signal, 0.35, 0.0);
            assert!(x.abs() <= 0.35);
            assert!(z.abs() <= 0.35);
        }
    }
}
