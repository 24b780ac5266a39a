use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use maze_shared::input::{joystick_signal, mouse_signal};
use maze_shared::TiltSignal;
use maze_sim::input::{GyroState, InputSource, TiltInput};

use super::loader::LevelLoader;
use super::UpdateSet;

pub struct InputPlugin;

/// Tilt router shared by the input systems and the fixed-step driver.
#[derive(Resource)]
pub(crate) struct TiltControl {
    pub(crate) input: TiltInput,
}

impl TiltControl {
    pub(crate) fn new(input: TiltInput) -> Self {
        Self { input }
    }
}

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (toggle_gyroscope, mouse_tilt, keyboard_tilt)
                .chain()
                .in_set(UpdateSet::Input),
        );
    }
}

/// Left-drag tilts toward the cursor; releasing the button levels the maze.
fn mouse_tilt(
    mut control: ResMut<TiltControl>,
    buttons: Res<ButtonInput<MouseButton>>,
    q_window: Query<&Window, With<PrimaryWindow>>,
) {
    if buttons.just_pressed(MouseButton::Left) {
        control.input.set_source(InputSource::Mouse);
    }
    if buttons.just_released(MouseButton::Left) {
        control.input.set_mouse(TiltSignal::NEUTRAL);
        return;
    }
    if !buttons.pressed(MouseButton::Left) {
        return;
    }

    let Ok(window) = q_window.single() else {
        return;
    };
    if let Some(cursor) = window.cursor_position() {
        control
            .input
            .set_mouse(mouse_signal([cursor.x, cursor.y], [window.width(), window.height()]));
    }
}

/// Arrow keys and WASD act as a digital stick.
fn keyboard_tilt(mut control: ResMut<TiltControl>, keys: Res<ButtonInput<KeyCode>>) {
    let offset = key_offset(
        keys.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]),
        keys.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]),
        keys.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW]),
        keys.any_pressed([KeyCode::ArrowDown, KeyCode::KeyS]),
    );

    if offset != [0.0, 0.0] {
        control.input.set_source(InputSource::Joystick);
    }
    control.input.set_joystick(joystick_signal(offset, 1.0));
}

fn toggle_gyroscope(
    mut control: ResMut<TiltControl>,
    keys: Res<ButtonInput<KeyCode>>,
    loader: Res<LevelLoader>,
) {
    if !keys.just_pressed(KeyCode::KeyG) {
        return;
    }

    if control.input.source() == InputSource::Gyroscope {
        control.input.set_source(InputSource::Mouse);
        return;
    }

    control.input.set_source(InputSource::Gyroscope);
    match control.input.gyroscope().state() {
        GyroState::Unavailable => warn!("No gyroscope on this device; the maze stays level"),
        GyroState::Disabled => loader.request_gyro_permission(),
        GyroState::AwaitingPermission | GyroState::Enabled => {}
    }
}

/// Stick offset for the held directions; up is away from the viewer.
fn key_offset(left: bool, right: bool, up: bool, down: bool) -> [f32; 2] {
    let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
    [axis(left, right), axis(up, down)]
}

pub(crate) fn source_label(input: &TiltInput) -> String {
    match input.source() {
        InputSource::Mouse => "mouse (drag)".to_string(),
        InputSource::Joystick => "keyboard".to_string(),
        InputSource::Gyroscope => match input.gyroscope().state() {
            GyroState::Unavailable => "gyroscope (unavailable)".to_string(),
            GyroState::AwaitingPermission => "gyroscope (waiting for permission)".to_string(),
            GyroState::Enabled => "gyroscope".to_string(),
            GyroState::Disabled => "gyroscope (denied)".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_cancel() {
        assert_eq!(key_offset(true, true, false, false), [0.0, 0.0]);
        assert_eq!(key_offset(false, false, true, true), [0.0, 0.0]);
    }

    #[test]
    fn up_is_negative_y() {
        assert_eq!(key_offset(false, false, true, false), [0.0, -1.0]);
        assert_eq!(key_offset(true, false, false, true), [-1.0, 1.0]);
    }

    #[test]
    fn diagonal_stays_on_unit_disc() {
        let signal = joystick_signal(key_offset(false, true, false, true), 1.0);
        let len = (signal.x * signal.x + signal.y * signal.y).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }

    #[test]
    fn desktop_gyroscope_reads_unavailable() {
        let mut input = TiltInput::default();
        input.set_source(InputSource::Gyroscope);
        assert_eq!(source_label(&input), "gyroscope (unavailable)");
        assert!(input.read().is_neutral());
    }
}
