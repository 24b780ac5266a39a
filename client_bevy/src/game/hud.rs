use bevy::prelude::*;

use crate::constants::{color_from_hex, Colors};

use super::input::{source_label, TiltControl};
use super::level::ActiveLevel;
use super::loader::LevelLoader;
use super::UpdateSet;

pub struct HudPlugin;

#[derive(Component)]
struct HudLevelText;

#[derive(Component)]
struct HudZonesText;

#[derive(Component)]
struct HudSourceText;

#[derive(Component)]
struct HudBannerText;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hud).add_systems(
            Update,
            (update_level_ui, update_zones_ui, update_source_ui, update_banner_ui)
                .in_set(UpdateSet::Visuals),
        );
    }
}

fn spawn_hud(mut commands: Commands) {
    let small = TextFont::from_font_size(13.0);
    let medium = TextFont::from_font_size(18.0);
    let large = TextFont::from_font_size(34.0);

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(20.0),
            top: Val::Px(16.0),
            ..default()
        },
        Text::new(""),
        medium.clone(),
        TextColor(color_from_hex(Colors::HUD_TEXT)),
        HudLevelText,
    ));

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(20.0),
            top: Val::Px(42.0),
            ..default()
        },
        Text::new("zones 0 / 0"),
        medium,
        TextColor(color_from_hex(Colors::HUD_TEXT)),
        HudZonesText,
    ));

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(20.0),
            top: Val::Px(16.0),
            ..default()
        },
        Text::new(""),
        small.clone(),
        TextColor(color_from_hex(Colors::HUD_DIM)),
        HudSourceText,
    ));

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(20.0),
            bottom: Val::Px(14.0),
            ..default()
        },
        Text::new("drag / arrows / WASD tilt   G gyroscope   P pause   R restart"),
        small,
        TextColor(color_from_hex(Colors::HUD_DIM)),
    ));

    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            top: Val::Percent(40.0),
            justify_content: JustifyContent::Center,
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                large,
                TextColor(color_from_hex(Colors::BANNER)),
                TextLayout::new_with_justify(Justify::Center),
                HudBannerText,
            ));
        });
}

fn update_level_ui(active: Res<ActiveLevel>, mut q_text: Query<&mut Text, With<HudLevelText>>) {
    let Some(level) = &active.level else {
        return;
    };
    if let Ok(mut text) = q_text.single_mut() {
        let name = if level.config.name.is_empty() {
            level.id()
        } else {
            level.config.name.as_str()
        };
        if text.0 != name {
            text.0 = name.to_string();
        }
    }
}

fn update_zones_ui(active: Res<ActiveLevel>, mut q_text: Query<&mut Text, With<HudZonesText>>) {
    if let Ok(mut text) = q_text.single_mut() {
        text.0 = zones_label(active.report.occupied, active.report.total_zones);
    }
}

fn update_source_ui(
    control: Res<TiltControl>,
    active: Res<ActiveLevel>,
    mut q_text: Query<&mut Text, With<HudSourceText>>,
) {
    if let Ok(mut text) = q_text.single_mut() {
        let paused = if active.driver.is_paused() { "  [paused]" } else { "" };
        text.0 = format!("tilt: {}{}", source_label(&control.input), paused);
    }
}

fn update_banner_ui(
    active: Res<ActiveLevel>,
    loader: Res<LevelLoader>,
    mut q_text: Query<(&mut Text, &mut TextColor), With<HudBannerText>>,
) {
    let Ok((mut text, mut color)) = q_text.single_mut() else {
        return;
    };

    let (message, hex) = if let Some(error) = &active.error {
        (format!("Could not load level\n{error}"), Colors::ERROR)
    } else if loader.is_pending() {
        ("Loading...".to_string(), Colors::HUD_TEXT)
    } else if let Some(level) = active.level.as_ref().filter(|l| l.win.is_won()) {
        (win_banner(level.next_level()), Colors::BANNER)
    } else {
        (String::new(), Colors::BANNER)
    };

    if text.0 != message {
        text.0 = message;
        color.0 = color_from_hex(hex);
    }
}

fn zones_label(occupied: usize, total: usize) -> String {
    format!("zones {occupied} / {total}")
}

fn win_banner(next_level: Option<&str>) -> String {
    match next_level {
        Some(next) => format!("Solved!\nEnter: continue to {next}"),
        None => "Solved!\nThat was the last level".to_string(),
    }
}
