use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::components::{HeadlessMode, TickSet};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (grab_cursor, spawn_controls_hint))
            .add_systems(Update, (toggle_cursor_grab, move_fly_camera).in_set(TickSet::Camera));
    }
}

/// World units per second.
pub const MOVE_SPEED: f32 = 20.0;
/// Degrees per pixel of mouse motion.
pub const MOUSE_SENSITIVITY: f32 = 0.1;

#[derive(Component, Clone, Copy, Default, Debug)]
pub struct FlyCamera {
    /// Degrees; positive turns right.
    pub yaw: f32,
    /// Degrees; positive looks down. Clamped to [-90, 90].
    pub pitch: f32,
}

impl FlyCamera {
    pub fn look(&mut self, mouse_delta: Vec2) {
        self.yaw += MOUSE_SENSITIVITY * mouse_delta.x;
        self.pitch = (self.pitch + MOUSE_SENSITIVITY * mouse_delta.y).clamp(-90.0, 90.0);
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            -self.yaw.to_radians(),
            -self.pitch.to_radians(),
            0.0,
        )
    }
}

fn wasd_direction(keys: &ButtonInput<KeyCode>) -> Vec3 {
    let mut dir = Vec3::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        dir += Vec3::NEG_Z;
    }
    if keys.pressed(KeyCode::KeyS) {
        dir += Vec3::Z;
    }
    if keys.pressed(KeyCode::KeyA) {
        dir += Vec3::NEG_X;
    }
    if keys.pressed(KeyCode::KeyD) {
        dir += Vec3::X;
    }
    dir
}

fn move_fly_camera(
    time: Res<Time>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mouse: Option<Res<AccumulatedMouseMotion>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&mut FlyCamera, &mut Transform)>,
) {
    // Leave the camera alone while the cursor is released.
    let grabbed = windows
        .get_single()
        .map_or(true, |w| w.cursor_options.grab_mode != CursorGrabMode::None);
    let mouse_delta = mouse
        .filter(|_| grabbed)
        .map_or(Vec2::ZERO, |m| m.delta);
    let dir = keys.as_deref().map_or(Vec3::ZERO, wasd_direction);
    let step = MOVE_SPEED * time.delta_secs();

    for (mut fly, mut transform) in cameras.iter_mut() {
        if mouse_delta != Vec2::ZERO {
            fly.look(mouse_delta);
        }
        transform.rotation = fly.rotation();
        if dir != Vec3::ZERO {
            let offset = transform.rotation * dir * step;
            transform.translation += offset;
        }
    }
}

fn set_grab(window: &mut Window, grab: bool) {
    window.cursor_options.grab_mode = if grab {
        CursorGrabMode::Locked
    } else {
        CursorGrabMode::None
    };
    window.cursor_options.visible = !grab;
}

fn grab_cursor(
    headless: Option<Res<HeadlessMode>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if headless.is_some_and(|h| h.0) {
        return;
    }
    if let Ok(mut window) = windows.get_single_mut() {
        set_grab(&mut window, true);
    }
}

#[derive(Component)]
pub struct ControlsHint;

pub const CONTROLS_TEXT: &str =
    "WASD: move    Mouse: look\nEsc: release cursor    Click: capture cursor";

fn spawn_controls_hint(mut commands: Commands, headless: Option<Res<HeadlessMode>>) {
    if headless.is_some_and(|h| h.0) {
        return;
    }
    commands.spawn((
        Name::new("ControlsHint"),
        ControlsHint,
        Text::new(CONTROLS_TEXT),
        TextFont {
            font_size: 15.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));
}

/// Escape releases the cursor, a left click takes it back.
fn toggle_cursor_grab(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = windows.get_single_mut() else {
        return;
    };
    if keys.is_some_and(|k| k.just_pressed(KeyCode::Escape)) {
        set_grab(&mut window, false);
    } else if buttons.is_some_and(|b| b.just_pressed(MouseButton::Left)) {
        set_grab(&mut window, true);
    }
}
