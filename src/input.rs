use bevy::input::mouse::{MouseButtonInput, MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::ButtonState;
use bevy::input::touch::Touches;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::camera::{MainCamera, OrbitCamera};
use crate::selection::SelectionRequest;
use crate::sim::{SimSettings, SolarSystem, TickSet};

/// Cursor travel in pixels before a press counts as a drag rather than a click.
const DRAG_THRESHOLD: f32 = 5.0;
/// Wheel lines per zoom step.
const LINES_PER_STEP: f32 = 1.0;
const PIXELS_PER_STEP: f32 = 40.0;

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DragState::default()).add_systems(
            Update,
            (
                (camera_controls, touch_controls, pointer_pick, ease_camera).chain(),
                pause_toggle,
                zoom_keys,
                time_scale_toggle,
                orbits_toggle,
                help_toggle,
                diagnostics_toggle,
                clear_selection,
            )
                .in_set(TickSet::Presentation),
        );
    }
}

#[derive(Resource, Default)]
struct DragState {
    start: Option<Vec2>,
    moved: bool,
    pinch: Option<f32>,
}

fn camera_controls(
    mut contexts: EguiContexts,
    mut scroll_evr: EventReader<MouseWheel>,
    mut motion: EventReader<MouseMotion>,
    buttons: Res<ButtonInput<MouseButton>>,
    settings: Res<SimSettings>,
    mut q_cam: Query<&mut OrbitCamera, With<MainCamera>>,
) {
    let Ok(mut cam) = q_cam.get_single_mut() else {
        return;
    };
    if contexts.ctx_mut().wants_pointer_input() {
        scroll_evr.clear();
        motion.clear();
        return;
    }

    for ev in scroll_evr.read() {
        let steps = match ev.unit {
            MouseScrollUnit::Line => ev.y / LINES_PER_STEP,
            MouseScrollUnit::Pixel => ev.y / PIXELS_PER_STEP,
        };
        if steps != 0.0 {
            cam.zoom((1.0 - settings.zoom_step).powf(steps));
        }
    }

    let delta: Vec2 = motion.read().map(|m| m.delta).sum();
    if delta == Vec2::ZERO {
        return;
    }
    // Rotate
    if buttons.pressed(MouseButton::Left) {
        let s = settings.orbit_sensitivity;
        cam.orbit(-delta.x * s, delta.y * s);
    }
    // Panning
    if buttons.pressed(MouseButton::Right) {
        let scale = cam.distance() * 0.002;
        cam.pan(-delta.x * scale, delta.y * scale);
    }
}

fn touch_controls(
    touches: Res<Touches>,
    settings: Res<SimSettings>,
    mut drag: ResMut<DragState>,
    mut q_cam: Query<&mut OrbitCamera, With<MainCamera>>,
) {
    let Ok(mut cam) = q_cam.get_single_mut() else {
        return;
    };
    let active: Vec<_> = touches.iter().collect();
    match active.as_slice() {
        [one] => {
            drag.pinch = None;
            let d = one.delta();
            if d != Vec2::ZERO {
                let s = settings.orbit_sensitivity;
                cam.orbit(-d.x * s, d.y * s);
            }
        }
        [a, b, ..] => {
            let span = a.position().distance(b.position());
            if let Some(prev) = drag.pinch {
                if prev > 1.0 && span > 1.0 {
                    cam.zoom(prev / span);
                }
            }
            drag.pinch = Some(span);
        }
        [] => drag.pinch = None,
    }
}

/// Clicks and taps that did not turn into drags become pick requests.
fn pointer_pick(
    mut contexts: EguiContexts,
    mut mousebtn_evr: EventReader<MouseButtonInput>,
    mut drag: ResMut<DragState>,
    touches: Res<Touches>,
    windows: Query<&Window>,
    mut ev_select: EventWriter<SelectionRequest>,
) {
    let Ok(win) = windows.get_single() else {
        return;
    };
    let over_ui = contexts.ctx_mut().wants_pointer_input();

    for ev in mousebtn_evr.read() {
        if ev.button != MouseButton::Left {
            continue;
        }
        match ev.state {
            ButtonState::Pressed if !over_ui => {
                drag.start = win.cursor_position();
                drag.moved = false;
            }
            ButtonState::Released => {
                let start = drag.start.take();
                if let Some(cursor) = click_target(start, drag.moved, over_ui, win.cursor_position()) {
                    ev_select.send(SelectionRequest::AtCursor(cursor));
                }
            }
            _ => {}
        }
    }

    if let (Some(start), Some(cursor)) = (drag.start, win.cursor_position()) {
        if start.distance(cursor) > DRAG_THRESHOLD {
            drag.moved = true;
        }
    }

    for touch in touches.iter_just_released() {
        if touch.distance().length() <= DRAG_THRESHOLD && !over_ui {
            ev_select.send(SelectionRequest::AtCursor(touch.position()));
        }
    }
}

/// Cursor position to pick at on release, if the click stayed in the scene.
fn click_target(
    start: Option<Vec2>,
    moved: bool,
    over_ui: bool,
    cursor: Option<Vec2>,
) -> Option<Vec2> {
    match (start, moved, over_ui) {
        (Some(_), false, false) => cursor,
        _ => None,
    }
}

/// Eases the camera transform toward the controller pose, every frame.
fn ease_camera(
    time: Res<Time>,
    settings: Res<SimSettings>,
    mut q_cam: Query<(&mut Transform, &mut OrbitCamera), With<MainCamera>>,
) {
    let Ok((mut t, mut cam)) = q_cam.get_single_mut() else {
        return;
    };
    cam.ease(&mut t, settings.damping, time.delta_seconds());
}

fn pause_toggle(mut solar: ResMut<SolarSystem>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Space) {
        solar.clock.toggle();
        debug!("simulation {:?}", solar.clock.state());
    }
}

fn zoom_keys(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<SimSettings>,
    mut q_cam: Query<&mut OrbitCamera, With<MainCamera>>,
) {
    let Ok(mut cam) = q_cam.get_single_mut() else {
        return;
    };
    if keys.just_pressed(KeyCode::Equal) || keys.just_pressed(KeyCode::NumpadAdd) {
        cam.zoom_in(settings.zoom_step);
    }
    if keys.just_pressed(KeyCode::Minus) || keys.just_pressed(KeyCode::NumpadSubtract) {
        cam.zoom_out(settings.zoom_step);
    }
}

fn time_scale_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::BracketRight) {
        settings.scale_time(2.0);
    }
    if keys.just_pressed(KeyCode::BracketLeft) {
        settings.scale_time(0.5);
    }
}

fn orbits_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyO) {
        settings.show_orbits = !settings.show_orbits;
    }
}

fn help_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        settings.show_help = !settings.show_help;
    }
}

fn diagnostics_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        settings.show_diagnostics = !settings.show_diagnostics;
    }
}

fn clear_selection(mut ev_select: EventWriter<SelectionRequest>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Escape) {
        ev_select.send(SelectionRequest::Clear);
    }
}
