use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::camera::{MainCamera, OrbitCamera};
use crate::clock::LoopState;
use crate::selection::{Selection, SelectionRequest};
use crate::sim::{SimSettings, SolarSystem, TickSet};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin).add_systems(
            Update,
            (controls_ui, bodies_ui, info_ui, selection_label, help_ui, diagnostics_ui)
                .chain()
                .in_set(TickSet::Presentation),
        );
    }
}

fn controls_ui(
    mut contexts: EguiContexts,
    mut solar: ResMut<SolarSystem>,
    mut settings: ResMut<SimSettings>,
    mut q_cam: Query<&mut OrbitCamera, With<MainCamera>>,
) {
    egui::Window::new("Controls").show(contexts.ctx_mut(), |ui| {
        let state = solar.clock.state();
        ui.horizontal(|ui| {
            let label = match state {
                LoopState::Running => "Pause",
                LoopState::Paused => "Resume",
            };
            if ui.button(label).clicked() {
                solar.clock.toggle();
            }
            ui.label(format!("{state:?}"));
        });

        if let Ok(mut cam) = q_cam.get_single_mut() {
            ui.horizontal(|ui| {
                if ui.button("Zoom in").clicked() {
                    cam.zoom_in(settings.zoom_step);
                }
                if ui.button("Zoom out").clicked() {
                    cam.zoom_out(settings.zoom_step);
                }
                ui.label(format!("{:.1} u", cam.distance()));
            });
        }

        ui.separator();

        ui.add(egui::Slider::new(&mut settings.time_scale, 0.25..=8.0).text("Sim Rate"));
        ui.label(format!("Ticks: {}", solar.clock.ticks()));
        ui.checkbox(&mut settings.show_orbits, "Orbits");
    });
}

fn bodies_ui(
    mut contexts: EguiContexts,
    mut solar: ResMut<SolarSystem>,
    mut ev_select: EventWriter<SelectionRequest>,
) {
    egui::Window::new("Bodies")
        .default_pos(egui::pos2(12.0, 220.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.label("Show");
            let groups: Vec<String> = solar.visibility.groups().map(str::to_owned).collect();
            for group in groups {
                let mut visible = solar.group_visible(&group);
                if ui.checkbox(&mut visible, group.as_str()).changed() {
                    solar.set_group_visible(&group, visible);
                }
            }

            ui.separator();

            egui::ScrollArea::vertical()
                .max_height(320.0)
                .show(ui, |ui| {
                    for (category, ids) in solar.registry.by_category() {
                        egui::CollapsingHeader::new(category.label()).show(ui, |ui| {
                            for id in ids {
                                let Some(body) = solar.registry.get(id) else {
                                    continue;
                                };
                                if ui.selectable_label(false, body.name.as_str()).clicked() {
                                    ev_select.send(SelectionRequest::ByName(body.name.clone()));
                                }
                            }
                        });
                    }
                });
        });
}

fn info_ui(
    mut contexts: EguiContexts,
    selection: Res<Selection>,
    mut ev_select: EventWriter<SelectionRequest>,
) {
    let Some(selected) = selection.current.as_ref() else {
        return;
    };
    egui::Window::new("Info")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
        .default_width(280.0)
        .show(contexts.ctx_mut(), |ui| {
            ui.heading(selected.name.as_str());
            ui.label(selected.description.as_str());
            if ui.button("Close").clicked() {
                ev_select.send(SelectionRequest::Clear);
            }
        });
}

/// Name tag pinned over the selected body, re-projected every frame.
fn selection_label(
    mut contexts: EguiContexts,
    selection: Res<Selection>,
    solar: Res<SolarSystem>,
    q_cam: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
) {
    let Some(selected) = selection.current.as_ref() else {
        return;
    };
    let Some(body) = solar.registry.get(selected.id) else {
        return;
    };
    if !body.visible {
        return;
    }
    let Ok((camera, cam_transform)) = q_cam.get_single() else {
        return;
    };
    let anchor = body.position + Vec3::Y * body.size * 1.2;
    let Some(screen) = camera.world_to_viewport(cam_transform, anchor) else {
        return;
    };

    egui::Area::new(egui::Id::new("selection_label"))
        .fixed_pos(egui::pos2(screen.x, screen.y))
        .pivot(egui::Align2::CENTER_BOTTOM)
        .interactable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label(egui::RichText::new(body.name.as_str()).color(egui::Color32::WHITE));
        });
}

fn help_ui(mut contexts: EguiContexts, settings: Res<SimSettings>) {
    if !settings.show_help {
        return;
    }
    egui::Window::new("Help")
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.label("Left Mouse: Orbit camera (drag) / Select (click)");
            ui.label("Right Mouse: Pan camera (drag)");
            ui.label("Mouse Wheel, +/-: Zoom");
            ui.label("Touch: Drag to orbit, pinch to zoom, tap to select");
            ui.label("Space: Pause/Resume");
            ui.label("[/]: Adjust Sim Speed");
            ui.label("O: Toggle Orbits");
            ui.label("Esc: Clear Selection");
            ui.label("H: Toggle Help");
            ui.label("F3: Diagnostics");
        });
}

fn diagnostics_ui(
    mut contexts: EguiContexts,
    settings: Res<SimSettings>,
    diagnostics: Res<DiagnosticsStore>,
) {
    if !settings.show_diagnostics {
        return;
    }
    egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT) {
            if let Some(value) = entity_count.value() {
                ui.label(format!("Entities: {}", value));
            }
        }
    });
}
