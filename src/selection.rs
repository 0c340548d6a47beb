use bevy::prelude::*;
use std::time::Duration;

use crate::camera::{MainCamera, OrbitCamera};
use crate::registry::BodyId;
use crate::sim::{SimSettings, SolarSystem, TickSet};

pub struct SelectionPlugin;
impl Plugin for SelectionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Selection>()
            .add_event::<SelectionRequest>()
            .add_systems(
                Update,
                handle_selection_requests.in_set(TickSet::Presentation),
            );
    }
}

#[derive(Event, Clone, Debug)]
pub enum SelectionRequest {
    ByName(String),
    /// Cursor position in viewport coordinates.
    AtCursor(Vec2),
    Clear,
}

/// What the info panel shows for the focused body.
#[derive(Clone, PartialEq, Debug)]
pub struct SelectedBody {
    pub id: BodyId,
    pub name: String,
    pub description: String,
}

#[derive(Resource, Default, Debug)]
pub struct Selection {
    pub current: Option<SelectedBody>,
}

/// Camera stand-off for a body: never closer than `min`, otherwise `factor` radii.
pub fn framing_distance(size: f32, factor: f32, min: f32) -> f32 {
    (size * factor).max(min)
}

/// Pauses, frames the body, and arms the auto-resume.
pub fn focus_on(
    solar: &mut SolarSystem,
    camera: &mut OrbitCamera,
    settings: &SimSettings,
    id: BodyId,
) -> Option<SelectedBody> {
    let body = solar.registry.get(id)?;
    let distance = framing_distance(body.size, settings.framing_factor, settings.min_framing);
    camera.focus(body.position, distance);
    let selected = SelectedBody {
        id,
        name: body.name.clone(),
        description: body.description.clone(),
    };

    if solar.clock.pause() {
        debug!("simulation paused by selection");
    }
    solar
        .clock
        .schedule_resume(Duration::from_secs_f32(settings.auto_resume_delay.max(0.0)));
    Some(selected)
}

fn handle_selection_requests(
    mut requests: EventReader<SelectionRequest>,
    mut solar: ResMut<SolarSystem>,
    mut selection: ResMut<Selection>,
    settings: Res<SimSettings>,
    mut q_cam: Query<(&Camera, &GlobalTransform, &mut OrbitCamera), With<MainCamera>>,
) {
    let Ok((camera, cam_transform, mut orbit_cam)) = q_cam.get_single_mut() else {
        return;
    };

    for request in requests.read() {
        let hit = match request {
            SelectionRequest::Clear => {
                selection.current = None;
                continue;
            }
            SelectionRequest::ByName(name) => solar.registry.resolve_name(name),
            SelectionRequest::AtCursor(cursor) => camera
                .viewport_to_world(cam_transform, *cursor)
                .and_then(|ray| solar.registry.pick(ray.origin, *ray.direction)),
        };

        let Some(id) = hit else {
            debug!("selection request {request:?} matched nothing");
            continue;
        };
        if let Some(selected) = focus_on(&mut solar, &mut orbit_cam, &settings, id) {
            info!("selected {}", selected.name);
            selection.current = Some(selected);
        }
    }
}
