mod camera;
mod catalog;
mod clock;
mod input;
mod orbit;
mod registry;
mod selection;
mod sim;
mod textures;
mod ui;
mod visibility;

use bevy::core_pipeline::bloom::BloomSettings;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use camera::{MainCamera, OrbitCamera};
use catalog::{Catalog, CatalogError};
use input::InputPlugin;
use selection::SelectionPlugin;
use sim::{SimPlugin, SimSettings, SolarSystem};
use textures::TexturePlugin;
use ui::UiPlugin;

fn main() -> Result<(), CatalogError> {
    let settings = SimSettings::default();
    let solar = SolarSystem::new(&Catalog::embedded()?, &settings)?;

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.02)))
        .insert_resource(Msaa::Sample4)
        .insert_resource(settings)
        .insert_resource(solar)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "orrery — solar system".into(),
                        resolution: (1400., 900.).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    level: Level::INFO,
                    filter: "wgpu=error,naga=warn,orrery=debug".into(),
                    ..default()
                }),
        )
        .add_plugins((SimPlugin, TexturePlugin, SelectionPlugin, InputPlugin, UiPlugin))
        .add_systems(Startup, setup_camera)
        .run();

    Ok(())
}

fn setup_camera(mut commands: Commands, settings: Res<SimSettings>) {
    let eye = Vec3::new(0.0, 120.0, 220.0);
    commands.spawn((
        Camera3dBundle {
            camera: Camera {
                hdr: true,
                ..default()
            },
            tonemapping: Tonemapping::TonyMcMapface,
            transform: Transform::from_translation(eye).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        BloomSettings::default(),
        OrbitCamera::new(Vec3::ZERO, eye).with_limits(settings.min_distance, settings.max_distance),
        MainCamera,
    ));
}
