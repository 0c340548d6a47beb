use bevy::asset::LoadState;
use bevy::prelude::*;
use std::collections::HashSet;

use crate::catalog::FallbackEntry;
use crate::sim::TickSet;

pub struct TexturePlugin;
impl Plugin for TexturePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, poll_texture_loads.in_set(TickSet::Presentation));
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stage {
    Primary,
    Fallback,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadOutcome {
    Pending,
    Loaded,
    Failed,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TextureStep {
    Wait,
    Apply,
    TryFallback(String),
    FlatColor,
}

/// What to do next given the stage and how its load went.
pub fn next_step(stage: Stage, outcome: LoadOutcome, fallback_texture: Option<&str>) -> TextureStep {
    match (outcome, stage) {
        (LoadOutcome::Pending, _) => TextureStep::Wait,
        (LoadOutcome::Loaded, _) => TextureStep::Apply,
        (LoadOutcome::Failed, Stage::Primary) => match fallback_texture {
            Some(path) => TextureStep::TryFallback(path.to_owned()),
            None => TextureStep::FlatColor,
        },
        (LoadOutcome::Failed, Stage::Fallback) => TextureStep::FlatColor,
    }
}

/// In-flight texture for one body's material. Removed once resolved.
#[derive(Component, Debug)]
pub struct TextureLoad {
    handle: Handle<Image>,
    path: String,
    stage: Stage,
    fallback_texture: Option<String>,
    fallback_color: Option<Color>,
}

impl TextureLoad {
    /// Starts the body's own texture, or the category fallback texture when
    /// the body has none. `None` means the material keeps its flat color.
    pub fn start(
        asset_server: &AssetServer,
        texture: Option<&str>,
        fallback: Option<&FallbackEntry>,
    ) -> Option<Self> {
        let fallback_texture = fallback.and_then(|f| f.texture.clone());
        let fallback_color = fallback.map(|f| {
            let [r, g, b] = f.color;
            Color::srgb(r, g, b)
        });
        let (path, stage, fallback_texture) = match (texture, fallback_texture) {
            (Some(t), fb) => (t.to_owned(), Stage::Primary, fb),
            (None, Some(fb)) => (fb, Stage::Fallback, None),
            (None, None) => return None,
        };
        Some(Self {
            handle: asset_server.load(path.clone()),
            path,
            stage,
            fallback_texture,
            fallback_color,
        })
    }
}

fn outcome(asset_server: &AssetServer, handle: &Handle<Image>) -> (LoadOutcome, Option<String>) {
    match asset_server.get_load_state(handle.id()) {
        Some(LoadState::Loaded) => (LoadOutcome::Loaded, None),
        Some(LoadState::Failed(err)) => (LoadOutcome::Failed, Some(err.to_string())),
        _ => (LoadOutcome::Pending, None),
    }
}

fn poll_texture_loads(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut q: Query<(Entity, &Name, &Handle<StandardMaterial>, &mut TextureLoad)>,
    mut reported: Local<HashSet<String>>,
) {
    for (entity, name, material, mut load) in &mut q {
        let (result, err) = outcome(&asset_server, &load.handle);
        if let Some(err) = err {
            if reported.insert(load.path.clone()) {
                warn!("texture '{}' failed to load: {err}", load.path);
            }
        }

        match next_step(load.stage, result, load.fallback_texture.as_deref()) {
            TextureStep::Wait => {}
            TextureStep::Apply => {
                if let Some(m) = materials.get_mut(material) {
                    m.base_color = Color::WHITE;
                    m.base_color_texture = Some(load.handle.clone());
                }
                commands.entity(entity).remove::<TextureLoad>();
            }
            TextureStep::TryFallback(path) => {
                debug!("{name}: falling back to '{path}'");
                load.handle = asset_server.load(path.clone());
                load.path = path;
                load.stage = Stage::Fallback;
                load.fallback_texture = None;
            }
            TextureStep::FlatColor => {
                if let (Some(m), Some(color)) = (materials.get_mut(material), load.fallback_color) {
                    m.base_color = color;
                    m.base_color_texture = None;
                }
                debug!("{name}: using flat fallback color");
                commands.entity(entity).remove::<TextureLoad>();
            }
        }
    }
}
