use bevy::prelude::*;
use rand::{RngCore, SeedableRng};

use crate::catalog::{Catalog, CatalogError, Category, FallbackEntry};
use crate::clock::SimClock;
use crate::orbit;
use crate::registry::{BodyId, BodyRegistry};
use crate::textures::TextureLoad;
use crate::visibility::VisibilityIndex;

/// Number of sample points per orbit path.
const ORBIT_SAMPLES: usize = 128;
const ORBIT_ALPHA: f32 = 0.35;

/// Per-frame work is split in two: the pausable simulation tick first, then
/// the presentation tick that always runs.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TickSet {
    Simulation,
    Presentation,
}

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        add_tick_systems(app);
        app.insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 40.0,
        })
        .add_systems(Startup, spawn_scene)
        .add_systems(
            Update,
            (sync_bodies, draw_orbits)
                .chain()
                .after(tick_auto_resume)
                .in_set(TickSet::Presentation),
        );
    }
}

/// Loop controller wiring: the simulation tick runs only while the clock is
/// Running, the auto-resume timer ticks every frame after it.
fn add_tick_systems(app: &mut App) {
    app.init_resource::<SimSettings>()
        .configure_sets(Update, (TickSet::Simulation, TickSet::Presentation).chain())
        .add_systems(
            Update,
            advance_orbits
                .in_set(TickSet::Simulation)
                .run_if(simulation_running),
        )
        .add_systems(Update, tick_auto_resume.in_set(TickSet::Presentation));
}

#[derive(Resource, Clone)]
pub struct SimSettings {
    pub time_scale: f32,
    /// Seconds before a selection-triggered pause lifts on its own.
    pub auto_resume_delay: f32,
    /// Fraction of the current distance moved per zoom step.
    pub zoom_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub framing_factor: f32,
    pub min_framing: f32,
    /// Camera easing rate, per second.
    pub damping: f32,
    /// Radians per pixel of drag.
    pub orbit_sensitivity: f32,
    pub show_orbits: bool,
    pub show_help: bool,
    pub show_diagnostics: bool,
    pub deterministic: bool,
    pub seed: u64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            auto_resume_delay: 3.0,
            zoom_step: 0.1,
            min_distance: 1.0,
            max_distance: 800.0,
            framing_factor: 5.0,
            min_framing: 10.0,
            damping: 4.0,
            orbit_sensitivity: 0.005,
            show_orbits: true,
            show_help: true,
            show_diagnostics: false,
            deterministic: false,
            seed: 0,
        }
    }
}

impl SimSettings {
    pub fn scale_time(&mut self, factor: f32) {
        self.time_scale = (self.time_scale * factor).clamp(0.25, 8.0);
    }
}

/// Simulation context: the bodies, their visibility groups and the loop clock.
#[derive(Resource)]
pub struct SolarSystem {
    pub registry: BodyRegistry,
    pub visibility: VisibilityIndex,
    pub clock: SimClock,
    fallbacks: Vec<FallbackEntry>,
}

impl SolarSystem {
    pub fn new(catalog: &Catalog, settings: &SimSettings) -> Result<Self, CatalogError> {
        let mut rng: Box<dyn RngCore> = if settings.deterministic {
            Box::new(rand::rngs::StdRng::seed_from_u64(settings.seed))
        } else {
            Box::new(rand::thread_rng())
        };

        let registry = BodyRegistry::from_entries(catalog.expand(&mut rng))?;
        let visibility = VisibilityIndex::build(&registry);
        Ok(Self {
            registry,
            visibility,
            clock: SimClock::default(),
            fallbacks: catalog.fallbacks.clone(),
        })
    }

    pub fn fallback(&self, category: Category) -> Option<&FallbackEntry> {
        self.fallbacks.iter().find(|f| f.category == category)
    }

    pub fn set_group_visible(&mut self, group: &str, visible: bool) -> usize {
        self.visibility
            .set_visible(&mut self.registry, group, visible)
    }

    pub fn group_visible(&self, group: &str) -> bool {
        self.visibility.is_visible(&self.registry, group)
    }
}

/// Links a scene entity to its registry entry.
#[derive(Component, Clone, Copy, Debug)]
pub struct Body(pub BodyId);

pub fn simulation_running(solar: Res<SolarSystem>) -> bool {
    solar.clock.is_running()
}

fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
    solar: Res<SolarSystem>,
) {
    let sphere = meshes.add(Sphere::new(1.0).mesh().uv(32, 18));

    for (id, body) in solar.registry.iter() {
        let mut material = StandardMaterial {
            base_color: body.fallback_color,
            perceptual_roughness: 0.9,
            ..default()
        };
        if body.emissive {
            material.emissive = LinearRgba::from(body.fallback_color) * 6.0;
            material.unlit = true;
        }
        let material = materials.add(material);

        let mut entity = commands.spawn((
            PbrBundle {
                mesh: sphere.clone(),
                material,
                transform: Transform::from_translation(body.position)
                    .with_scale(Vec3::splat(body.size)),
                ..default()
            },
            Body(id),
            Name::new(body.name.clone()),
        ));

        let fallback = solar.fallback(body.category);
        if let Some(load) = TextureLoad::start(&asset_server, body.texture.as_deref(), fallback) {
            entity.insert(load);
        }

        if body.emissive {
            entity.with_children(|parent| {
                parent.spawn(PointLightBundle {
                    point_light: PointLight {
                        intensity: 50_000_000.0,
                        range: 1000.0,
                        shadows_enabled: false,
                        ..default()
                    },
                    ..default()
                });
            });
        }
    }

    info!(
        "spawned {} bodies in {} visibility groups",
        solar.registry.len(),
        solar.visibility.groups().count()
    );
}

fn advance_orbits(mut solar: ResMut<SolarSystem>, settings: Res<SimSettings>) {
    let solar = solar.as_mut();
    solar.registry.advance(settings.time_scale);
    solar.clock.record_tick();
}

fn tick_auto_resume(mut solar: ResMut<SolarSystem>, time: Res<Time>) {
    if !solar.clock.has_pending_resume() {
        return;
    }
    if solar.clock.tick(time.delta()) {
        debug!("auto-resume fired, simulation running");
    }
}

fn sync_bodies(
    solar: Res<SolarSystem>,
    mut q: Query<(&Body, &mut Transform, &mut Visibility)>,
) {
    if !solar.is_changed() {
        return;
    }
    for (body, mut t, mut vis) in &mut q {
        let Some(b) = solar.registry.get(body.0) else {
            continue;
        };
        t.translation = b.position;
        t.rotation = Quat::from_rotation_y(b.rotation);
        let wanted = if b.visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *vis != wanted {
            *vis = wanted;
        }
    }
}

fn draw_orbits(mut gizmos: Gizmos, solar: Res<SolarSystem>, settings: Res<SimSettings>) {
    if !settings.show_orbits {
        return;
    }
    for (_, body) in solar.registry.iter() {
        let Some(o) = body.orbit else {
            continue;
        };
        // belt members would drown the rest in lines
        if !body.visible || body.category == Category::Asteroid {
            continue;
        }
        let base = body
            .parent
            .and_then(|p| solar.registry.get(p))
            .map_or(Vec3::ZERO, |p| p.position)
            + Vec3::Y * body.elevation;
        let points = orbit::orbit_path(o.radius, o.eccentricity, ORBIT_SAMPLES)
            .into_iter()
            .map(|p| base + Vec3::new(p.x, 0.0, p.y));
        gizmos.linestrip(points, body.fallback_color.with_alpha(ORBIT_ALPHA));
    }
}
