use bevy::color::Color;
use bevy::math::{Vec2, Vec3};
use std::collections::HashMap;

use crate::catalog::{BodyEntry, Category, CatalogError};
use crate::orbit;

/// Index of a body in the registry. Stable for the whole session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct BodyId(pub usize);

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Orbit {
    pub radius: f32,
    pub eccentricity: f32,
    pub angular_speed: f32,
    /// Radians from periapsis. Never wrapped.
    pub angle: f32,
}

impl Orbit {
    /// Offset from the parent on the orbital plane, as `(x, z)`.
    pub fn offset(&self) -> Vec2 {
        orbit::planar_position(self.radius, self.eccentricity, self.angle)
    }
}

#[derive(Clone, Debug)]
pub struct OrbitalBody {
    pub name: String,
    pub category: Category,
    pub group: String,
    pub orbit: Option<Orbit>,
    pub parent: Option<BodyId>,
    pub elevation: f32,
    pub position: Vec3,
    pub size: f32,
    pub spin: f32,
    pub rotation: f32,
    pub visible: bool,
    pub emissive: bool,
    pub description: String,
    pub texture: Option<String>,
    pub fallback_color: Color,
}

impl OrbitalBody {
    fn from_entry(entry: BodyEntry, parent: Option<BodyId>) -> Self {
        let orbit = (entry.distance > 0.0).then_some(Orbit {
            radius: entry.distance,
            eccentricity: entry.eccentricity,
            angular_speed: entry.angular_speed,
            angle: entry.initial_angle,
        });
        let [r, g, b] = entry.fallback_color;
        Self {
            group: entry.group().to_owned(),
            name: entry.name,
            category: entry.category,
            orbit,
            parent,
            elevation: entry.elevation,
            position: Vec3::ZERO,
            size: entry.radius,
            spin: entry.spin,
            rotation: 0.0,
            visible: true,
            emissive: entry.emissive,
            description: entry.description,
            texture: entry.texture,
            fallback_color: Color::srgb(r, g, b),
        }
    }
}

/// Every body in the scene plus a parent-before-child update order.
#[derive(Clone, Debug, Default)]
pub struct BodyRegistry {
    bodies: Vec<OrbitalBody>,
    update_order: Vec<BodyId>,
}

impl BodyRegistry {
    /// Validates orbital parameters and parent links, then places every body
    /// at its initial angle.
    pub fn from_entries(entries: Vec<BodyEntry>) -> Result<Self, CatalogError> {
        let mut index: HashMap<&str, BodyId> = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            if index.insert(e.name.as_str(), BodyId(i)).is_some() {
                return Err(CatalogError::DuplicateName {
                    name: e.name.clone(),
                });
            }
            if !(0.0..1.0).contains(&e.eccentricity) {
                return Err(CatalogError::Eccentricity {
                    name: e.name.clone(),
                    value: e.eccentricity,
                });
            }
            if e.angular_speed < 0.0 || !e.angular_speed.is_finite() {
                return Err(CatalogError::AngularSpeed {
                    name: e.name.clone(),
                    value: e.angular_speed,
                });
            }
        }

        let mut parents = Vec::with_capacity(entries.len());
        for e in entries.iter() {
            let parent = match e.parent.as_deref() {
                Some(p) => Some(*index.get(p).ok_or_else(|| CatalogError::UnknownParent {
                    name: e.name.clone(),
                    parent: p.to_owned(),
                })?),
                None => None,
            };
            parents.push(parent);
        }

        let mut depths = Vec::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            let mut depth = 0;
            let mut cursor = parents[i];
            while let Some(BodyId(p)) = cursor {
                depth += 1;
                if depth > entries.len() {
                    return Err(CatalogError::CyclicParent {
                        name: e.name.clone(),
                    });
                }
                cursor = parents[p];
            }
            depths.push(depth);
        }

        let mut update_order: Vec<BodyId> = (0..entries.len()).map(BodyId).collect();
        update_order.sort_by_key(|id| depths[id.0]);

        let bodies = entries
            .into_iter()
            .zip(parents)
            .map(|(e, p)| OrbitalBody::from_entry(e, p))
            .collect();

        let mut registry = Self {
            bodies,
            update_order,
        };
        registry.refresh_positions();
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn get(&self, id: BodyId) -> Option<&OrbitalBody> {
        self.bodies.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &OrbitalBody)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    pub fn set_visible(&mut self, id: BodyId, visible: bool) {
        if let Some(b) = self.bodies.get_mut(id.0) {
            b.visible = visible;
        }
    }

    /// One simulation tick: advance each orbit and re-derive world positions.
    pub fn advance(&mut self, time_scale: f32) {
        for body in self.bodies.iter_mut() {
            if let Some(orbit) = body.orbit.as_mut() {
                orbit.angle += orbit.angular_speed * time_scale;
            }
            body.rotation += body.spin * time_scale;
        }
        self.refresh_positions();
    }

    /// Recomputes positions from current angles. Parents are always placed
    /// before their children, so a moon sees its parent's position from this tick.
    pub fn refresh_positions(&mut self) {
        for &id in self.update_order.iter() {
            let base = self.bodies[id.0]
                .parent
                .map_or(Vec3::ZERO, |p| self.bodies[p.0].position);
            let body = &mut self.bodies[id.0];
            let offset = body.orbit.map_or(Vec2::ZERO, |o| o.offset());
            body.position = base + Vec3::new(offset.x, body.elevation, offset.y);
        }
    }

    /// First body with this exact name.
    pub fn resolve_name(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|b| b.name == name).map(BodyId)
    }

    /// Nearest visible body whose bounding sphere the ray hits.
    pub fn pick(&self, origin: Vec3, direction: Vec3) -> Option<BodyId> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        self.iter()
            .filter(|(_, b)| b.visible)
            .filter_map(|(id, b)| ray_sphere(origin, direction, b.position, b.size).map(|t| (id, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Members of each category in catalog order, empty categories skipped.
    pub fn by_category(&self) -> Vec<(Category, Vec<BodyId>)> {
        Category::ALL
            .iter()
            .map(|&c| {
                let ids = self
                    .iter()
                    .filter(|(_, b)| b.category == c)
                    .map(|(id, _)| id)
                    .collect::<Vec<_>>();
                (c, ids)
            })
            .filter(|(_, ids)| !ids.is_empty())
            .collect()
    }
}

/// Distance along a normalized ray to the first intersection with a sphere.
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let near = -b - sq;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + sq;
    (far >= 0.0).then_some(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use approx::assert_relative_eq;
    use indoc::indoc;

    const TOML: &str = indoc! {r#"
        [[body]]
        name = "Sun"
        category = "star"
        radius = 5.0
        fallback-color = [1.0, 0.8, 0.3]

        [[body]]
        name = "Moon"
        category = "moon"
        parent = "Earth"
        radius = 0.27
        distance = 2.0
        eccentricity = 0.0549
        angular-speed = 0.05
        fallback-color = [0.7, 0.7, 0.7]

        [[body]]
        name = "Earth"
        category = "planet"
        radius = 1.0
        distance = 25.0
        eccentricity = 0.0167
        angular-speed = 0.01
        fallback-color = [0.2, 0.4, 0.9]

        [[body]]
        name = "Pluto"
        category = "dwarf-planet"
        radius = 0.3
        distance = 160.0
        eccentricity = 0.2488
        angular-speed = 0.001
        fallback-color = [0.8, 0.7, 0.6]
    "#};

    fn registry() -> BodyRegistry {
        BodyRegistry::from_entries(Catalog::from_toml(TOML).unwrap().bodies).unwrap()
    }

    fn entries(toml: &str) -> Vec<BodyEntry> {
        Catalog::from_toml(toml).unwrap().bodies
    }

    #[test]
    fn one_tick_advances_angle_and_position() {
        let mut reg = registry();
        let earth = reg.resolve_name("Earth").unwrap();
        reg.advance(1.0);

        let body = reg.get(earth).unwrap();
        let orbit = body.orbit.unwrap();
        assert_relative_eq!(orbit.angle, 0.01);
        let r = 25.0 * (1.0 - 0.0167f32.powi(2)) / (1.0 + 0.0167 * 0.01f32.cos());
        assert_relative_eq!(body.position.x, r * 0.01f32.cos(), epsilon = 1e-4);
        assert_relative_eq!(body.position.z, r * 0.01f32.sin(), epsilon = 1e-4);
        assert_eq!(body.position.y, 0.0);
    }

    #[test]
    fn moon_tracks_parent_same_tick() {
        let mut reg = registry();
        let earth = reg.resolve_name("Earth").unwrap();
        let moon = reg.resolve_name("Moon").unwrap();

        for _ in 0..50 {
            reg.advance(1.0);
            let e = reg.get(earth).unwrap().position;
            let m = reg.get(moon).unwrap();
            let off = m.orbit.unwrap().offset();
            assert_relative_eq!(m.position.x, e.x + off.x, epsilon = 1e-4);
            assert_relative_eq!(m.position.z, e.z + off.y, epsilon = 1e-4);
        }
    }

    #[test]
    fn moon_with_frozen_angle_moves_by_parent_delta() {
        let mut es = entries(TOML);
        es.iter_mut()
            .find(|e| e.name == "Moon")
            .unwrap()
            .angular_speed = 0.0;
        let mut reg = BodyRegistry::from_entries(es).unwrap();
        let earth = reg.resolve_name("Earth").unwrap();
        let moon = reg.resolve_name("Moon").unwrap();

        let e0 = reg.get(earth).unwrap().position;
        let m0 = reg.get(moon).unwrap().position;
        reg.advance(1.0);
        let e1 = reg.get(earth).unwrap().position;
        let m1 = reg.get(moon).unwrap().position;

        let parent_delta = e1 - e0;
        let moon_delta = m1 - m0;
        assert_relative_eq!(moon_delta.x, parent_delta.x, epsilon = 1e-4);
        assert_relative_eq!(moon_delta.z, parent_delta.z, epsilon = 1e-4);
    }

    #[test]
    fn star_without_orbit_stays_put() {
        let mut reg = registry();
        let sun = reg.resolve_name("Sun").unwrap();
        reg.advance(1.0);
        let body = reg.get(sun).unwrap();
        assert!(body.orbit.is_none());
        assert_eq!(body.position, Vec3::ZERO);
    }

    #[test]
    fn time_scale_multiplies_advance() {
        let mut reg = registry();
        let earth = reg.resolve_name("Earth").unwrap();
        reg.advance(2.0);
        assert_relative_eq!(reg.get(earth).unwrap().orbit.unwrap().angle, 0.02);
    }

    #[test]
    fn resolve_by_name() {
        let reg = registry();
        let pluto = reg.resolve_name("Pluto").unwrap();
        assert_eq!(reg.get(pluto).unwrap().category, Category::DwarfPlanet);
        assert!(reg.resolve_name("Nonexistent").is_none());
    }

    #[test]
    fn pick_prefers_nearest_visible_hit() {
        let mut reg = registry();
        let sun = reg.resolve_name("Sun").unwrap();
        let earth = reg.resolve_name("Earth").unwrap();
        let earth_pos = reg.get(earth).unwrap().position;

        // Looking down from above Earth hits Earth only.
        let hit = reg.pick(earth_pos + Vec3::Y * 50.0, Vec3::NEG_Y);
        assert_eq!(hit, Some(earth));

        // Along +X from far away, Sun's sphere is crossed first.
        let hit = reg.pick(Vec3::new(-100.0, 0.0, 0.0), Vec3::X);
        assert_eq!(hit, Some(sun));

        reg.set_visible(sun, false);
        let hit = reg.pick(Vec3::new(-100.0, 0.0, 0.0), Vec3::X);
        assert_eq!(hit, Some(earth));

        assert_eq!(reg.pick(Vec3::new(0.0, 500.0, 0.0), Vec3::Y), None);
    }

    #[test]
    fn rejects_open_orbits() {
        let mut es = entries(TOML);
        es[2].eccentricity = 1.0;
        assert!(matches!(
            BodyRegistry::from_entries(es),
            Err(CatalogError::Eccentricity { .. })
        ));
    }

    #[test]
    fn rejects_backwards_or_non_finite_speed() {
        for speed in [-0.01, f32::NAN, f32::INFINITY] {
            let mut es = entries(TOML);
            es[2].angular_speed = speed;
            assert!(matches!(
                BodyRegistry::from_entries(es),
                Err(CatalogError::AngularSpeed { name, .. }) if name == "Earth"
            ));
        }
    }

    #[test]
    fn angle_never_decreases_while_advancing() {
        let mut reg = registry();
        let before: Vec<f32> = reg.iter().filter_map(|(_, b)| b.orbit).map(|o| o.angle).collect();
        reg.advance(1.0);
        let after: Vec<f32> = reg.iter().filter_map(|(_, b)| b.orbit).map(|o| o.angle).collect();
        for (a0, a1) in before.iter().zip(after.iter()) {
            assert!(a1 >= a0);
        }
    }

    #[test]
    fn rejects_unknown_parent() {
        let mut es = entries(TOML);
        es[1].parent = Some("Theia".into());
        assert!(matches!(
            BodyRegistry::from_entries(es),
            Err(CatalogError::UnknownParent { parent, .. }) if parent == "Theia"
        ));
    }

    #[test]
    fn rejects_cyclic_parents() {
        let mut es = entries(TOML);
        es[2].parent = Some("Moon".into());
        assert!(matches!(
            BodyRegistry::from_entries(es),
            Err(CatalogError::CyclicParent { .. })
        ));

        let mut es = entries(TOML);
        es[0].parent = Some("Sun".into());
        assert!(matches!(
            BodyRegistry::from_entries(es),
            Err(CatalogError::CyclicParent { .. })
        ));
    }

    #[test]
    fn categories_listed_in_order() {
        let reg = registry();
        let cats: Vec<Category> = reg.by_category().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            cats,
            vec![
                Category::Star,
                Category::Planet,
                Category::DwarfPlanet,
                Category::Moon
            ]
        );
    }
}
