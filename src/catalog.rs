use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;

const EMBEDDED: &str = include_str!("../assets/solar_system.toml");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse body catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Body '{name}' has eccentricity {value}, expected a value in [0, 1)")]
    Eccentricity { name: String, value: f32 },
    #[error("Body '{name}' has angular speed {value}, expected a finite value >= 0")]
    AngularSpeed { name: String, value: f32 },
    #[error("Body '{name}' references unknown parent '{parent}'")]
    UnknownParent { name: String, parent: String },
    #[error("Body '{name}' has a cyclic parent chain")]
    CyclicParent { name: String },
    #[error("Duplicate catalog entry for body '{name}'")]
    DuplicateName { name: String },
    #[error("Invalid range for '{field}'")]
    InvalidRange { field: String },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Star,
    Planet,
    DwarfPlanet,
    Moon,
    Asteroid,
    Comet,
    Spacecraft,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Star,
        Category::Planet,
        Category::DwarfPlanet,
        Category::Moon,
        Category::Asteroid,
        Category::Comet,
        Category::Spacecraft,
    ];

    /// Plural label, used as the default visibility group and menu heading.
    pub fn label(&self) -> &'static str {
        match *self {
            Category::Star => "Stars",
            Category::Planet => "Planets",
            Category::DwarfPlanet => "Dwarf Planets",
            Category::Moon => "Moons",
            Category::Asteroid => "Asteroids",
            Category::Comet => "Comets",
            Category::Spacecraft => "Spacecraft",
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BodyEntry {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    pub radius: f32,
    /// Semi-major axis. Zero means the body does not orbit.
    #[serde(default)]
    pub distance: f32,
    #[serde(default)]
    pub eccentricity: f32,
    #[serde(default)]
    pub angular_speed: f32,
    #[serde(default)]
    pub initial_angle: f32,
    #[serde(default)]
    pub elevation: f32,
    #[serde(default)]
    pub spin: f32,
    #[serde(default)]
    pub emissive: bool,
    #[serde(default)]
    pub texture: Option<String>,
    pub fallback_color: [f32; 3],
    #[serde(default)]
    pub description: String,
}

impl BodyEntry {
    pub fn group(&self) -> &str {
        self.group
            .as_deref()
            .unwrap_or_else(|| self.category.label())
    }
}

/// Recipe for a batch of generated bodies sharing one category.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProceduralEntry {
    pub category: Category,
    pub name_prefix: String,
    #[serde(default)]
    pub group: Option<String>,
    pub count: usize,
    pub distance: [f32; 2],
    pub eccentricity: [f32; 2],
    pub angular_speed: [f32; 2],
    pub radius: [f32; 2],
    #[serde(default)]
    pub elevation: [f32; 2],
    #[serde(default)]
    pub spin: f32,
    #[serde(default)]
    pub texture: Option<String>,
    pub fallback_color: [f32; 3],
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FallbackEntry {
    pub category: Category,
    #[serde(default)]
    pub texture: Option<String>,
    pub color: [f32; 3],
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Catalog {
    #[serde(rename = "body")]
    pub bodies: Vec<BodyEntry>,
    pub procedural: Vec<ProceduralEntry>,
    #[serde(rename = "fallback")]
    pub fallbacks: Vec<FallbackEntry>,
}

impl Catalog {
    /// The catalog shipped in `assets/solar_system.toml`.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_toml(EMBEDDED)
    }

    pub fn from_toml(s: &str) -> Result<Self, CatalogError> {
        let cfg: Catalog = toml::from_str(s)?;

        for p in cfg.procedural.iter() {
            let field = |f: &str| CatalogError::InvalidRange {
                field: format!("{}.{f}", p.name_prefix),
            };
            for (name, [lo, hi]) in [
                ("distance", p.distance),
                ("eccentricity", p.eccentricity),
                ("angular-speed", p.angular_speed),
                ("radius", p.radius),
                ("elevation", p.elevation),
            ] {
                if lo.is_nan() || hi.is_nan() || lo > hi {
                    return Err(field(name));
                }
            }
            let [e_lo, e_hi] = p.eccentricity;
            if e_lo < 0.0 || e_hi >= 1.0 {
                return Err(field("eccentricity"));
            }
            if p.angular_speed[0] < 0.0 || !p.angular_speed[1].is_finite() {
                return Err(field("angular-speed"));
            }
        }

        let mut names = HashSet::new();
        for b in cfg.bodies.iter() {
            if !names.insert(b.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: b.name.clone(),
                });
            }
        }

        Ok(cfg)
    }

    /// Static bodies followed by every procedural batch, drawn from `rng`.
    pub fn expand<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<BodyEntry> {
        let generated: usize = self.procedural.iter().map(|p| p.count).sum();
        let mut out = Vec::with_capacity(self.bodies.len() + generated);
        out.extend(self.bodies.iter().cloned());

        for p in self.procedural.iter() {
            for i in 0..p.count {
                out.push(BodyEntry {
                    name: format!("{} {}", p.name_prefix, i + 1),
                    category: p.category,
                    group: p.group.clone(),
                    parent: None,
                    radius: sample(rng, p.radius),
                    distance: sample(rng, p.distance),
                    eccentricity: sample(rng, p.eccentricity),
                    angular_speed: sample(rng, p.angular_speed),
                    initial_angle: rng.gen::<f32>() * std::f32::consts::TAU,
                    elevation: sample(rng, p.elevation),
                    spin: p.spin,
                    emissive: false,
                    texture: p.texture.clone(),
                    fallback_color: p.fallback_color,
                    description: p.description.clone(),
                });
            }
        }
        out
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, [lo, hi]: [f32; 2]) -> f32 {
    if lo == hi {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use rand::SeedableRng;

    const TOML: &str = indoc! {r#"
        [[body]]
        name = "Sun"
        category = "star"
        radius = 5.0
        fallback-color = [1.0, 0.8, 0.3]

        [[body]]
        name = "Moon"
        category = "moon"
        group = "Moon"
        parent = "Sun"
        radius = 0.3
        distance = 2.0
        eccentricity = 0.05
        angular-speed = 0.05
        fallback-color = [0.7, 0.7, 0.7]

        [[procedural]]
        category = "comet"
        name-prefix = "Comet"
        count = 4
        distance = [70.0, 190.0]
        eccentricity = [0.5, 0.9]
        angular-speed = [0.001, 0.002]
        radius = [0.1, 0.3]
        fallback-color = [0.7, 0.85, 1.0]

        [[fallback]]
        category = "comet"
        texture = "textures/moon.jpg"
        color = [0.7, 0.85, 1.0]
    "#};

    #[test]
    fn parses_bodies_and_defaults() {
        let cat = Catalog::from_toml(TOML).unwrap();
        assert_eq!(cat.bodies.len(), 2);
        let sun = &cat.bodies[0];
        assert_eq!(sun.category, Category::Star);
        assert_eq!(sun.distance, 0.0);
        assert_eq!(sun.group(), "Stars");
        assert_eq!(cat.bodies[1].group(), "Moon");
        assert_eq!(cat.bodies[1].parent.as_deref(), Some("Sun"));
    }

    #[test]
    fn per_category_fallback() {
        let cat = Catalog::from_toml(TOML).unwrap();
        assert_eq!(cat.fallbacks.len(), 1);
        let fb = &cat.fallbacks[0];
        assert_eq!(fb.category, Category::Comet);
        assert_eq!(fb.texture.as_deref(), Some("textures/moon.jpg"));
    }

    #[test]
    fn expand_is_deterministic_for_a_seed() {
        let cat = Catalog::from_toml(TOML).unwrap();
        let a = cat.expand(&mut rand::rngs::StdRng::seed_from_u64(7));
        let b = cat.expand(&mut rand::rngs::StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
        assert_eq!(a[2].name, "Comet 1");
        assert_eq!(a[5].name, "Comet 4");
        for comet in &a[2..] {
            assert_eq!(comet.category, Category::Comet);
            assert!((0.5..0.9).contains(&comet.eccentricity));
            assert!((70.0..190.0).contains(&comet.distance));
        }
    }

    #[test]
    fn duplicate_names_rejected() {
        const DUP: &str = indoc! {r#"
            [[body]]
            name = "Earth"
            category = "planet"
            radius = 1.0
            fallback-color = [0.0, 0.0, 1.0]

            [[body]]
            name = "Earth"
            category = "planet"
            radius = 1.0
            fallback-color = [0.0, 0.0, 1.0]
        "#};
        assert!(matches!(
            Catalog::from_toml(DUP),
            Err(CatalogError::DuplicateName { name }) if name == "Earth"
        ));
    }

    #[test]
    fn procedural_eccentricity_must_stay_elliptic() {
        const BAD: &str = indoc! {r#"
            [[procedural]]
            category = "comet"
            name-prefix = "Comet"
            count = 1
            distance = [70.0, 190.0]
            eccentricity = [0.5, 1.0]
            angular-speed = [0.001, 0.002]
            radius = [0.1, 0.3]
            fallback-color = [0.7, 0.85, 1.0]
        "#};
        assert!(matches!(
            Catalog::from_toml(BAD),
            Err(CatalogError::InvalidRange { .. })
        ));
    }

    #[test]
    fn procedural_angular_speed_must_not_run_backwards() {
        const BAD: &str = indoc! {r#"
            [[procedural]]
            category = "asteroid"
            name-prefix = "Asteroid"
            count = 1
            distance = [38.0, 50.0]
            eccentricity = [0.0, 0.1]
            angular-speed = [-0.002, 0.004]
            radius = [0.1, 0.2]
            fallback-color = [0.5, 0.45, 0.4]
        "#};
        assert!(matches!(
            Catalog::from_toml(BAD),
            Err(CatalogError::InvalidRange { field }) if field == "Asteroid.angular-speed"
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Catalog::from_toml("[[body]]\nname = 3"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn embedded_catalog_loads() {
        let cat = Catalog::embedded().unwrap();
        assert!(cat.bodies.iter().any(|b| b.name == "Pluto"));
        assert!(cat
            .fallbacks
            .iter()
            .any(|f| f.category == Category::Asteroid));
    }

    #[test]
    fn embedded_catalog_only_names_shipped_textures() {
        let cat = Catalog::embedded().unwrap();
        let assets = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let paths = cat
            .bodies
            .iter()
            .filter_map(|b| b.texture.as_deref())
            .chain(cat.procedural.iter().filter_map(|p| p.texture.as_deref()))
            .chain(cat.fallbacks.iter().filter_map(|f| f.texture.as_deref()));
        for path in paths {
            assert!(assets.join(path).is_file(), "missing asset {path}");
        }
    }
}
