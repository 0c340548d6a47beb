/// Elliptical orbit geometry — pure math, no engine state.
///
/// Angles are measured from periapsis in the orbital plane. The central body
/// sits at the ellipse focus, so every radius here is focus-relative.
use bevy::math::Vec2;
use std::f32::consts::TAU;

/// Focus-relative radius of an ellipse with semi-major axis `a` and
/// eccentricity `e` at angle `theta`.
///
/// `e` must be in `[0, 1)`; the denominator is then bounded below by `1 - e`.
pub fn focal_radius(a: f32, e: f32, theta: f32) -> f32 {
    a * (1.0 - e * e) / (1.0 + e * theta.cos())
}

/// Position on the orbital plane as `(x, z)`.
pub fn planar_position(a: f32, e: f32, theta: f32) -> Vec2 {
    let r = focal_radius(a, e, theta);
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Closed polyline through `samples` evenly spaced angles, first point repeated.
pub fn orbit_path(a: f32, e: f32, samples: usize) -> Vec<Vec2> {
    let samples = samples.max(3);
    (0..=samples)
        .map(|i| planar_position(a, e, i as f32 / samples as f32 * TAU))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn circular_orbit_keeps_radius() {
        for i in 0..64 {
            let theta = i as f32 * 0.37;
            assert_relative_eq!(focal_radius(25.0, 0.0, theta), 25.0);
        }
    }

    #[test]
    fn radius_positive_and_finite_across_eccentricities() {
        for ei in 0..100 {
            let e = ei as f32 * 0.0099;
            for ti in 0..72 {
                let theta = ti as f32 * TAU / 72.0;
                let r = focal_radius(10.0, e, theta);
                assert!(r.is_finite(), "r not finite at e={e} theta={theta}");
                assert!(r > 0.0, "r={r} at e={e} theta={theta}");
            }
        }
    }

    #[test]
    fn periapsis_and_apoapsis() {
        let (a, e) = (40.0, 0.25);
        assert_relative_eq!(focal_radius(a, e, 0.0), a * (1.0 - e), epsilon = 1e-4);
        assert_relative_eq!(
            focal_radius(a, e, std::f32::consts::PI),
            a * (1.0 + e),
            epsilon = 1e-4
        );
    }

    #[test]
    fn planar_position_matches_radius() {
        let p = planar_position(25.0, 0.0167, 0.01);
        let r = focal_radius(25.0, 0.0167, 0.01);
        assert_relative_eq!(p.length(), r, epsilon = 1e-4);
        assert_relative_eq!(p.x, r * 0.01f32.cos());
        assert_relative_eq!(p.y, r * 0.01f32.sin());
    }

    #[test]
    fn orbit_path_is_closed() {
        let path = orbit_path(30.0, 0.2, 48);
        assert_eq!(path.len(), 49);
        let first = path[0];
        let last = path[path.len() - 1];
        assert_abs_diff_eq!(first.x, last.x, epsilon = 1e-3);
        assert_abs_diff_eq!(first.y, last.y, epsilon = 1e-3);
    }
}
