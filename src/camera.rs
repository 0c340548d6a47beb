use bevy::prelude::*;

/// Polar angle limit so the eye never crosses the poles.
const MAX_PITCH: f32 = 1.5;

#[derive(Component)]
pub struct MainCamera;

/// Desired camera pose. The transform eases toward it every frame.
#[derive(Component, Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub position: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Smoothed look-at point actually used by the transform.
    look: Vec3,
}

impl OrbitCamera {
    pub fn new(target: Vec3, position: Vec3) -> Self {
        Self {
            target,
            position,
            min_distance: 1.0,
            max_distance: 800.0,
            look: target,
        }
    }

    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    fn offset(&self) -> Vec3 {
        let offset = self.position - self.target;
        if offset.length_squared() < 1e-8 {
            Vec3::Z * self.min_distance
        } else {
            offset
        }
    }

    /// Scales the eye-target distance by `factor`, clamped to the limits.
    pub fn zoom(&mut self, factor: f32) {
        let offset = self.offset();
        let distance = (offset.length() * factor).clamp(self.min_distance, self.max_distance);
        self.position = self.target + offset.normalize() * distance;
    }

    pub fn zoom_in(&mut self, step: f32) {
        self.zoom(1.0 - step);
    }

    pub fn zoom_out(&mut self, step: f32) {
        self.zoom(1.0 + step);
    }

    /// Rotates the eye around the target. Yaw turns about world Y.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.offset();
        let radius = offset.length();
        let current_pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        let current_yaw = offset.x.atan2(offset.z);

        let pitch = (current_pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        let yaw = current_yaw + yaw;
        let dir = Vec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        );
        self.position = self.target + dir * radius;
    }

    /// Slides both eye and target in the view plane.
    pub fn pan(&mut self, right: f32, up: f32) {
        let forward = -self.offset().normalize();
        let side = forward.cross(Vec3::Y).normalize_or_zero();
        let lift = side.cross(forward);
        let delta = side * right + lift * up;
        self.target += delta;
        self.position += delta;
    }

    /// Looks at `target` from `distance` units out along each axis.
    pub fn focus(&mut self, target: Vec3, distance: f32) {
        self.target = target;
        self.position = target + Vec3::splat(distance);
    }

    /// Moves `transform` a damped step toward the desired pose.
    pub fn ease(&mut self, transform: &mut Transform, rate: f32, dt: f32) {
        let lerp_factor = (1.0 - (-rate * dt).exp()).clamp(0.0, 1.0);
        transform.translation = transform.translation.lerp(self.position, lerp_factor);
        self.look = self.look.lerp(self.target, lerp_factor);
        if transform.translation.distance_squared(self.look) > 1e-8 {
            transform.look_at(self.look, Vec3::Y);
        }
    }
}
