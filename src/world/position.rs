use serde::{Deserialize, Serialize};

/// World-space position. `y` is height; all distance checks are planar (x/z).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ORIGIN: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn planar(x: f64, z: f64) -> Self {
        Self { x, y: 0.0, z }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn planar_distance(self, other: Vec3) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Yaw that faces `target`, matching the client's `atan2(dx, dz)` convention.
    pub fn heading_to(self, target: Vec3) -> f64 {
        (target.x - self.x).atan2(target.z - self.z)
    }

    /// Moves at most `speed` units toward `target` on the ground plane, never past it.
    pub fn step_toward(self, target: Vec3, speed: f64) -> Vec3 {
        let distance = self.planar_distance(target);
        if distance <= f64::EPSILON {
            return self;
        }
        let step = speed.min(distance);
        Vec3 {
            x: self.x + (target.x - self.x) / distance * step,
            y: self.y,
            z: self.z + (target.z - self.z) / distance * step,
        }
    }

    /// Point at `distance` along `angle` from this one (same axis convention as `heading_to`).
    pub fn offset_polar(self, angle: f64, distance: f64) -> Vec3 {
        Vec3 {
            x: self.x + angle.sin() * distance,
            y: self.y,
            z: self.z + angle.cos() * distance,
        }
    }

    pub fn grounded(self) -> Vec3 {
        Vec3 { y: 0.0, ..self }
    }
}
