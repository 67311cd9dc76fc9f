use crate::world::position::Vec3;

/// Half width of the river band measured from its centre line.
pub const RIVER_HALF_WIDTH: f64 = 8.0;

/// Axis-aligned footprint of a static building on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub center_x: f64,
    pub center_z: f64,
    pub width: f64,
    pub depth: f64,
}

pub const HOUSE: Footprint = Footprint {
    center_x: -35.0,
    center_z: 25.0,
    width: 7.0,
    depth: 9.0,
};

impl Footprint {
    /// True when a body of `radius` centred at (`x`, `z`) overlaps the footprint.
    pub fn contains(&self, x: f64, z: f64, radius: f64) -> bool {
        let half_w = self.width / 2.0 + radius;
        let half_d = self.depth / 2.0 + radius;
        x > self.center_x - half_w
            && x < self.center_x + half_w
            && z > self.center_z - half_d
            && z < self.center_z + half_d
    }
}

pub fn river_center_x(z: f64) -> f64 {
    (z * 0.05).sin() * 20.0 + (z * 0.1).sin() * 10.0
}

pub fn in_river(position: Vec3) -> bool {
    (position.x - river_center_x(position.z)).abs() < RIVER_HALF_WIDTH
}

pub fn in_house(position: Vec3, radius: f64) -> bool {
    HOUSE.contains(position.x, position.z, radius)
}
