use crate::world::position::Vec3;
use crate::world::time::Millis;
use serde::Serialize;

/// The wandering merchant. Not attackable and has no health.
#[derive(Debug, Clone, PartialEq)]
pub struct Trader {
    pub position: Vec3,
    pub facing: f64,
    pub anchor: Vec3,
    pub wander_target: Option<Vec3>,
    pub next_wander_at: Millis,
    pub catalog: Vec<String>,
}

impl Trader {
    pub fn new(anchor: Vec3, catalog: Vec<String>) -> Self {
        Self {
            position: anchor,
            facing: 0.0,
            anchor,
            wander_target: None,
            next_wander_at: Millis(0),
            catalog,
        }
    }

    pub fn view(&self) -> TraderView {
        TraderView {
            position: self.position,
            rotation: self.facing,
            wander_target: self.wander_target,
            items: self.catalog.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderView {
    pub position: Vec3,
    pub rotation: f64,
    pub wander_target: Option<Vec3>,
    pub items: Vec<String>,
}
