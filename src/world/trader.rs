use crate::entities::trader::Trader;
use crate::world::game_data::{TraderProfile, WorldRules};
use crate::world::time::Millis;
use crate::world::wander::{self, WanderParams, Wanderer};
use rand::Rng;

/// Drives the merchant's wander-only routine.
#[derive(Debug)]
pub struct TraderController {
    trader: Trader,
    params: WanderParams,
}

impl TraderController {
    pub fn new(profile: &TraderProfile, rules: &WorldRules, catalog: Vec<String>) -> Self {
        Self {
            trader: Trader::new(profile.anchor.grounded(), catalog),
            params: WanderParams {
                radius: profile.wander_radius,
                speed: profile.speed,
                body_radius: profile.body_radius,
                arrival: rules.wander_arrival,
                pause_min_ms: rules.wander_pause_min_ms,
                pause_max_ms: rules.wander_pause_max_ms,
                blocked_retry_ms: rules.blocked_wander_retry_ms,
            },
        }
    }

    pub fn trader(&self) -> &Trader {
        &self.trader
    }

    /// Returns true when position, facing or destination changed this tick.
    pub fn update<R: Rng>(&mut self, now: Millis, rng: &mut R) -> bool {
        let trader = &mut self.trader;
        wander::advance(
            Wanderer {
                position: &mut trader.position,
                facing: &mut trader.facing,
                destination: &mut trader.wander_target,
                next_wander_at: &mut trader.next_wander_at,
                anchor: trader.anchor,
            },
            &self.params,
            now,
            rng,
        )
    }
}
