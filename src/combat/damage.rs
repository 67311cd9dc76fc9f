use crate::combat::rejection::Rejection;
use crate::entities::player::Player;
use crate::world::game_data::{GameData, WorldRules};
use crate::world::position::Vec3;
use crate::world::time::Millis;
use rand::Rng;

const LOOT_SCATTER: f64 = 0.5;

/// Starts a swing: checks the attack cooldown, stamps it and returns the damage
/// the equipped weapon deals. Unarmed swings use the configured fallback.
pub fn begin_swing(player: &mut Player, data: &GameData, now: Millis) -> Result<u32, Rejection> {
    if !player.is_alive() {
        return Err(Rejection::Invalid);
    }
    if !player.attack_ready(now, data.player.attack_cooldown_ms) {
        return Err(Rejection::Cooldown);
    }
    player.last_attack = Some(now);
    Ok(data.weapon_damage(player.weapon(&data.player.default_weapon)))
}

pub fn respawn_delay<R: Rng>(rules: &WorldRules, rng: &mut R) -> u64 {
    if rules.respawn_max_ms <= rules.respawn_min_ms {
        return rules.respawn_min_ms;
    }
    rng.random_range(rules.respawn_min_ms..=rules.respawn_max_ms)
}

/// Ground position for one dropped unit near `origin`.
pub fn scatter<R: Rng>(origin: Vec3, rng: &mut R) -> Vec3 {
    Vec3::planar(
        origin.x + (rng.random::<f64>() * 2.0 - 1.0) * LOOT_SCATTER,
        origin.z + (rng.random::<f64>() * 2.0 - 1.0) * LOOT_SCATTER,
    )
}
