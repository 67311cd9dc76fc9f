use crate::world::game_data::LootEntry;
use rand::Rng;

/// One resolved drop: `count` units of `item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootDrop {
    pub item: String,
    pub count: u32,
}

/// Rolls every entry independently. Entries that hit with a count of zero produce nothing.
pub fn roll_loot<R: Rng>(entries: &[LootEntry], rng: &mut R) -> Vec<LootDrop> {
    let mut drops = Vec::new();
    for entry in entries {
        if rng.random::<f64>() >= entry.rate {
            continue;
        }
        let (min, max) = entry.count_bounds();
        let count = rng.random_range(min..=max);
        if count == 0 {
            continue;
        }
        drops.push(LootDrop {
            item: entry.item.clone(),
            count,
        });
    }
    drops
}
