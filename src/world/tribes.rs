//! Tribe-wide aggro. A tribe is only the `TribeId` shared by creatures that
//! spawned together, so every operation here filters the live set by that key.

use crate::entities::creature::{Creature, CreatureId, TribeId};
use crate::entities::player::PlayerId;
use std::collections::BTreeMap;

/// Sets every live member of `tribe` angry at `target`, regardless of distance.
/// Members already angry at `target` are left untouched; a different target is
/// overwritten. Returns the members whose state changed.
pub fn provoke_tribe(
    creatures: &mut BTreeMap<CreatureId, Creature>,
    tribe: TribeId,
    target: PlayerId,
) -> Vec<CreatureId> {
    let mut changed = Vec::new();
    for creature in creatures.values_mut().filter(|creature| creature.tribe == tribe) {
        if creature.provoke(target) {
            changed.push(creature.id);
        }
    }
    changed
}

/// Clears `target` from every creature hunting it. Returns the creatures released.
pub fn release_target(
    creatures: &mut BTreeMap<CreatureId, Creature>,
    target: PlayerId,
) -> Vec<CreatureId> {
    let mut released = Vec::new();
    for creature in creatures.values_mut() {
        if creature.target() == Some(target) {
            creature.calm();
            released.push(creature.id);
        }
    }
    released
}

pub fn tribe_population(creatures: &BTreeMap<CreatureId, Creature>, tribe: TribeId) -> usize {
    creatures
        .values()
        .filter(|creature| creature.tribe == tribe)
        .count()
}
