//! Inventory-side resolution of trade, use, equip and drop requests. Each
//! function either fully applies its change to the player or leaves the player
//! untouched and reports why.

use crate::combat::rejection::Rejection;
use crate::entities::player::{Player, WeaponHand};
use crate::world::game_data::{GameData, ItemCategory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseEffect {
    Healed { restored: u32 },
    PlaceCampfire,
    Cooked { into: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    RightHand,
    LeftHand,
}

/// Buys one unit of `item` from the shop catalog.
pub fn buy(player: &mut Player, data: &GameData, item: &str) -> Result<u32, Rejection> {
    let price = data.price(item).ok_or(Rejection::UnknownItem)?;
    if player.inventory.count(&data.currency) < price {
        return Err(Rejection::InsufficientFunds);
    }
    if price > 0 && !player.inventory.take(&data.currency, price) {
        return Err(Rejection::InsufficientFunds);
    }
    player.inventory.add(item, 1);
    Ok(price)
}

/// Uses one unit of a held item. `near_campfire` is only consulted for raw food.
pub fn use_item(
    player: &mut Player,
    data: &GameData,
    item: &str,
    near_campfire: bool,
) -> Result<UseEffect, Rejection> {
    let definition = data.item(item).ok_or(Rejection::UnknownItem)?;
    if !player.inventory.holds(item) {
        return Err(Rejection::NotHeld);
    }
    let effect = match &definition.kind {
        ItemCategory::Healing => UseEffect::Healed {
            restored: player.heal(player.max_hp),
        },
        ItemCategory::Food { heal } => UseEffect::Healed {
            restored: player.heal(*heal),
        },
        ItemCategory::Placeable => UseEffect::PlaceCampfire,
        ItemCategory::RawFood { cooks_into } => {
            if !near_campfire {
                return Err(Rejection::NoCampfire);
            }
            UseEffect::Cooked {
                into: cooks_into.clone(),
            }
        }
        _ => return Err(Rejection::NotUsable),
    };
    player.inventory.take_one(item);
    if let UseEffect::Cooked { into } = &effect {
        player.inventory.add(into, 1);
    }
    Ok(effect)
}

/// Equips a held item into its slot, returning the previous occupant to the
/// inventory. Naming an item that is not held but currently equipped unequips it.
pub fn equip(player: &mut Player, data: &GameData, item: &str) -> Result<(), Rejection> {
    let definition = data.item(item).ok_or(Rejection::UnknownItem)?;
    let slot = match definition.kind {
        ItemCategory::Weapon { .. } => Slot::RightHand,
        ItemCategory::OffHand => Slot::LeftHand,
        _ => return Err(Rejection::NotUsable),
    };
    let default_weapon = data.player.default_weapon.as_str();

    if player.inventory.take_one(item) {
        let previous = match slot {
            Slot::RightHand => {
                let previous = std::mem::replace(
                    &mut player.right_hand,
                    WeaponHand::Holding(item.to_string()),
                );
                match previous {
                    WeaponHand::DefaultWeapon => Some(default_weapon.to_string()),
                    WeaponHand::Holding(previous) => Some(previous),
                    WeaponHand::Empty => None,
                }
            }
            Slot::LeftHand => player.left_hand.replace(item.to_string()),
        };
        if let Some(previous) = previous {
            player.inventory.add(&previous, 1);
        }
        return Ok(());
    }

    match slot {
        Slot::RightHand if player.weapon(default_weapon) == Some(item) => {
            player.right_hand = WeaponHand::Empty;
        }
        Slot::LeftHand if player.left_hand.as_deref() == Some(item) => {
            player.left_hand = None;
        }
        _ => return Err(Rejection::NotHeld),
    }
    player.inventory.add(item, 1);
    Ok(())
}

/// Removes one unit for dropping on the ground.
pub fn discard(player: &mut Player, item: &str) -> Result<(), Rejection> {
    if player.inventory.take_one(item) {
        Ok(())
    } else {
        Err(Rejection::NotHeld)
    }
}
