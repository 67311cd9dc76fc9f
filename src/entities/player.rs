use crate::entities::inventory::Inventory;
use crate::world::game_data::PlayerDefaults;
use crate::world::position::Vec3;
use crate::world::time::Millis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// Weapon hand. A fresh player holds the configured default weapon without it
/// ever having been equipped from the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeaponHand {
    DefaultWeapon,
    Empty,
    Holding(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub position: Vec3,
    pub color: String,
    pub skin: Option<String>,
    pub hp: u32,
    pub max_hp: u32,
    pub right_hand: WeaponHand,
    pub left_hand: Option<String>,
    pub inventory: Inventory,
    pub last_attack: Option<Millis>,
}

impl Player {
    pub fn new(id: PlayerId, color: String, spawn: Vec3, defaults: &PlayerDefaults) -> Self {
        Self {
            id,
            position: spawn,
            color,
            skin: None,
            hp: defaults.max_hp,
            max_hp: defaults.max_hp,
            right_hand: WeaponHand::DefaultWeapon,
            left_hand: None,
            inventory: Inventory::from_stacks(&defaults.starting_inventory),
            last_attack: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Applies damage without going below zero. Returns true when this hit was lethal.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        if self.hp == 0 {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        self.hp == 0
    }

    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    pub fn weapon<'a>(&'a self, default_weapon: &'a str) -> Option<&'a str> {
        match &self.right_hand {
            WeaponHand::DefaultWeapon => Some(default_weapon),
            WeaponHand::Empty => None,
            WeaponHand::Holding(item) => Some(item.as_str()),
        }
    }

    pub fn attack_ready(&self, now: Millis, cooldown_ms: u64) -> bool {
        self.last_attack
            .map_or(true, |last| now.since(last) >= cooldown_ms)
    }

    pub fn view(&self, default_weapon: &str) -> PlayerView {
        PlayerView {
            id: self.id,
            position: self.position,
            color: self.color.clone(),
            skin: self.skin.clone(),
            hp: self.hp,
            max_hp: self.max_hp,
            right_hand: self.weapon(default_weapon).map(str::to_string),
            left_hand: self.left_hand.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub position: Vec3,
    pub color: String,
    pub skin: Option<String>,
    pub hp: u32,
    pub max_hp: u32,
    pub right_hand: Option<String>,
    pub left_hand: Option<String>,
    pub inventory: Inventory,
}
