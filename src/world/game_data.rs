use crate::entities::creature::CreatureKind;
use crate::world::position::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

const BUILTIN_DATA: &str = include_str!("../../data/world.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemCategory {
    Currency,
    Material,
    Weapon { damage: u32 },
    OffHand,
    /// Restores hit points to maximum.
    Healing,
    Food { heal: u32 },
    Placeable,
    RawFood { cooks_into: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub kind: ItemCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopEntry {
    pub item: String,
    pub price: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LootEntry {
    pub item: String,
    /// Probability in [0, 1] that this entry drops at all.
    pub rate: f64,
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
}

impl LootEntry {
    pub fn count_bounds(&self) -> (u32, u32) {
        let min = self.min.unwrap_or(1);
        let max = self.max.unwrap_or(1).max(min);
        (min, max)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeapProfile {
    pub trigger_radius: f64,
    pub ready_ms: u64,
    pub leap_ms: u64,
    pub recovery_ms: u64,
    pub speed: f64,
    pub peak_height: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatureProfile {
    pub max_hp: u32,
    pub damage: u32,
    pub attack_cooldown_ms: u64,
    pub melee_range: f64,
    pub chase_speed: f64,
    pub wander_speed: f64,
    pub body_radius: f64,
    pub tribe_size: u32,
    pub tribes: u32,
    #[serde(default)]
    pub leap: Option<LeapProfile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerDefaults {
    pub max_hp: u32,
    pub default_weapon: String,
    pub unarmed_damage: u32,
    pub attack_cooldown_ms: u64,
    pub attack_radius: f64,
    pub pickup_radius: f64,
    pub cook_radius: f64,
    #[serde(default)]
    pub starting_inventory: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraderProfile {
    pub anchor: Vec3,
    pub speed: f64,
    pub wander_radius: f64,
    pub body_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldRules {
    pub leash_radius: f64,
    pub wander_radius: f64,
    pub wander_arrival: f64,
    pub wander_pause_min_ms: u64,
    pub wander_pause_max_ms: u64,
    pub blocked_wander_retry_ms: u64,
    pub respawn_min_ms: u64,
    pub respawn_max_ms: u64,
    pub tribe_min_distance: f64,
    pub tribe_max_distance: f64,
    pub tribe_spread: f64,
    pub spawn_attempts: u32,
    pub origin: Vec3,
}

/// Immutable game tables, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct GameData {
    pub currency: String,
    pub rules: WorldRules,
    pub player: PlayerDefaults,
    pub trader: TraderProfile,
    pub creatures: BTreeMap<CreatureKind, CreatureProfile>,
    pub items: Vec<ItemDefinition>,
    pub shop: Vec<ShopEntry>,
    #[serde(default)]
    pub loot: BTreeMap<CreatureKind, Vec<LootEntry>>,
    #[serde(skip)]
    item_index: HashMap<String, usize>,
}

impl GameData {
    pub fn builtin() -> Result<Self, String> {
        Self::from_yaml(BUILTIN_DATA).map_err(|err| format!("built-in data: {}", err))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("failed to read game data {}: {}", path.display(), err))?;
        Self::from_yaml(&contents).map_err(|err| format!("{}: {}", path.display(), err))
    }

    pub fn from_yaml(contents: &str) -> Result<Self, String> {
        let mut data: GameData =
            serde_yaml::from_str(contents).map_err(|err| format!("parse failed: {}", err))?;
        data.index_items()?;
        data.validate()?;
        Ok(data)
    }

    fn index_items(&mut self) -> Result<(), String> {
        self.item_index.clear();
        for (index, item) in self.items.iter().enumerate() {
            if self.item_index.insert(item.id.clone(), index).is_some() {
                return Err(format!("duplicate item id {}", item.id));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), String> {
        self.require_item(&self.currency, "currency")?;
        match self.item(&self.player.default_weapon).map(|item| &item.kind) {
            Some(ItemCategory::Weapon { .. }) => {}
            Some(_) => {
                return Err(format!(
                    "default weapon {} is not a weapon",
                    self.player.default_weapon
                ))
            }
            None => return Err(format!("unknown default weapon {}", self.player.default_weapon)),
        }
        for item in self.player.starting_inventory.keys() {
            self.require_item(item, "starting inventory")?;
        }
        for entry in &self.shop {
            self.require_item(&entry.item, "shop")?;
        }
        for (kind, entries) in &self.loot {
            for entry in entries {
                self.require_item(&entry.item, &format!("{} loot", kind.name()))?;
                if !(0.0..=1.0).contains(&entry.rate) {
                    return Err(format!(
                        "{} loot rate for {} outside [0, 1]",
                        kind.name(),
                        entry.item
                    ));
                }
            }
        }
        for item in &self.items {
            if let ItemCategory::RawFood { cooks_into } = &item.kind {
                self.require_item(cooks_into, &format!("{} cooked variant", item.id))?;
            }
        }
        for kind in CreatureKind::ALL {
            if !self.creatures.contains_key(&kind) {
                return Err(format!("missing creature profile for {}", kind.name()));
            }
        }
        if self.rules.respawn_min_ms > self.rules.respawn_max_ms {
            return Err("respawn_min_ms exceeds respawn_max_ms".to_string());
        }
        if self.rules.wander_pause_min_ms > self.rules.wander_pause_max_ms {
            return Err("wander_pause_min_ms exceeds wander_pause_max_ms".to_string());
        }
        Ok(())
    }

    fn require_item(&self, id: &str, context: &str) -> Result<(), String> {
        if self.item(id).is_some() {
            Ok(())
        } else {
            Err(format!("{} references unknown item {}", context, id))
        }
    }

    pub fn item(&self, id: &str) -> Option<&ItemDefinition> {
        self.item_index
            .get(id)
            .and_then(|index| self.items.get(*index))
    }

    pub fn price(&self, id: &str) -> Option<u32> {
        self.shop
            .iter()
            .find(|entry| entry.item == id)
            .map(|entry| entry.price)
    }

    pub fn creature(&self, kind: CreatureKind) -> Option<&CreatureProfile> {
        self.creatures.get(&kind)
    }

    pub fn loot_table(&self, kind: CreatureKind) -> &[LootEntry] {
        self.loot.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn weapon_damage(&self, weapon: Option<&str>) -> u32 {
        match weapon.and_then(|id| self.item(id)).map(|item| &item.kind) {
            Some(ItemCategory::Weapon { damage }) => *damage,
            _ => self.player.unarmed_damage,
        }
    }
}
