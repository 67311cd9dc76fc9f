use crate::entities::player::{Player, PlayerId, PlayerView};
use std::collections::BTreeMap;

/// Authoritative record of every connected player.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
    default_weapon: String,
}

impl PlayerRegistry {
    pub fn new(default_weapon: impl Into<String>) -> Self {
        Self {
            players: BTreeMap::new(),
            default_weapon: default_weapon.into(),
        }
    }

    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn default_weapon(&self) -> &str {
        &self.default_weapon
    }

    pub fn view(&self, id: PlayerId) -> Option<PlayerView> {
        self.players
            .get(&id)
            .map(|player| player.view(&self.default_weapon))
    }

    pub fn views(&self) -> Vec<PlayerView> {
        self.players
            .values()
            .map(|player| player.view(&self.default_weapon))
            .collect()
    }
}
