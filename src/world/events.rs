use crate::entities::creature::{CreatureId, CreatureKind, CreatureView};
use crate::entities::item::{Campfire, DroppedItem, ItemId};
use crate::entities::player::{PlayerId, PlayerView};
use crate::entities::trader::TraderView;
use crate::world::game_data::{ItemDefinition, ShopEntry};
use crate::world::position::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client-originated requests.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Intent {
    #[serde(alias = "playerMove")]
    Move(PositionInput),
    ChatMessage(String),
    SkinUpdate(String),
    PlayerAttack,
    AttackCreature(CreatureId),
    UseItem(String),
    Trade(String),
    DropItem(String),
    EquipItem(String),
    PickupItem(ItemId),
}

/// Positions arrive either as `[x, y, z]` or `{x, y, z}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PositionInput {
    Array([f64; 3]),
    Object(Vec3),
}

impl PositionInput {
    pub fn into_vec3(self) -> Vec3 {
        match self {
            PositionInput::Array([x, y, z]) => Vec3::new(x, y, z),
            PositionInput::Object(position) => position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    Welcome {
        id: PlayerId,
    },
    CurrentPlayers(Vec<PlayerView>),
    CurrentCreatures {
        kind: CreatureKind,
        creatures: BTreeMap<CreatureId, CreatureView>,
    },
    CurrentCampfires(Vec<Campfire>),
    CurrentItems(Vec<DroppedItem>),
    TraderState(TraderView),
    ShopCatalog(Vec<ShopEntry>),
    ItemDefinitions(Vec<ItemDefinition>),
    NewPlayer(PlayerView),
    PlayerMoved {
        id: PlayerId,
        position: Vec3,
    },
    PlayerDisconnected {
        id: PlayerId,
    },
    PlayerUpdate(PlayerView),
    PlayerRespawn(PlayerView),
    PlayerAttacked {
        id: PlayerId,
    },
    ChatMessage {
        sender: Option<PlayerId>,
        name: String,
        text: String,
        color: String,
    },
    CreatureUpdate(CreatureView),
    CreaturesMoved {
        kind: CreatureKind,
        creatures: BTreeMap<CreatureId, CreatureView>,
    },
    CreatureDamaged {
        kind: CreatureKind,
        id: CreatureId,
        hp: u32,
        attacker: PlayerId,
    },
    CreatureKilled {
        kind: CreatureKind,
        id: CreatureId,
    },
    CreatureAttackCue {
        kind: CreatureKind,
        id: CreatureId,
        target: PlayerId,
    },
    ItemDropped(DroppedItem),
    ItemRemoved {
        id: ItemId,
    },
    InventoryAdd {
        item_id: String,
        count: u32,
    },
    CampfirePlaced(Campfire),
    TraderUpdate(TraderView),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    Only(PlayerId),
    AllExcept(PlayerId),
}

impl Audience {
    pub fn includes(self, player: PlayerId) -> bool {
        match self {
            Audience::All => true,
            Audience::Only(only) => only == player,
            Audience::AllExcept(excluded) => excluded != player,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub audience: Audience,
    pub event: ServerEvent,
}

/// Events produced by one callback, waiting to be routed to sessions.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<Outgoing>,
}

impl Outbox {
    pub fn broadcast(&mut self, event: ServerEvent) {
        self.push(Audience::All, event);
    }

    pub fn send_to(&mut self, player: PlayerId, event: ServerEvent) {
        self.push(Audience::Only(player), event);
    }

    pub fn broadcast_except(&mut self, player: PlayerId, event: ServerEvent) {
        self.push(Audience::AllExcept(player), event);
    }

    pub fn push(&mut self, audience: Audience, event: ServerEvent) {
        self.queued.push(Outgoing { audience, event });
    }

    pub fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.queued)
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}
