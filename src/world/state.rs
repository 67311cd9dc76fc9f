use crate::combat::damage::{begin_swing, respawn_delay, scatter};
use crate::combat::economy::{self, UseEffect};
use crate::combat::rejection::Rejection;
use crate::entities::creature::{Creature, CreatureId, CreatureKind, TribeId};
use crate::entities::item::{Campfire, CampfireId, DroppedItem, ItemId};
use crate::entities::player::PlayerId;
use crate::telemetry::logging;
use crate::world::creatures::{pick_tribe_center, CreatureController, DamageOutcome};
use crate::world::cron::{RespawnSchedule, TribeKey};
use crate::world::events::{Intent, Outbox, Outgoing, ServerEvent};
use crate::world::game_data::GameData;
use crate::world::loot::roll_loot;
use crate::world::players::PlayerRegistry;
use crate::world::position::Vec3;
use crate::world::time::Millis;
use crate::world::trader::TraderController;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::Arc;

const CHAT_MAX_CHARS: usize = 200;

/// Every piece of mutable simulation state. Owned by exactly one thread; intents
/// and ticks are applied to it one at a time.
#[derive(Debug)]
pub struct World {
    pub(crate) data: Arc<GameData>,
    pub(crate) rng: StdRng,
    pub(crate) players: PlayerRegistry,
    pub(crate) controllers: BTreeMap<CreatureKind, CreatureController>,
    pub(crate) trader: TraderController,
    pub(crate) items: BTreeMap<ItemId, DroppedItem>,
    pub(crate) campfires: Vec<Campfire>,
    pub(crate) respawns: RespawnSchedule,
    pub(crate) outbox: Outbox,
    pub(crate) next_player_id: u32,
    next_creature_id: u32,
    next_tribe_id: u32,
    next_item_id: u32,
    next_campfire_id: u32,
}

impl World {
    pub fn new(data: Arc<GameData>, seed: u64) -> Self {
        let controllers = data
            .creatures
            .iter()
            .map(|(kind, profile)| (*kind, CreatureController::new(*kind, profile.clone())))
            .collect();
        let catalog = data.shop.iter().map(|entry| entry.item.clone()).collect();
        let trader = TraderController::new(&data.trader, &data.rules, catalog);
        Self {
            rng: StdRng::seed_from_u64(seed),
            players: PlayerRegistry::new(data.player.default_weapon.clone()),
            controllers,
            trader,
            items: BTreeMap::new(),
            campfires: Vec::new(),
            respawns: RespawnSchedule::new(),
            outbox: Outbox::default(),
            next_player_id: 1,
            next_creature_id: 1,
            next_tribe_id: 1,
            next_item_id: 1,
            next_campfire_id: 1,
            data,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_seed(seed: u64) -> Self {
        Self::new(Arc::new(GameData::builtin().expect("builtin data")), seed)
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn controller(&self, kind: CreatureKind) -> Option<&CreatureController> {
        self.controllers.get(&kind)
    }

    pub fn trader(&self) -> &TraderController {
        &self.trader
    }

    pub fn items(&self) -> impl Iterator<Item = &DroppedItem> {
        self.items.values()
    }

    pub fn campfires(&self) -> &[Campfire] {
        &self.campfires
    }

    pub fn respawns(&self) -> &RespawnSchedule {
        &self.respawns
    }

    pub fn creature_count(&self) -> usize {
        self.controllers.values().map(CreatureController::len).sum()
    }

    pub fn find_creature(&self, id: CreatureId) -> Option<&Creature> {
        self.controllers
            .values()
            .find_map(|controller| controller.get(id))
    }

    pub fn drain_events(&mut self) -> Vec<Outgoing> {
        self.outbox.drain()
    }

    /// Spawns the initial tribes for every kind. Returns how many tribes spawned.
    pub fn populate(&mut self, now: Millis, multiplier: u32) -> usize {
        let mut spawned = 0;
        let kinds: Vec<CreatureKind> = self.controllers.keys().copied().collect();
        for kind in kinds {
            let tribes = self
                .controllers
                .get(&kind)
                .map_or(0, |controller| controller.profile().tribes)
                .saturating_mul(multiplier);
            for _ in 0..tribes {
                let Some(center) = pick_tribe_center(&self.data.rules, &mut self.rng) else {
                    logging::log_game(&format!("no dry ground for a {} tribe", kind.name()));
                    continue;
                };
                let tribe = TribeId(self.next_tribe_id);
                self.next_tribe_id += 1;
                self.spawn_tribe(kind, tribe, center, now);
                spawned += 1;
            }
        }
        logging::log_game(&format!(
            "populated {} tribes, {} creatures",
            spawned,
            self.creature_count()
        ));
        spawned
    }

    fn spawn_tribe(&mut self, kind: CreatureKind, tribe: TribeId, center: Vec3, now: Millis) -> Vec<CreatureId> {
        let Some(controller) = self.controllers.get_mut(&kind) else {
            return Vec::new();
        };
        controller.spawn_tribe(
            tribe,
            center,
            &mut self.next_creature_id,
            now,
            &self.data.rules,
            &mut self.rng,
        )
    }

    /// One fixed-period pass: due respawns, every creature controller, then the trader.
    /// Only entities that changed are broadcast.
    pub fn tick(&mut self, now: Millis) {
        while let Some((key, anchor)) = self.respawns.pop_ready(now) {
            let spawned = self.spawn_tribe(key.kind, key.tribe, anchor, now);
            logging::log_game(&format!(
                "{} tribe {} respawned with {} members",
                key.kind.name(),
                key.tribe.0,
                spawned.len()
            ));
            if let Some(controller) = self.controllers.get(&key.kind) {
                for id in spawned {
                    if let Some(creature) = controller.get(id) {
                        self.outbox
                            .broadcast(ServerEvent::CreatureUpdate(creature.view()));
                    }
                }
            }
        }

        let kinds: Vec<CreatureKind> = self.controllers.keys().copied().collect();
        for kind in kinds {
            let Some(controller) = self.controllers.get_mut(&kind) else {
                continue;
            };
            let pass = controller.update(
                now,
                &self.data.rules,
                &mut self.rng,
                &mut self.players,
                &mut self.outbox,
            );
            if !pass.moved.is_empty() {
                self.outbox.broadcast(ServerEvent::CreaturesMoved {
                    kind,
                    creatures: pass.moved,
                });
            }
            for fallen in pass.deaths {
                self.respawn_player(fallen);
            }
        }

        if self.trader.update(now, &mut self.rng) {
            self.outbox
                .broadcast(ServerEvent::TraderUpdate(self.trader.trader().view()));
        }
    }

    /// Applies one client intent immediately. Rejections leave the world untouched
    /// apart from an optional private notice to the requester.
    pub fn apply_intent(&mut self, player: PlayerId, intent: Intent, now: Millis) -> Result<(), Rejection> {
        if !self.players.contains(player) {
            return Err(Rejection::UnknownEntity);
        }
        let result = match intent {
            Intent::Move(position) => self.move_player(player, position.into_vec3()),
            Intent::ChatMessage(text) => self.chat(player, &text),
            Intent::SkinUpdate(skin) => self.update_skin(player, &skin),
            Intent::PlayerAttack => self.player_attack(player, now),
            Intent::AttackCreature(id) => self.provoke_creature(player, id),
            Intent::UseItem(item) => self.use_item(player, &item),
            Intent::Trade(item) => self.trade(player, &item),
            Intent::DropItem(item) => self.drop_item(player, &item),
            Intent::EquipItem(item) => self.equip_item(player, &item),
            Intent::PickupItem(id) => self.pickup_item(player, id),
        };
        if let Err(rejection) = result {
            if let Some((name, text)) = rejection.notice() {
                self.notify(player, name, text);
            }
        }
        result
    }

    fn move_player(&mut self, id: PlayerId, position: Vec3) -> Result<(), Rejection> {
        if !position.is_finite() {
            return Err(Rejection::Invalid);
        }
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        player.position = position;
        self.outbox
            .broadcast_except(id, ServerEvent::PlayerMoved { id, position });
        Ok(())
    }

    fn chat(&mut self, id: PlayerId, text: &str) -> Result<(), Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::Invalid);
        }
        let player = self.players.get(id).ok_or(Rejection::UnknownEntity)?;
        let color = player.color.clone();
        self.outbox.broadcast(ServerEvent::ChatMessage {
            sender: Some(id),
            name: format!("Player {}", id.0),
            text: text.chars().take(CHAT_MAX_CHARS).collect(),
            color,
        });
        Ok(())
    }

    fn update_skin(&mut self, id: PlayerId, skin: &str) -> Result<(), Rejection> {
        let skin = skin.trim();
        if skin.is_empty() {
            return Err(Rejection::Invalid);
        }
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        player.skin = Some(skin.to_string());
        self.broadcast_player(id);
        Ok(())
    }

    /// Swings the equipped weapon at every creature of every kind in reach.
    fn player_attack(&mut self, id: PlayerId, now: Millis) -> Result<(), Rejection> {
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        let damage = begin_swing(player, &self.data, now)?;
        let origin = player.position;
        self.outbox
            .broadcast_except(id, ServerEvent::PlayerAttacked { id });

        let radius = self.data.player.attack_radius;
        let targets: Vec<(CreatureKind, CreatureId)> = self
            .controllers
            .iter()
            .flat_map(|(kind, controller)| {
                controller
                    .within_radius(origin, radius)
                    .into_iter()
                    .map(move |creature| (*kind, creature))
            })
            .collect();
        for (kind, creature) in targets {
            self.damage_creature(kind, creature, damage, id, now);
        }
        Ok(())
    }

    /// Aggro without damage: alerts the creature's tribe unless it is already hunting.
    fn provoke_creature(&mut self, id: PlayerId, creature: CreatureId) -> Result<(), Rejection> {
        let (kind, tribe, angry) = self
            .find_creature(creature)
            .map(|creature| (creature.kind, creature.tribe, creature.is_angry()))
            .ok_or(Rejection::UnknownEntity)?;
        if angry {
            return Ok(());
        }
        if let Some(controller) = self.controllers.get_mut(&kind) {
            controller.provoke(tribe, id, &mut self.outbox);
        }
        Ok(())
    }

    pub(crate) fn damage_creature(
        &mut self,
        kind: CreatureKind,
        creature: CreatureId,
        damage: u32,
        attacker: PlayerId,
        now: Millis,
    ) -> Option<DamageOutcome> {
        let controller = self.controllers.get_mut(&kind)?;
        let outcome = controller.handle_damage(creature, damage, attacker, &mut self.outbox)?;
        if let DamageOutcome::Killed {
            tribe,
            position,
            anchor,
            tribe_wiped,
        } = &outcome
        {
            self.drop_loot(kind, *position);
            if *tribe_wiped {
                let delay = respawn_delay(&self.data.rules, &mut self.rng);
                let key = TribeKey { kind, tribe: *tribe };
                self.respawns.schedule(key, *anchor, now.plus(delay));
                logging::log_game(&format!(
                    "{} tribe {} wiped, respawn in {} s",
                    kind.name(),
                    tribe.0,
                    delay / 1_000
                ));
            }
        }
        Some(outcome)
    }

    fn drop_loot(&mut self, kind: CreatureKind, position: Vec3) {
        let drops = roll_loot(self.data.loot_table(kind), &mut self.rng);
        for drop in drops {
            for _ in 0..drop.count {
                let spot = scatter(position, &mut self.rng);
                self.spawn_item(&drop.item, spot);
            }
        }
    }

    fn spawn_item(&mut self, item: &str, position: Vec3) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        let dropped = DroppedItem {
            id,
            item_id: item.to_string(),
            position,
        };
        self.outbox
            .broadcast(ServerEvent::ItemDropped(dropped.clone()));
        self.items.insert(id, dropped);
        id
    }

    fn pickup_item(&mut self, id: PlayerId, item: ItemId) -> Result<(), Rejection> {
        let position = self
            .items
            .get(&item)
            .map(|dropped| dropped.position)
            .ok_or(Rejection::UnknownEntity)?;
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        if player.position.planar_distance(position) > self.data.player.pickup_radius {
            return Err(Rejection::OutOfRange);
        }
        let dropped = self.items.remove(&item).ok_or(Rejection::UnknownEntity)?;
        player.inventory.add(&dropped.item_id, 1);
        self.outbox.send_to(
            id,
            ServerEvent::InventoryAdd {
                item_id: dropped.item_id,
                count: 1,
            },
        );
        self.outbox.broadcast(ServerEvent::ItemRemoved { id: item });
        self.broadcast_player(id);
        Ok(())
    }

    fn use_item(&mut self, id: PlayerId, item: &str) -> Result<(), Rejection> {
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        let cook_radius = self.data.player.cook_radius;
        let near_campfire = self
            .campfires
            .iter()
            .any(|campfire| campfire.position.planar_distance(player.position) <= cook_radius);
        let effect = economy::use_item(player, &self.data, item, near_campfire)?;
        let position = player.position.grounded();
        if effect == UseEffect::PlaceCampfire {
            let campfire = Campfire {
                id: CampfireId(self.next_campfire_id),
                position,
            };
            self.next_campfire_id += 1;
            self.campfires.push(campfire.clone());
            self.outbox.broadcast(ServerEvent::CampfirePlaced(campfire));
        }
        self.broadcast_player(id);
        Ok(())
    }

    fn trade(&mut self, id: PlayerId, item: &str) -> Result<(), Rejection> {
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        economy::buy(player, &self.data, item)?;
        self.broadcast_player(id);
        Ok(())
    }

    fn drop_item(&mut self, id: PlayerId, item: &str) -> Result<(), Rejection> {
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        economy::discard(player, item)?;
        let origin = player.position;
        let spot = scatter(origin, &mut self.rng);
        self.spawn_item(item, spot);
        self.broadcast_player(id);
        Ok(())
    }

    fn equip_item(&mut self, id: PlayerId, item: &str) -> Result<(), Rejection> {
        let player = self.players.get_mut(id).ok_or(Rejection::UnknownEntity)?;
        economy::equip(player, &self.data, item)?;
        self.broadcast_player(id);
        Ok(())
    }

    pub(crate) fn broadcast_player(&mut self, id: PlayerId) {
        if let Some(view) = self.players.view(id) {
            self.outbox.broadcast(ServerEvent::PlayerUpdate(view));
        }
    }

    fn notify(&mut self, id: PlayerId, name: &str, text: &str) {
        self.outbox.send_to(
            id,
            ServerEvent::ChatMessage {
                sender: None,
                name: name.to_string(),
                text: text.to_string(),
                color: "#ffd700".to_string(),
            },
        );
    }
}
