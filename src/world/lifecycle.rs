use crate::entities::player::{Player, PlayerId};
use crate::telemetry::logging;
use crate::world::events::ServerEvent;
use crate::world::state::World;
use rand::Rng;

impl World {
    /// Registers a new player at the origin, sends the joiner the full snapshot
    /// and announces them to everyone else.
    pub fn connect_player(&mut self) -> PlayerId {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        let color = format!("#{:06x}", self.rng.random_range(0..=0x00ff_ffffu32));
        let player = Player::new(id, color, self.data.rules.origin, &self.data.player);
        self.players.insert(player);

        self.outbox.send_to(id, ServerEvent::Welcome { id });
        self.outbox
            .send_to(id, ServerEvent::CurrentPlayers(self.players.views()));
        for (kind, controller) in &self.controllers {
            self.outbox.send_to(
                id,
                ServerEvent::CurrentCreatures {
                    kind: *kind,
                    creatures: controller.views(),
                },
            );
        }
        self.outbox
            .send_to(id, ServerEvent::CurrentCampfires(self.campfires.clone()));
        self.outbox.send_to(
            id,
            ServerEvent::CurrentItems(self.items.values().cloned().collect()),
        );
        self.outbox
            .send_to(id, ServerEvent::TraderState(self.trader.trader().view()));
        self.outbox
            .send_to(id, ServerEvent::ShopCatalog(self.data.shop.clone()));
        self.outbox
            .send_to(id, ServerEvent::ItemDefinitions(self.data.items.clone()));
        if let Some(view) = self.players.view(id) {
            self.outbox.broadcast_except(id, ServerEvent::NewPlayer(view));
        }
        logging::log_game(&format!(
            "player {} connected ({} online)",
            id.0,
            self.players.len()
        ));
        id
    }

    /// Removes the player. Creatures hunting them let go on their next pass.
    pub fn disconnect_player(&mut self, id: PlayerId) -> bool {
        if self.players.remove(id).is_none() {
            return false;
        }
        self.outbox
            .broadcast(ServerEvent::PlayerDisconnected { id });
        logging::log_game(&format!(
            "player {} disconnected ({} online)",
            id.0,
            self.players.len()
        ));
        true
    }

    /// The single death rule: full health, back to the origin, forgotten by every
    /// creature of every kind, then the restored state is broadcast.
    pub fn respawn_player(&mut self, id: PlayerId) -> bool {
        let origin = self.data.rules.origin;
        let Some(player) = self.players.get_mut(id) else {
            return false;
        };
        player.hp = player.max_hp;
        player.position = origin;
        for controller in self.controllers.values_mut() {
            controller.clear_aggro(id, &mut self.outbox);
        }
        if let Some(view) = self.players.view(id) {
            self.outbox.broadcast(ServerEvent::PlayerRespawn(view));
        }
        logging::log_game(&format!("player {} died and respawned", id.0));
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::entities::creature::{CreatureKind, CreatureState, TribeId};
    use crate::entities::player::PlayerId;
    use crate::world::events::{Audience, ServerEvent};
    use crate::world::position::Vec3;
    use crate::world::state::World;
    use crate::world::time::Millis;

    #[test]
    fn join_sends_full_snapshot_to_joiner_only() {
        let mut world = World::with_seed(1);
        world.populate(Millis(0), 1);
        let first = world.connect_player();
        world.drain_events();
        let second = world.connect_player();
        let events = world.drain_events();

        let private: Vec<&'static str> = events
            .iter()
            .filter(|out| out.audience == Audience::Only(second))
            .map(|out| match &out.event {
                ServerEvent::Welcome { .. } => "welcome",
                ServerEvent::CurrentPlayers(_) => "currentPlayers",
                ServerEvent::CurrentCreatures { .. } => "currentCreatures",
                ServerEvent::CurrentCampfires(_) => "currentCampfires",
                ServerEvent::CurrentItems(_) => "currentItems",
                ServerEvent::TraderState(_) => "traderState",
                ServerEvent::ShopCatalog(_) => "shopCatalog",
                ServerEvent::ItemDefinitions(_) => "itemDefinitions",
                _ => "other",
            })
            .collect();
        assert_eq!(
            private,
            vec![
                "welcome",
                "currentPlayers",
                "currentCreatures",
                "currentCreatures",
                "currentCampfires",
                "currentItems",
                "traderState",
                "shopCatalog",
                "itemDefinitions",
            ]
        );
        let announced = events.iter().any(|out| {
            out.audience == Audience::AllExcept(second)
                && matches!(&out.event, ServerEvent::NewPlayer(view) if view.id == second)
        });
        assert!(announced);
        assert!(second > first);
    }

    #[test]
    fn disconnect_announces_and_is_idempotent() {
        let mut world = World::with_seed(2);
        let id = world.connect_player();
        world.drain_events();
        assert!(world.disconnect_player(id));
        assert!(!world.disconnect_player(id));
        let events = world.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].event,
            ServerEvent::PlayerDisconnected { id: gone } if gone == id
        ));
    }

    #[test]
    fn respawn_restores_player_and_clears_every_tribe() {
        let mut world = World::with_seed(3);
        world.populate(Millis(0), 1);
        let id = world.connect_player();
        for controller in world.controllers.values_mut() {
            let tribes: Vec<TribeId> = controller.iter().map(|creature| creature.tribe).collect();
            let mut outbox = crate::world::events::Outbox::default();
            for tribe in tribes {
                controller.provoke(tribe, id, &mut outbox);
            }
        }
        if let Some(player) = world.players.get_mut(id) {
            player.hp = 0;
            player.position = Vec3::planar(30.0, 30.0);
        }

        assert!(world.respawn_player(id));
        let player = world.players().get(id).expect("player");
        assert_eq!(player.hp, player.max_hp);
        assert_eq!(player.position, Vec3::ORIGIN);
        for kind in CreatureKind::ALL {
            for creature in world.controller(kind).expect("controller").iter() {
                assert_eq!(creature.state, CreatureState::Idle);
            }
        }
        let events = world.drain_events();
        assert!(matches!(
            events.last().map(|out| &out.event),
            Some(ServerEvent::PlayerRespawn(view)) if view.id == id
        ));
    }

    #[test]
    fn respawn_of_unknown_player_is_noop() {
        let mut world = World::with_seed(4);
        assert!(!world.respawn_player(PlayerId(99)));
        assert!(world.drain_events().is_empty());
    }
}
