use crate::entities::creature::{
    Creature, CreatureId, CreatureKind, CreatureState, CreatureView, LeapPhase, TribeId,
};
use crate::entities::player::PlayerId;
use crate::world::area::{in_house, in_river};
use crate::world::events::{Outbox, ServerEvent};
use crate::world::game_data::{CreatureProfile, LeapProfile, WorldRules};
use crate::world::players::PlayerRegistry;
use crate::world::position::Vec3;
use crate::world::time::Millis;
use crate::world::tribes::{provoke_tribe, release_target, tribe_population};
use crate::world::wander::{self, WanderParams, Wanderer};
use rand::Rng;
use std::collections::BTreeMap;
use std::f64::consts::TAU;

const INITIAL_WANDER_JITTER_MS: u64 = 5_000;

/// Result of one controller pass.
#[derive(Debug, Default)]
pub struct CreaturePass {
    pub moved: BTreeMap<CreatureId, CreatureView>,
    pub deaths: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DamageOutcome {
    Wounded {
        hp: u32,
    },
    Killed {
        tribe: TribeId,
        position: Vec3,
        anchor: Vec3,
        tribe_wiped: bool,
    },
}

/// Owns every live creature of one kind.
#[derive(Debug)]
pub struct CreatureController {
    kind: CreatureKind,
    profile: CreatureProfile,
    creatures: BTreeMap<CreatureId, Creature>,
}

impl CreatureController {
    pub fn new(kind: CreatureKind, profile: CreatureProfile) -> Self {
        Self {
            kind,
            profile,
            creatures: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> CreatureKind {
        self.kind
    }

    pub fn profile(&self) -> &CreatureProfile {
        &self.profile
    }

    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    pub fn views(&self) -> BTreeMap<CreatureId, CreatureView> {
        self.creatures
            .iter()
            .map(|(id, creature)| (*id, creature.view()))
            .collect()
    }

    pub fn tribe_population(&self, tribe: TribeId) -> usize {
        tribe_population(&self.creatures, tribe)
    }

    /// Creates a fresh batch around `center`, which becomes every member's anchor.
    pub fn spawn_tribe<R: Rng>(
        &mut self,
        tribe: TribeId,
        center: Vec3,
        next_id: &mut u32,
        now: Millis,
        rules: &WorldRules,
        rng: &mut R,
    ) -> Vec<CreatureId> {
        let anchor = center.grounded();
        let mut spawned = Vec::with_capacity(self.profile.tribe_size as usize);
        for _ in 0..self.profile.tribe_size {
            let id = CreatureId(*next_id);
            *next_id += 1;
            let position = Vec3::planar(
                anchor.x + spread(rules.tribe_spread, rng),
                anchor.z + spread(rules.tribe_spread, rng),
            );
            let creature = Creature {
                id,
                kind: self.kind,
                tribe,
                position,
                facing: rng.random::<f64>() * TAU,
                hp: self.profile.max_hp,
                max_hp: self.profile.max_hp,
                state: CreatureState::Idle,
                anchor,
                next_wander_at: now.plus(rng.random_range(0..=INITIAL_WANDER_JITTER_MS)),
                last_attack: None,
            };
            self.creatures.insert(id, creature);
            spawned.push(id);
        }
        spawned
    }

    /// Angers the whole tribe at `target` and announces each member that changed.
    pub fn provoke(&mut self, tribe: TribeId, target: PlayerId, outbox: &mut Outbox) -> usize {
        let changed = provoke_tribe(&mut self.creatures, tribe, target);
        for id in &changed {
            if let Some(creature) = self.creatures.get(id) {
                outbox.broadcast(ServerEvent::CreatureUpdate(creature.view()));
            }
        }
        changed.len()
    }

    /// Releases every creature hunting `target`.
    pub fn clear_aggro(&mut self, target: PlayerId, outbox: &mut Outbox) -> usize {
        let released = release_target(&mut self.creatures, target);
        for id in &released {
            if let Some(creature) = self.creatures.get(id) {
                outbox.broadcast(ServerEvent::CreatureUpdate(creature.view()));
            }
        }
        released.len()
    }

    pub fn within_radius(&self, center: Vec3, radius: f64) -> Vec<CreatureId> {
        self.creatures
            .values()
            .filter(|creature| creature.position.planar_distance(center) <= radius)
            .map(|creature| creature.id)
            .collect()
    }

    /// Applies a hit. A creature that was not yet angry alerts its tribe before the
    /// hit is resolved, so a lethal first blow still leaves the survivors hunting.
    pub fn handle_damage(
        &mut self,
        id: CreatureId,
        damage: u32,
        attacker: PlayerId,
        outbox: &mut Outbox,
    ) -> Option<DamageOutcome> {
        let creature = self.creatures.get(&id)?;
        let tribe = creature.tribe;
        if !creature.is_angry() {
            self.provoke(tribe, attacker, outbox);
        }

        let creature = self.creatures.get_mut(&id)?;
        creature.hp = creature.hp.saturating_sub(damage);
        let hp = creature.hp;
        outbox.broadcast(ServerEvent::CreatureDamaged {
            kind: self.kind,
            id,
            hp,
            attacker,
        });
        if hp > 0 {
            return Some(DamageOutcome::Wounded { hp });
        }

        let dead = self.creatures.remove(&id)?;
        outbox.broadcast(ServerEvent::CreatureKilled { kind: self.kind, id });
        Some(DamageOutcome::Killed {
            tribe,
            position: dead.position.grounded(),
            anchor: dead.anchor,
            tribe_wiped: self.tribe_population(tribe) == 0,
        })
    }

    /// Advances every creature one tick. Players killed during the pass are
    /// reported in `deaths` and are not attacked again by later creatures.
    pub fn update<R: Rng>(
        &mut self,
        now: Millis,
        rules: &WorldRules,
        rng: &mut R,
        players: &mut PlayerRegistry,
        outbox: &mut Outbox,
    ) -> CreaturePass {
        let mut pass = CreaturePass::default();
        let wander_params = WanderParams {
            radius: rules.wander_radius,
            speed: self.profile.wander_speed,
            body_radius: self.profile.body_radius,
            arrival: rules.wander_arrival,
            pause_min_ms: rules.wander_pause_min_ms,
            pause_max_ms: rules.wander_pause_max_ms,
            blocked_retry_ms: rules.blocked_wander_retry_ms,
        };

        for creature in self.creatures.values_mut() {
            let changed = match creature.state {
                CreatureState::Angry { target, leap } => {
                    let mut hunt = Hunt {
                        kind: self.kind,
                        profile: &self.profile,
                        rules,
                        now,
                        players: &mut *players,
                        outbox: &mut *outbox,
                        deaths: &mut pass.deaths,
                    };
                    hunt.advance(creature, target, leap)
                }
                CreatureState::Idle | CreatureState::Wander { .. } => {
                    roam(creature, &wander_params, now, rng)
                }
            };
            if changed {
                pass.moved.insert(creature.id, creature.view());
            }
        }
        pass
    }
}

/// Picks a tribe centre away from the river. `None` when every attempt landed in it.
pub fn pick_tribe_center<R: Rng>(rules: &WorldRules, rng: &mut R) -> Option<Vec3> {
    for _ in 0..rules.spawn_attempts.max(1) {
        let angle = rng.random::<f64>() * TAU;
        let span = (rules.tribe_max_distance - rules.tribe_min_distance).max(0.0);
        let distance = rules.tribe_min_distance + rng.random::<f64>() * span;
        let candidate = rules.origin.offset_polar(angle, distance).grounded();
        if !in_river(candidate) {
            return Some(candidate);
        }
    }
    None
}

fn spread<R: Rng>(half_width: f64, rng: &mut R) -> f64 {
    (rng.random::<f64>() * 2.0 - 1.0) * half_width
}

fn roam<R: Rng>(creature: &mut Creature, params: &WanderParams, now: Millis, rng: &mut R) -> bool {
    let mut destination = match creature.state {
        CreatureState::Wander { destination } => Some(destination),
        _ => None,
    };
    let changed = wander::advance(
        Wanderer {
            position: &mut creature.position,
            facing: &mut creature.facing,
            destination: &mut destination,
            next_wander_at: &mut creature.next_wander_at,
            anchor: creature.anchor,
        },
        params,
        now,
        rng,
    );
    creature.state = match destination {
        Some(destination) => CreatureState::Wander { destination },
        None => CreatureState::Idle,
    };
    changed
}

/// Borrowed context for advancing one angry creature.
struct Hunt<'a> {
    kind: CreatureKind,
    profile: &'a CreatureProfile,
    rules: &'a WorldRules,
    now: Millis,
    players: &'a mut PlayerRegistry,
    outbox: &'a mut Outbox,
    deaths: &'a mut Vec<PlayerId>,
}

impl Hunt<'_> {
    /// Returns true when the creature's view changed and belongs in the
    /// moved batch. A release is broadcast on its own and returns false.
    fn advance(&mut self, creature: &mut Creature, target: PlayerId, leap: Option<LeapPhase>) -> bool {
        let before = creature.view();
        let alive = self
            .players
            .get(target)
            .filter(|player| player.is_alive() && !self.deaths.contains(&target))
            .map(|player| player.position);
        let Some(target_position) = alive else {
            self.release(creature);
            return false;
        };

        let distance = creature.position.planar_distance(target_position);
        if distance > self.rules.leash_radius {
            self.release(creature);
            return false;
        }

        if distance > self.profile.melee_range {
            let next = match &self.profile.leap {
                Some(leap_profile) => {
                    self.approach_with_leap(creature, target_position, distance, leap, leap_profile)
                }
                None => {
                    chase(creature, target_position, self.profile);
                    None
                }
            };
            creature.state = CreatureState::Angry { target, leap: next };
        } else {
            let next = match self.profile.leap.as_ref() {
                Some(leap_profile) => settle_in_melee(creature, leap, leap_profile, self.now),
                None => None,
            };
            creature.state = CreatureState::Angry { target, leap: next };
            self.strike(creature, target, target_position);
        }
        creature.view() != before
    }

    fn release(&mut self, creature: &mut Creature) {
        creature.calm();
        self.outbox.broadcast(ServerEvent::CreatureUpdate(creature.view()));
    }

    fn approach_with_leap(
        &self,
        creature: &mut Creature,
        target_position: Vec3,
        distance: f64,
        leap: Option<LeapPhase>,
        leap_profile: &LeapProfile,
    ) -> Option<LeapPhase> {
        let now = self.now;
        let heading = creature.position.heading_to(target_position);
        match leap {
            None | Some(LeapPhase::Ready { .. }) if distance > leap_profile.trigger_radius => {
                chase(creature, target_position, self.profile);
                None
            }
            None => {
                creature.facing = heading;
                Some(LeapPhase::Ready { since: now })
            }
            Some(LeapPhase::Ready { since }) => {
                creature.facing = heading;
                if now.since(since) >= leap_profile.ready_ms {
                    Some(LeapPhase::Leap { since: now })
                } else {
                    Some(LeapPhase::Ready { since })
                }
            }
            Some(LeapPhase::Leap { since }) => {
                let t = (now.since(since) as f64 / leap_profile.leap_ms.max(1) as f64).min(1.0);
                let travel = (distance - self.profile.melee_range).max(0.0);
                let next = creature
                    .position
                    .step_toward(target_position, leap_profile.speed.min(travel));
                creature.facing = heading;
                if !in_house(next, self.profile.body_radius) {
                    creature.position.x = next.x;
                    creature.position.z = next.z;
                }
                if t >= 1.0 {
                    creature.position.y = 0.0;
                    Some(LeapPhase::Recovery { since: now })
                } else {
                    creature.position.y = 4.0 * leap_profile.peak_height * t * (1.0 - t);
                    Some(LeapPhase::Leap { since })
                }
            }
            Some(LeapPhase::Recovery { since }) => {
                if now.since(since) >= leap_profile.recovery_ms {
                    None
                } else {
                    Some(LeapPhase::Recovery { since })
                }
            }
        }
    }

    fn strike(&mut self, creature: &mut Creature, target: PlayerId, target_position: Vec3) {
        if !creature.attack_ready(self.now, self.profile.attack_cooldown_ms) {
            return;
        }
        creature.last_attack = Some(self.now);
        creature.facing = creature.position.heading_to(target_position);
        self.outbox.broadcast(ServerEvent::CreatureAttackCue {
            kind: self.kind,
            id: creature.id,
            target,
        });

        let lethal = self
            .players
            .get_mut(target)
            .map_or(false, |player| player.apply_damage(self.profile.damage));
        if lethal {
            self.deaths.push(target);
        } else if let Some(view) = self.players.view(target) {
            self.outbox.broadcast(ServerEvent::PlayerUpdate(view));
        }
    }
}

/// Ordinary chase step. A step into the house is suppressed but the creature
/// still turns toward its target.
fn chase(creature: &mut Creature, target_position: Vec3, profile: &CreatureProfile) {
    creature.facing = creature.position.heading_to(target_position);
    let next = creature
        .position
        .step_toward(target_position, profile.chase_speed)
        .grounded();
    if !in_house(next, profile.body_radius) {
        creature.position = next;
    }
}

/// Leap phase once the target is within melee range: a leap in flight lands,
/// a wind-up is abandoned, a recovery runs out its timer.
fn settle_in_melee(
    creature: &mut Creature,
    leap: Option<LeapPhase>,
    leap_profile: &LeapProfile,
    now: Millis,
) -> Option<LeapPhase> {
    match leap {
        Some(LeapPhase::Leap { .. }) => {
            creature.position.y = 0.0;
            Some(LeapPhase::Recovery { since: now })
        }
        Some(LeapPhase::Ready { .. }) | None => None,
        Some(LeapPhase::Recovery { since }) if now.since(since) >= leap_profile.recovery_ms => None,
        recovering => recovering,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::player::Player;
    use crate::world::game_data::GameData;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        data: GameData,
        controller: CreatureController,
        players: PlayerRegistry,
        outbox: Outbox,
        rng: StdRng,
        next_id: u32,
    }

    impl Fixture {
        fn new(kind: CreatureKind) -> Self {
            let data = GameData::builtin().expect("builtin data");
            let profile = data.creature(kind).expect("profile").clone();
            let players = PlayerRegistry::new(data.player.default_weapon.clone());
            Self {
                controller: CreatureController::new(kind, profile),
                data,
                players,
                outbox: Outbox::default(),
                rng: StdRng::seed_from_u64(7),
                next_id: 1,
            }
        }

        fn spawn(&mut self, center: Vec3) -> Vec<CreatureId> {
            self.controller.spawn_tribe(
                TribeId(0),
                center,
                &mut self.next_id,
                Millis(0),
                &self.data.rules,
                &mut self.rng,
            )
        }

        fn add_player(&mut self, id: u32, position: Vec3) -> PlayerId {
            let id = PlayerId(id);
            self.players.insert(Player::new(
                id,
                "#123456".to_string(),
                position,
                &self.data.player,
            ));
            id
        }

        fn place(&mut self, id: CreatureId, position: Vec3) {
            self.controller.get_mut(id).expect("creature").position = position;
        }

        fn tick(&mut self, now: u64) -> CreaturePass {
            self.controller.update(
                Millis(now),
                &self.data.rules,
                &mut self.rng,
                &mut self.players,
                &mut self.outbox,
            )
        }
    }

    #[test]
    fn spawn_keeps_members_near_shared_anchor() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let center = Vec3::planar(20.0, 20.0);
        let ids = fixture.spawn(center);
        assert_eq!(ids.len(), 3);
        for id in ids {
            let creature = fixture.controller.get(id).expect("creature");
            assert_eq!(creature.anchor, center);
            assert!((creature.position.x - center.x).abs() <= 2.0);
            assert!((creature.position.z - center.z).abs() <= 2.0);
            assert_eq!(creature.state, CreatureState::Idle);
        }
        assert_eq!(fixture.next_id, 4);
    }

    #[test]
    fn first_hit_alerts_tribe_even_when_lethal() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let attacker = fixture.add_player(1, Vec3::planar(20.0, 20.0));

        let outcome = fixture
            .controller
            .handle_damage(ids[0], 500, attacker, &mut fixture.outbox)
            .expect("outcome");
        assert!(matches!(
            outcome,
            DamageOutcome::Killed { tribe_wiped: false, .. }
        ));
        for id in &ids[1..] {
            assert_eq!(
                fixture.controller.get(*id).expect("survivor").target(),
                Some(attacker)
            );
        }
        let events = fixture.outbox.drain();
        let updates = events
            .iter()
            .filter(|out| matches!(out.event, ServerEvent::CreatureUpdate(_)))
            .count();
        assert_eq!(updates, 3);
        assert!(events
            .iter()
            .any(|out| matches!(out.event, ServerEvent::CreatureKilled { .. })));
    }

    #[test]
    fn last_member_death_reports_wipe() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let attacker = fixture.add_player(1, Vec3::planar(20.0, 20.0));
        let mut last = None;
        for id in ids {
            last = fixture
                .controller
                .handle_damage(id, 1_000, attacker, &mut fixture.outbox);
        }
        match last {
            Some(DamageOutcome::Killed { tribe_wiped, anchor, .. }) => {
                assert!(tribe_wiped);
                assert_eq!(anchor, Vec3::planar(20.0, 20.0));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(fixture.controller.is_empty());
    }

    #[test]
    fn wounding_an_angry_creature_does_not_reprovoke() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let first = fixture.add_player(1, Vec3::planar(20.0, 20.0));
        let second = fixture.add_player(2, Vec3::planar(20.0, 20.0));
        fixture.controller.provoke(TribeId(0), first, &mut fixture.outbox);
        fixture
            .controller
            .handle_damage(ids[0], 10, second, &mut fixture.outbox);
        assert_eq!(fixture.controller.get(ids[1]).expect("creature").target(), Some(first));
        assert_eq!(fixture.controller.get(ids[0]).expect("creature").hp, 90);
    }

    #[test]
    fn leash_releases_target() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 20.0));
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);
        fixture.place(ids[0], Vec3::planar(20.0, 41.0));

        fixture.outbox.drain();

        let pass = fixture.tick(200);
        let creature = fixture.controller.get(ids[0]).expect("creature");
        assert_eq!(creature.state, CreatureState::Idle);
        assert_eq!(creature.target(), None);
        assert!(!pass.moved.contains_key(&ids[0]));
        let released = fixture
            .outbox
            .drain()
            .into_iter()
            .filter(|out| {
                matches!(&out.event, ServerEvent::CreatureUpdate(view) if view.id == ids[0])
            })
            .count();
        assert_eq!(released, 1);
    }

    #[test]
    fn chase_into_house_is_suppressed_but_turns() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let target = Vec3::planar(-45.0, 25.0);
        let player = fixture.add_player(1, target);
        for id in &ids {
            fixture.place(*id, Vec3::planar(60.0, 60.0));
        }
        let wall = Vec3::planar(-30.8, 25.0);
        fixture.place(ids[0], wall);
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);

        let first = fixture.tick(200);
        let dog = fixture.controller.get(ids[0]).expect("dog");
        assert_eq!(dog.position, wall);
        assert!((dog.facing - wall.heading_to(target)).abs() < 1e-9);
        assert!(first.moved.contains_key(&ids[0]));

        let second = fixture.tick(400);
        assert_eq!(fixture.controller.get(ids[0]).expect("dog").position, wall);
        assert!(!second.moved.contains_key(&ids[0]));
    }

    #[test]
    fn bear_holding_ready_is_not_rebroadcast() {
        let mut fixture = Fixture::new(CreatureKind::Bear);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 23.5));
        for id in &ids {
            fixture.place(*id, Vec3::planar(60.0, 60.0));
        }
        fixture.place(ids[0], Vec3::planar(20.0, 20.0));
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);

        let wind_up = fixture.tick(1_000);
        assert!(wind_up.moved.contains_key(&ids[0]));
        let holding = fixture.tick(1_200);
        assert!(matches!(
            fixture.controller.get(ids[0]).expect("bear").leap(),
            Some(LeapPhase::Ready { .. })
        ));
        assert!(!holding.moved.contains_key(&ids[0]));
    }

    #[test]
    fn disconnected_target_is_released() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 20.0));
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);
        fixture.players.remove(player);
        fixture.tick(200);
        for id in ids {
            assert!(!fixture.controller.get(id).expect("creature").is_angry());
        }
    }

    #[test]
    fn chase_closes_distance_without_overshooting() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 25.0));
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);
        fixture.place(ids[0], Vec3::planar(20.0, 20.0));

        fixture.tick(200);
        let creature = fixture.controller.get(ids[0]).expect("creature");
        assert!((creature.position.z - 20.44).abs() < 1e-9);
        assert!(creature.facing.abs() < 1e-9);
    }

    #[test]
    fn melee_attack_respects_cooldown() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 21.0));
        for id in &ids {
            fixture.place(*id, Vec3::planar(60.0, 60.0));
        }
        fixture.place(ids[0], Vec3::planar(20.0, 20.0));
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);
        fixture.outbox.drain();

        fixture.tick(1_000);
        assert_eq!(fixture.players.get(player).expect("player").hp, 90);
        fixture.tick(2_000);
        assert_eq!(fixture.players.get(player).expect("player").hp, 90);
        fixture.tick(3_000);
        assert_eq!(fixture.players.get(player).expect("player").hp, 80);

        let cues = fixture
            .outbox
            .drain()
            .into_iter()
            .filter(|out| matches!(out.event, ServerEvent::CreatureAttackCue { .. }))
            .count();
        assert_eq!(cues, 2);
    }

    #[test]
    fn lethal_attack_reports_death_once() {
        let mut fixture = Fixture::new(CreatureKind::Dog);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 21.0));
        for id in &ids {
            fixture.place(*id, Vec3::planar(20.0, 20.0));
        }
        fixture.players.get_mut(player).expect("player").hp = 5;
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);

        let pass = fixture.tick(1_000);
        assert_eq!(pass.deaths, vec![player]);
        assert_eq!(fixture.players.get(player).expect("player").hp, 0);
        let attackers = fixture
            .controller
            .iter()
            .filter(|creature| creature.last_attack.is_some())
            .count();
        assert_eq!(attackers, 1);
    }

    #[test]
    fn bear_leap_runs_ready_leap_recovery() {
        let mut fixture = Fixture::new(CreatureKind::Bear);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 23.5));
        for id in &ids {
            fixture.place(*id, Vec3::planar(60.0, 60.0));
        }
        fixture.place(ids[0], Vec3::planar(20.0, 20.0));
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);
        let bear = ids[0];

        fixture.tick(1_000);
        assert_eq!(
            fixture.controller.get(bear).expect("bear").leap(),
            Some(LeapPhase::Ready { since: Millis(1_000) })
        );
        fixture.tick(1_200);
        assert!(matches!(
            fixture.controller.get(bear).expect("bear").leap(),
            Some(LeapPhase::Ready { .. })
        ));
        fixture.tick(1_600);
        assert_eq!(
            fixture.controller.get(bear).expect("bear").leap(),
            Some(LeapPhase::Leap { since: Millis(1_600) })
        );

        fixture.tick(2_000);
        let airborne = fixture.controller.get(bear).expect("bear");
        assert!(airborne.position.y > 1.0);
        assert!(airborne.position.z > 20.0);

        fixture.tick(2_200);
        assert!(matches!(
            fixture.controller.get(bear).expect("bear").leap(),
            Some(LeapPhase::Leap { .. })
        ));

        // Reaching melee range ends the leap.
        fixture.tick(2_400);
        let landed = fixture.controller.get(bear).expect("bear");
        assert_eq!(landed.position.y, 0.0);
        assert!(landed.position.planar_distance(Vec3::planar(20.0, 23.5)) >= 2.0 - 1e-9);
    }

    #[test]
    fn bear_beyond_trigger_radius_just_chases() {
        let mut fixture = Fixture::new(CreatureKind::Bear);
        let ids = fixture.spawn(Vec3::planar(20.0, 20.0));
        let player = fixture.add_player(1, Vec3::planar(20.0, 30.0));
        fixture.place(ids[0], Vec3::planar(20.0, 20.0));
        fixture.controller.provoke(TribeId(0), player, &mut fixture.outbox);
        fixture.tick(1_000);
        let bear = fixture.controller.get(ids[0]).expect("bear");
        assert_eq!(bear.leap(), None);
        assert!(bear.position.z > 20.0);
    }

    #[test]
    fn tribe_center_avoids_river() {
        let data = GameData::builtin().expect("builtin data");
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            if let Some(center) = pick_tribe_center(&data.rules, &mut rng) {
                assert!(!in_river(center));
                let distance = center.planar_distance(data.rules.origin);
                assert!((15.0..=40.0).contains(&distance), "distance {}", distance);
            }
        }
    }
}
