use crate::entities::player::PlayerId;
use crate::world::position::Vec3;
use crate::world::time::Millis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TribeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatureKind {
    /// Light pack hunter.
    Dog,
    /// Heavy solitary charger with the leap attack.
    Bear,
}

impl CreatureKind {
    pub const ALL: [CreatureKind; 2] = [CreatureKind::Dog, CreatureKind::Bear];

    pub fn name(self) -> &'static str {
        match self {
            CreatureKind::Dog => "dog",
            CreatureKind::Bear => "bear",
        }
    }
}

/// Telegraphed leap sequence of the heavy kind. Each phase records when it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeapPhase {
    Ready { since: Millis },
    Leap { since: Millis },
    Recovery { since: Millis },
}

impl LeapPhase {
    pub fn name(self) -> &'static str {
        match self {
            LeapPhase::Ready { .. } => "ready",
            LeapPhase::Leap { .. } => "leap",
            LeapPhase::Recovery { .. } => "recovery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreatureState {
    Idle,
    Wander { destination: Vec3 },
    Angry { target: PlayerId, leap: Option<LeapPhase> },
}

impl CreatureState {
    pub fn name(&self) -> &'static str {
        match self {
            CreatureState::Idle => "idle",
            CreatureState::Wander { .. } => "wander",
            CreatureState::Angry { .. } => "angry",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    pub id: CreatureId,
    pub kind: CreatureKind,
    pub tribe: TribeId,
    pub position: Vec3,
    pub facing: f64,
    pub hp: u32,
    pub max_hp: u32,
    pub state: CreatureState,
    /// Tribe spawn centre. Never moves.
    pub anchor: Vec3,
    pub next_wander_at: Millis,
    pub last_attack: Option<Millis>,
}

impl Creature {
    pub fn target(&self) -> Option<PlayerId> {
        match self.state {
            CreatureState::Angry { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn is_angry(&self) -> bool {
        matches!(self.state, CreatureState::Angry { .. })
    }

    pub fn leap(&self) -> Option<LeapPhase> {
        match self.state {
            CreatureState::Angry { leap, .. } => leap,
            _ => None,
        }
    }

    /// Marks the creature hostile toward `target`. Returns false when it already was.
    pub fn provoke(&mut self, target: PlayerId) -> bool {
        if self.target() == Some(target) {
            return false;
        }
        self.state = CreatureState::Angry { target, leap: None };
        true
    }

    /// Drops any target and returns to idle, landing if mid-leap.
    pub fn calm(&mut self) {
        self.state = CreatureState::Idle;
        self.position = self.position.grounded();
    }

    pub fn attack_ready(&self, now: Millis, cooldown_ms: u64) -> bool {
        self.last_attack
            .map_or(true, |last| now.since(last) >= cooldown_ms)
    }

    pub fn view(&self) -> CreatureView {
        let wander_target = match self.state {
            CreatureState::Wander { destination } => Some(destination),
            _ => None,
        };
        CreatureView {
            id: self.id,
            kind: self.kind,
            tribe_id: self.tribe,
            position: self.position,
            rotation: self.facing,
            hp: self.hp,
            max_hp: self.max_hp,
            state: self.state.name(),
            target: self.target(),
            wander_target,
            leap_phase: self.leap().map(LeapPhase::name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureView {
    pub id: CreatureId,
    pub kind: CreatureKind,
    pub tribe_id: TribeId,
    pub position: Vec3,
    pub rotation: f64,
    pub hp: u32,
    pub max_hp: u32,
    pub state: &'static str,
    pub target: Option<PlayerId>,
    pub wander_target: Option<Vec3>,
    pub leap_phase: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creature() -> Creature {
        Creature {
            id: CreatureId(1),
            kind: CreatureKind::Dog,
            tribe: TribeId(0),
            position: Vec3::planar(1.0, 2.0),
            facing: 0.0,
            hp: 100,
            max_hp: 100,
            state: CreatureState::Idle,
            anchor: Vec3::planar(1.0, 2.0),
            next_wander_at: Millis(0),
            last_attack: None,
        }
    }

    #[test]
    fn provoke_is_idempotent_per_target() {
        let mut creature = creature();
        assert!(creature.provoke(PlayerId(7)));
        assert!(!creature.provoke(PlayerId(7)));
        assert!(creature.provoke(PlayerId(8)));
        assert_eq!(creature.target(), Some(PlayerId(8)));
    }

    #[test]
    fn calm_clears_target_and_lands() {
        let mut creature = creature();
        creature.position.y = 1.2;
        creature.state = CreatureState::Angry {
            target: PlayerId(1),
            leap: Some(LeapPhase::Leap { since: Millis(0) }),
        };
        creature.calm();
        assert_eq!(creature.state, CreatureState::Idle);
        assert_eq!(creature.target(), None);
        assert_eq!(creature.position.y, 0.0);
    }

    #[test]
    fn attack_cooldown_measured_from_last_attack() {
        let mut creature = creature();
        assert!(creature.attack_ready(Millis(0), 2_000));
        creature.last_attack = Some(Millis(1_000));
        assert!(!creature.attack_ready(Millis(2_999), 2_000));
        assert!(creature.attack_ready(Millis(3_000), 2_000));
    }

    #[test]
    fn view_reports_wire_names() {
        let mut creature = creature();
        creature.state = CreatureState::Angry {
            target: PlayerId(3),
            leap: Some(LeapPhase::Ready { since: Millis(10) }),
        };
        let view = creature.view();
        assert_eq!(view.state, "angry");
        assert_eq!(view.target, Some(PlayerId(3)));
        assert_eq!(view.leap_phase, Some("ready"));
        assert_eq!(view.wander_target, None);
    }
}
