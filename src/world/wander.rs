use crate::world::area::in_house;
use crate::world::position::Vec3;
use crate::world::time::Millis;
use rand::Rng;
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub struct WanderParams {
    pub radius: f64,
    pub speed: f64,
    pub body_radius: f64,
    pub arrival: f64,
    pub pause_min_ms: u64,
    pub pause_max_ms: u64,
    pub blocked_retry_ms: u64,
}

/// Mutable view of whatever is wandering: a creature or the trader.
pub struct Wanderer<'a> {
    pub position: &'a mut Vec3,
    pub facing: &'a mut f64,
    pub destination: &'a mut Option<Vec3>,
    pub next_wander_at: &'a mut Millis,
    pub anchor: Vec3,
}

/// One wander step. Destinations are sampled around the anchor, never the current
/// position, so repeated wandering cannot drift. Returns true if anything changed.
pub fn advance<R: Rng>(wanderer: Wanderer<'_>, params: &WanderParams, now: Millis, rng: &mut R) -> bool {
    let Some(destination) = *wanderer.destination else {
        if now < *wanderer.next_wander_at {
            return false;
        }
        *wanderer.destination = Some(sample_destination(wanderer.anchor, params.radius, rng));
        return true;
    };

    let position = *wanderer.position;
    if position.planar_distance(destination) < params.arrival {
        *wanderer.destination = None;
        *wanderer.next_wander_at = now.plus(pause(params, rng));
        return true;
    }

    let next = position.step_toward(destination, params.speed);
    if in_house(next, params.body_radius) {
        *wanderer.destination = None;
        *wanderer.next_wander_at = now.plus(params.blocked_retry_ms);
        return true;
    }
    *wanderer.facing = position.heading_to(destination);
    *wanderer.position = next;
    true
}

pub fn sample_destination<R: Rng>(anchor: Vec3, radius: f64, rng: &mut R) -> Vec3 {
    let angle = rng.random::<f64>() * TAU;
    let distance = rng.random::<f64>() * radius;
    anchor.offset_polar(angle, distance).grounded()
}

fn pause<R: Rng>(params: &WanderParams, rng: &mut R) -> u64 {
    if params.pause_max_ms <= params.pause_min_ms {
        return params.pause_min_ms;
    }
    rng.random_range(params.pause_min_ms..=params.pause_max_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params() -> WanderParams {
        WanderParams {
            radius: 5.0,
            speed: 0.1,
            body_radius: 0.5,
            arrival: 0.2,
            pause_min_ms: 2_000,
            pause_max_ms: 5_000,
            blocked_retry_ms: 1_000,
        }
    }

    struct Subject {
        position: Vec3,
        facing: f64,
        destination: Option<Vec3>,
        next_wander_at: Millis,
        anchor: Vec3,
    }

    impl Subject {
        fn at(position: Vec3) -> Self {
            Self {
                position,
                facing: 0.0,
                destination: None,
                next_wander_at: Millis(0),
                anchor: position,
            }
        }

        fn step(&mut self, now: Millis, rng: &mut StdRng) -> bool {
            advance(
                Wanderer {
                    position: &mut self.position,
                    facing: &mut self.facing,
                    destination: &mut self.destination,
                    next_wander_at: &mut self.next_wander_at,
                    anchor: self.anchor,
                },
                &params(),
                now,
                rng,
            )
        }
    }

    #[test]
    fn waits_until_eligible() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut subject = Subject::at(Vec3::planar(10.0, 10.0));
        subject.next_wander_at = Millis(1_000);
        assert!(!subject.step(Millis(999), &mut rng));
        assert!(subject.destination.is_none());
        assert!(subject.step(Millis(1_000), &mut rng));
        assert!(subject.destination.is_some());
    }

    #[test]
    fn destinations_stay_within_anchor_radius() {
        let mut rng = StdRng::seed_from_u64(2);
        let anchor = Vec3::planar(10.0, 10.0);
        for _ in 0..1_000 {
            let destination = sample_destination(anchor, 5.0, &mut rng);
            assert!(anchor.planar_distance(destination) <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn samples_from_anchor_not_current_position() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut subject = Subject::at(Vec3::planar(10.0, 10.0));
        subject.position = Vec3::planar(30.0, 30.0);
        subject.step(Millis(0), &mut rng);
        let destination = subject.destination.expect("destination");
        assert!(subject.anchor.planar_distance(destination) <= 5.0 + 1e-9);
    }

    #[test]
    fn arrival_clears_destination_and_pauses() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut subject = Subject::at(Vec3::planar(10.0, 10.0));
        subject.destination = Some(Vec3::planar(10.1, 10.0));
        assert!(subject.step(Millis(5_000), &mut rng));
        assert!(subject.destination.is_none());
        let pause = subject.next_wander_at.since(Millis(5_000));
        assert!((2_000..=5_000).contains(&pause), "pause {}", pause);
    }

    #[test]
    fn steps_toward_destination_at_fixed_speed() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut subject = Subject::at(Vec3::planar(10.0, 10.0));
        subject.destination = Some(Vec3::planar(10.0, 12.0));
        assert!(subject.step(Millis(0), &mut rng));
        assert!((subject.position.z - 10.1).abs() < 1e-9);
        assert!(subject.facing.abs() < 1e-9);
    }

    #[test]
    fn house_blocks_step_and_retries_later() {
        let mut rng = StdRng::seed_from_u64(6);
        let start = Vec3::planar(-35.0 + 3.5 + 0.55, 25.0);
        let mut subject = Subject::at(start);
        subject.destination = Some(Vec3::planar(-35.0, 25.0));
        assert!(subject.step(Millis(100), &mut rng));
        assert_eq!(subject.position, start);
        assert!(subject.destination.is_none());
        assert_eq!(subject.next_wander_at, Millis(1_100));
    }
}
