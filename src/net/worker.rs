use crate::entities::player::PlayerId;
use crate::net::protocol::encode_event;
use crate::net::server::ServerControl;
use crate::telemetry::logging;
use crate::world::events::{Intent, Outgoing};
use crate::world::state::World;
use crate::world::time::{TickSchedule, WorldClock};
use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CONTROL_POLL: Duration = Duration::from_millis(50);
const NETLOAD_INTERVAL: Duration = Duration::from_secs(60);

/// Everything that may mutate the world, funnelled to its single owner.
#[derive(Debug)]
pub enum WorldCommand {
    Connect {
        outbound: Sender<Arc<str>>,
        reply: Sender<PlayerId>,
    },
    Intent {
        player: PlayerId,
        intent: Intent,
    },
    Disconnect {
        player: PlayerId,
    },
}

/// Owns the `World` and applies commands and ticks strictly one at a time.
pub struct WorldWorker {
    world: World,
    clock: WorldClock,
    schedule: TickSchedule,
    sessions: BTreeMap<PlayerId, Sender<Arc<str>>>,
    ticks: u64,
    netload_every: u64,
}

impl WorldWorker {
    pub fn new(world: World, tick_period: Duration, now: Instant) -> Self {
        let schedule = TickSchedule::new(tick_period, now);
        let period_ms = schedule.period().as_millis().max(1);
        let netload_every = (NETLOAD_INTERVAL.as_millis() / period_ms).max(1) as u64;
        Self {
            world,
            clock: WorldClock::start(now),
            schedule,
            sessions: BTreeMap::new(),
            ticks: 0,
            netload_every,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn run(mut self, commands: Receiver<WorldCommand>, control: Arc<ServerControl>) {
        while control.is_running() {
            if !self.step(&commands, Instant::now()) {
                break;
            }
        }
        logging::log_game("world worker stopped");
    }

    /// Runs a due tick and then at most one pending command, so overrunning
    /// ticks still leave room for intents. Otherwise waits for a command until
    /// the next deadline. Returns false once every sender is gone.
    fn step(&mut self, commands: &Receiver<WorldCommand>, now: Instant) -> bool {
        if self.schedule.due(now) {
            self.run_tick(now);
            return match commands.try_recv() {
                Ok(command) => {
                    self.handle(command, Instant::now());
                    true
                }
                Err(TryRecvError::Empty) => true,
                Err(TryRecvError::Disconnected) => false,
            };
        }
        let wait = self.schedule.time_until_due(now).min(CONTROL_POLL);
        match commands.recv_timeout(wait) {
            Ok(command) => {
                self.handle(command, Instant::now());
                true
            }
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn handle(&mut self, command: WorldCommand, now: Instant) {
        match command {
            WorldCommand::Connect { outbound, reply } => {
                let id = self.world.connect_player();
                self.sessions.insert(id, outbound);
                if reply.send(id).is_err() {
                    self.sessions.remove(&id);
                    self.world.disconnect_player(id);
                }
            }
            WorldCommand::Intent { player, intent } => {
                let at = self.clock.at(now);
                // Rejections are silent apart from notices the world already queued.
                let _ = self.world.apply_intent(player, intent, at);
            }
            WorldCommand::Disconnect { player } => {
                self.sessions.remove(&player);
                self.world.disconnect_player(player);
            }
        }
        self.flush();
    }

    fn run_tick(&mut self, started: Instant) {
        let at = self.clock.at(started);
        self.world.tick(at);
        self.flush();
        let finished = Instant::now();
        if self.schedule.overran(started, finished) {
            logging::log_lag(&format!(
                "tick at {} ms took {} ms (period {} ms)",
                at.0,
                finished.saturating_duration_since(started).as_millis(),
                self.schedule.period().as_millis()
            ));
        }
        self.schedule.mark_ran(started);
        self.ticks += 1;
        if self.ticks % self.netload_every == 0 {
            logging::log_netload(&format!(
                "sessions={} creatures={} items={}",
                self.sessions.len(),
                self.world.creature_count(),
                self.world.items().count()
            ));
        }
    }

    /// Routes queued events to their audiences. Each event is encoded once.
    fn flush(&mut self) {
        for Outgoing { audience, event } in self.world.drain_events() {
            let encoded: Arc<str> = match encode_event(&event) {
                Ok(encoded) => Arc::from(encoded),
                Err(err) => {
                    logging::log_error(&err);
                    continue;
                }
            };
            for (id, outbound) in &self.sessions {
                if audience.includes(*id) {
                    // A closed queue means the writer is gone; its reader reports the disconnect.
                    let _ = outbound.send(Arc::clone(&encoded));
                }
            }
        }
    }
}
