//! Headless Client Example
//!
//! Drives a `ClientSession` against an in-process server over a link with
//! fixed latency and periodic packet loss. Halfway through, the server nudges
//! the ship to force a correction.
//!
//! Run with `RUST_LOG=shipsync_netcode=debug` to see every reconciliation
//! decision. Pass a RON file path to override the session config.

use indexmap::IndexMap;
use shipsync_core::{
    DeltaSnapshot, InboundUpdate, InputUpdatePacket, NetInputControls, ObjectId, ObjectUpdate,
    PlayerAuthState, Quat, RawControls, Snapshot, SyncConfig, Tick, Vec3,
};
use shipsync_netcode::{ClientSession, LoopbackLink, ObjectTable, ShipBody, SimpleShip};
use std::collections::{BTreeMap, VecDeque};
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAMES: u32 = 1200;
const LATENCY_FRAMES: u32 = 4;
const CLIENT_LEAD_TICKS: Tick = 6;
const SERVER_HISTORY: usize = 64;
const NUDGE_TICK: Tick = 600;
const REMOTE_SHIP: ObjectId = ObjectId(7);

/// Authoritative side: one tick per frame, one client input per tick
struct FakeServer {
    tick: Tick,
    dt: f32,
    ship: SimpleShip,
    queued: BTreeMap<Tick, NetInputControls>,
    newest_input: Tick,
    controls: RawControls,
    client_ack: Tick,
    history: IndexMap<Tick, Snapshot>,
}

impl FakeServer {
    fn new(config: &SyncConfig) -> Self {
        Self {
            tick: 0,
            dt: config.tick_seconds(),
            ship: SimpleShip::default(),
            queued: BTreeMap::new(),
            newest_input: 0,
            controls: RawControls::default(),
            client_ack: 0,
            history: IndexMap::new(),
        }
    }

    fn receive(&mut self, packet: &InputUpdatePacket) {
        for input in packet.inputs_after(self.tick) {
            self.newest_input = self.newest_input.max(input.tick);
            self.queued.insert(input.tick, input);
        }
        self.client_ack = packet.ack_tick();
    }

    fn step(&mut self) -> InboundUpdate {
        self.tick += 1;

        // Late or lost input: keep flying on the previous controls
        if let Some(input) = self.queued.remove(&self.tick) {
            self.controls = input.controls();
        }
        self.queued.retain(|&tick, _| tick > self.tick);

        self.ship.advance_physics_step(self.dt, &self.controls);
        if self.tick == NUDGE_TICK {
            let mut pose = self.ship.pose();
            pose.position.x += 3.0;
            self.ship.set_pose(pose);
        }

        let pose = self.ship.pose();
        let cruise = self.ship.cruise();
        let snapshot = Snapshot {
            tick: self.tick,
            input_sequence: self.newest_input,
            player: PlayerAuthState {
                position: pose.position,
                orientation: pose.orientation,
                linear_velocity: self.ship.linear_velocity(),
                angular_velocity: self.ship.angular_velocity(),
                health: 1.0,
                shield: 0.8,
                cruise_charge_pct: cruise.charge_pct,
                cruise_accel_pct: cruise.accel_pct,
            },
            updates: vec![orbiting_ship(self.tick, self.dt)],
        };

        let update: InboundUpdate = match self.history.get(&self.client_ack) {
            Some(baseline) => DeltaSnapshot::diff(self.client_ack, baseline, &snapshot).into(),
            None => snapshot.clone().into(),
        };

        self.history.insert(self.tick, snapshot);
        if self.history.len() > SERVER_HISTORY {
            self.history.shift_remove_index(0);
        }
        update
    }
}

fn orbiting_ship(tick: Tick, dt: f32) -> ObjectUpdate {
    let angle = tick as f32 * dt * 0.2;
    ObjectUpdate {
        position: Vec3::new(angle.cos() * 500.0, 0.0, angle.sin() * 500.0),
        orientation: Quat::from_rotation_y(-angle),
        linear_velocity: Vec3::new(-angle.sin() * 100.0, 0.0, angle.cos() * 100.0),
        hull: 1.0,
        shield: 1.0,
        throttle: 1.0,
        ..ObjectUpdate::blank(REMOTE_SHIP)
    }
}

fn pilot(tick: Tick) -> RawControls {
    RawControls {
        throttle: 1.0,
        steering: Vec3::new(0.0, (tick as f32 * 0.01).sin() * 0.2, 0.0),
        ..Default::default()
    }
}

/// Packets in flight, released after a fixed delay
struct Delayed<T> {
    queue: VecDeque<(u32, T)>,
}

impl<T> Delayed<T> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    fn send(&mut self, frame: u32, item: T) {
        self.queue.push_back((frame + LATENCY_FRAMES, item));
    }

    fn arrived(&mut self, frame: u32) -> Vec<T> {
        let mut out = Vec::new();
        while self.queue.front().is_some_and(|(due, _)| *due <= frame) {
            if let Some((_, item)) = self.queue.pop_front() {
                out.push(item);
            }
        }
        out
    }
}

fn main() -> shipsync_netcode::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SyncConfig::load_file(path)?,
        None => SyncConfig::default(),
    };
    info!(tick_rate = config.tick_rate, "Starting headless client");

    let mut server = FakeServer::new(&config);
    let mut session = ClientSession::new(config.clone())?;
    let mut ship = SimpleShip::default();
    let mut world = ObjectTable::new();
    let mut link = LoopbackLink::new();
    world.spawn(REMOTE_SHIP);

    session.set_world_tick(CLIENT_LEAD_TICKS);
    session.begin_update_processing();

    let mut to_server = Delayed::new();
    let mut to_client = Delayed::new();
    let mut dropped_inputs = 0;
    let mut dropped_snapshots = 0;

    for frame in 0..FRAMES {
        // Uneven frame pacing around 60fps
        let elapsed = if frame % 2 == 0 { 0.0150 } else { 0.0185 };
        for _ in 0..session.ticks_due(elapsed) {
            let controls = pilot(session.world_tick() + 1);
            session.step(&mut ship, &mut world, &mut link, controls, Some(REMOTE_SHIP));
        }

        for packet in link.take_sent() {
            // Bursts of three drops, covered by input redundancy
            if (2..=4).contains(&(frame % 29)) {
                dropped_inputs += 1;
                continue;
            }
            to_server.send(frame, packet);
        }
        for packet in to_server.arrived(frame) {
            server.receive(&packet);
        }

        let update = server.step();
        if frame % 13 == 0 {
            dropped_snapshots += 1;
        } else {
            to_client.send(frame, update);
        }
        for update in to_client.arrived(frame) {
            link.deliver(update);
        }

        if frame % 120 == 0 {
            let stats = session.stats();
            info!(
                frame,
                tick = stats.world_tick,
                ack = stats.ack_tick,
                offset = stats.clock.average_offset,
                interval = stats.clock.adjusted_interval,
                "Client status"
            );
        }
    }

    let stats = session.stats();
    let rendered = session.render_pose(&ship);
    info!(
        world_tick = stats.world_tick,
        server_tick = server.tick,
        corrections = stats.corrections,
        time_warps = stats.clock.time_warps,
        dropped_inputs = stats.clock.dropped_inputs,
        missing_baselines = stats.missing_baselines,
        cached_snapshots = stats.cached_snapshots,
        "Session finished"
    );
    info!(
        lost_input_packets = dropped_inputs,
        lost_snapshots = dropped_snapshots,
        remote_ships = world.len(),
        x = rendered.position.x,
        y = rendered.position.y,
        z = rendered.position.z,
        "Link summary"
    );

    Ok(())
}
