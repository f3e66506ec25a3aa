//! Client session: the per-tick control flow
//!
//! A [`ClientSession`] owns every piece of per-connection state: the move
//! history, the snapshot cache, the clock controller and the reconciler.
//! Dropping the session on disconnect discards all of it.
//!
//! Each call to [`ClientSession::step`] runs one simulation tick:
//!
//! 1. Advance the local tick, decay smoothing and run the full physics step
//! 2. Record the move and send an input packet with redundant history
//! 3. Drain received snapshots and decode them against the cache
//! 4. Apply each snapshot, reconciling the pose only on the last one
//! 5. Feed the last snapshot to the clock controller

use crate::{
    ClockAdjustment, ClockStats, ClockSyncController, Error, InputRecorder, PacketLink,
    ReconcileOutcome, Reconciler, RemoteWorld, Result, ShipBody, SnapshotCache,
};
use serde::{Deserialize, Serialize};
use shipsync_core::{
    FixedStepScheduler, InboundUpdate, ObjectId, Pose, RawControls, Snapshot, SyncConfig, Tick,
};
use tracing::{error, info, warn};

/// What one call to [`ClientSession::step`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Local tick after the step
    pub tick: Tick,
    /// Whether an input packet went out
    pub sent: bool,
    /// Snapshots decoded this step
    pub decoded: usize,
    /// Snapshots dropped for a missing baseline
    pub missing_baselines: usize,
    /// Reconciliation result for the last decoded snapshot
    pub outcome: Option<ReconcileOutcome>,
    /// Clock adjustment from the last decoded snapshot
    pub clock: Option<ClockAdjustment>,
}

/// Session diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub world_tick: Tick,
    pub ack_tick: Tick,
    pub clock: ClockStats,
    pub corrections: u64,
    pub missing_baselines: u64,
    pub send_failures: u64,
    /// Snapshots queued on the link at the start of the last step
    pub pending_updates: usize,
    pub cached_snapshots: usize,
    pub recorded_moves: usize,
}

/// Client side of a connection to the authoritative server
#[derive(Debug, Clone)]
pub struct ClientSession {
    config: SyncConfig,
    world_tick: Tick,
    recorder: InputRecorder,
    cache: SnapshotCache,
    clock: ClockSyncController,
    reconciler: Reconciler,
    scheduler: FixedStepScheduler,
    processing_updates: bool,
    paused: bool,
    missing_baselines: u64,
    send_failures: u64,
    pending_updates: usize,
}

impl ClientSession {
    /// Create a session, validating the config
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            world_tick: 0,
            recorder: InputRecorder::new(config.move_history_capacity),
            cache: SnapshotCache::new(config.snapshot_cache_capacity),
            clock: ClockSyncController::new(&config),
            reconciler: Reconciler::new(&config),
            scheduler: FixedStepScheduler::new(config.tick_rate),
            processing_updates: false,
            paused: false,
            missing_baselines: 0,
            send_failures: 0,
            pending_updates: 0,
            config,
        })
    }

    /// Current local tick
    pub fn world_tick(&self) -> Tick {
        self.world_tick
    }

    /// Set the local tick, e.g. from the server's spawn tick plus latency
    pub fn set_world_tick(&mut self, tick: Tick) {
        self.world_tick = tick;
    }

    /// Advance the local tick by the time spent loading
    ///
    /// Returns the number of ticks skipped.
    pub fn catch_up(&mut self, elapsed_seconds: f64) -> u32 {
        let tick_seconds = f64::from(self.config.tick_seconds());
        let ticks = (elapsed_seconds.max(0.0) / tick_seconds).floor() as u32;
        self.world_tick = self.world_tick.wrapping_add(ticks);
        info!(ticks, world_tick = self.world_tick, "Ticks elapsed after load");
        ticks
    }

    /// Start accepting snapshots
    ///
    /// Moves predicted before this point were never seen by the server, so
    /// the history starts over.
    pub fn begin_update_processing(&mut self) {
        self.processing_updates = true;
        self.recorder.clear_moves();
    }

    /// Check if snapshots are being processed
    pub fn is_processing_updates(&self) -> bool {
        self.processing_updates
    }

    /// Pause or resume prediction
    ///
    /// While paused the tick still advances and any correction smoothing
    /// keeps decaying, but nothing is recorded, sent or reconciled.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Check if the session is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of ticks to simulate for `elapsed_seconds` of frame time
    ///
    /// Uses the clock controller's current playback interval.
    pub fn ticks_due(&mut self, elapsed_seconds: f64) -> u32 {
        self.scheduler
            .advance(elapsed_seconds, self.clock.adjusted_interval())
    }

    /// Current playback interval
    pub fn adjusted_interval(&self) -> f64 {
        self.clock.adjusted_interval()
    }

    /// Run one simulation tick
    pub fn step<B, W, L>(
        &mut self,
        body: &mut B,
        world: &mut W,
        link: &mut L,
        controls: RawControls,
        selected: Option<ObjectId>,
    ) -> StepReport
    where
        B: ShipBody + ?Sized,
        W: RemoteWorld + ?Sized,
        L: PacketLink + ?Sized,
    {
        self.world_tick = self.world_tick.wrapping_add(1);
        let mut report = StepReport {
            tick: self.world_tick,
            ..Default::default()
        };
        self.reconciler.decay_smoothing();
        if self.paused {
            return report;
        }

        let pose = body.advance_physics_step(self.config.tick_seconds(), &controls);
        self.recorder.record_tick(self.world_tick, pose, controls);

        if let Some(packet) = self.recorder.build_outbound_packet(selected) {
            match link.send_input(packet) {
                Ok(()) => report.sent = true,
                Err(err) => {
                    self.send_failures += 1;
                    warn!(tick = self.world_tick, error = %err, "Failed to send input");
                }
            }
        }

        self.pending_updates = link.pending_updates();
        let mut snapshots = Vec::new();
        while let Some(update) = link.recv_update() {
            if !self.processing_updates {
                continue;
            }
            match self.decode(update) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(_) => report.missing_baselines += 1,
            }
        }
        report.decoded = snapshots.len();

        let last = snapshots.len().saturating_sub(1);
        for (i, snapshot) in snapshots.iter().enumerate() {
            let outcome = self.reconciler.apply_authoritative(
                snapshot,
                i == last,
                &mut self.recorder,
                body,
                world,
            );
            if i == last {
                report.outcome = Some(outcome);
            }
        }

        if let Some(newest) = snapshots.last() {
            let adjustment = self.clock.update(newest);
            self.world_tick = self.world_tick.wrapping_add(adjustment.warp_ticks);
            report.clock = Some(adjustment);
        }

        report.tick = self.world_tick;
        report
    }

    /// Decode one update, acknowledging it or resetting acks on failure
    fn decode(&mut self, update: InboundUpdate) -> Result<Snapshot> {
        match self.cache.decode(update) {
            Ok(snapshot) => {
                self.recorder.acknowledge(snapshot.tick);
                Ok(snapshot)
            }
            Err(err) => {
                if let Error::MissingBaseline { tick, old_tick } = &err {
                    error!(tick, old_tick, "Unable to find old tick, resetting ack");
                }
                self.recorder.reset_acks();
                self.missing_baselines += 1;
                Err(err)
            }
        }
    }

    /// Pose to draw for the body, with correction smoothing applied
    pub fn render_pose<B: ShipBody + ?Sized>(&self, body: &B) -> Pose {
        self.reconciler.smoothing().render_pose(body.pose())
    }

    /// Move history and ack window
    pub fn recorder(&self) -> &InputRecorder {
        &self.recorder
    }

    /// Decoded snapshot cache
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Clock controller
    pub fn clock(&self) -> &ClockSyncController {
        &self.clock
    }

    /// Reconciler
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Session config
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            world_tick: self.world_tick,
            ack_tick: self.recorder.ack_tick(),
            clock: self.clock.stats(),
            corrections: self.reconciler.corrections(),
            missing_baselines: self.missing_baselines,
            send_failures: self.send_failures,
            pending_updates: self.pending_updates,
            cached_snapshots: self.cache.len(),
            recorded_moves: self.recorder.len(),
        }
    }
}
