//! Server state reconciliation
//!
//! Compares the pose predicted for a tick against the authoritative pose for
//! the same tick. When they diverge past tolerance, the recorded move is
//! snapped to the server's pose and every later move is replayed through
//! kinematic integration, rebuilding the predicted trajectory:
//!
//! ```text
//!  history:  ... [995] [996] [997] [998] [999] [1000]
//!                  ▲     │     │     │     │     │
//!        snap ─────┘     └─────┴─────┴─────┴─────┴──▶ replay controls
//! ```
//!
//! Only the last snapshot of a frame is reconciled, so a burst of late
//! packets cannot stack several corrections in one frame.

use crate::{InputRecorder, RemoteWorld, ShipBody, SmoothingOffset};
use serde::{Deserialize, Serialize};
use shipsync_core::{Snapshot, SyncConfig, Tick};
use tracing::{debug, info};

/// What reconciling one snapshot did to the local player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// Not the last snapshot of the frame; only remote state was applied
    Deferred,
    /// The predicted move for the snapshot's tick is no longer buffered
    HistoryEvicted,
    /// Prediction was close enough and was kept
    WithinTolerance {
        position_error: f32,
        orientation_error: f32,
    },
    /// Prediction was snapped to the server and replayed
    Corrected {
        position_error: f32,
        orientation_error: f32,
        /// Moves replayed after the corrected one
        replayed: usize,
    },
}

impl ReconcileOutcome {
    /// Check if the live body was moved
    pub fn is_correction(&self) -> bool {
        matches!(self, ReconcileOutcome::Corrected { .. })
    }
}

/// Applies authoritative snapshots to the local simulation
#[derive(Debug, Clone)]
pub struct Reconciler {
    position_tolerance: f32,
    orientation_tolerance: f32,
    teleport_speed_fraction: f32,
    tick_seconds: f32,
    /// Render offset left by the last correction
    smoothing: SmoothingOffset,
    corrections: u64,
    last_server_tick: Tick,
}

impl Reconciler {
    /// Create a reconciler from session config
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            position_tolerance: config.position_tolerance,
            orientation_tolerance: config.orientation_tolerance,
            teleport_speed_fraction: config.teleport_speed_fraction,
            tick_seconds: config.tick_seconds(),
            smoothing: SmoothingOffset::new(config),
            corrections: 0,
            last_server_tick: 0,
        }
    }

    /// Apply one decoded snapshot
    ///
    /// Remote objects and the player's vitals are always applied. The
    /// player's pose is only reconciled when `is_last` is set.
    pub fn apply_authoritative<B, W>(
        &mut self,
        snapshot: &Snapshot,
        is_last: bool,
        recorder: &mut InputRecorder,
        body: &mut B,
        world: &mut W,
    ) -> ReconcileOutcome
    where
        B: ShipBody + ?Sized,
        W: RemoteWorld + ?Sized,
    {
        for update in &snapshot.updates {
            world.apply_object_update(update);
        }
        world.set_player_vitals(snapshot.player.health, snapshot.player.shield);
        self.last_server_tick = snapshot.tick;

        if !is_last {
            return ReconcileOutcome::Deferred;
        }

        let Some(index) = recorder.find_tick(snapshot.tick) else {
            debug!(tick = snapshot.tick, "Predicted move evicted, skipping reconciliation");
            return ReconcileOutcome::HistoryEvicted;
        };

        let moves = recorder.moves_mut();
        let len = moves.len();
        let authoritative = snapshot.player.pose();
        let predicted = moves[index].pose;
        let position_error = authoritative.position_error(&predicted);
        let orientation_error = authoritative.orientation_error(&predicted);

        if position_error <= self.position_tolerance
            && orientation_error <= self.orientation_tolerance
        {
            let cruise = snapshot.player.cruise();
            if cruise.is_active() {
                let elapsed = self.tick_seconds * (len - index) as f32;
                body.resync_cruise(cruise, elapsed);
            }
            return ReconcileOutcome::WithinTolerance {
                position_error,
                orientation_error,
            };
        }

        info!(
            tick = snapshot.tick,
            position_error, orientation_error, "Applying correction"
        );

        let before = body.pose();
        moves[index].pose = authoritative;
        body.set_pose(authoritative);
        body.set_linear_velocity(snapshot.player.linear_velocity);
        body.set_angular_velocity(snapshot.player.angular_velocity);
        body.set_cruise(snapshot.player.cruise());

        for state in moves.iter_mut().skip(index + 1) {
            state.pose = body.advance_kinematics(self.tick_seconds, &state.controls);
        }
        if let Some(last) = moves.newest() {
            body.set_pose(last.pose);
        }

        let after = body.pose();
        let jump = before.position_error(&after);
        if jump > body.speed() * self.teleport_speed_fraction {
            debug!(jump, "Correction too large to smooth, treating as teleport");
            self.smoothing.clear();
        } else {
            self.smoothing.record(before, after);
        }

        self.corrections += 1;
        ReconcileOutcome::Corrected {
            position_error,
            orientation_error,
            replayed: len - index - 1,
        }
    }

    /// Decay the render offset by one tick
    pub fn decay_smoothing(&mut self) {
        self.smoothing.decay();
    }

    /// Current render offset
    pub fn smoothing(&self) -> &SmoothingOffset {
        &self.smoothing
    }

    /// Corrections applied so far
    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    /// Tick of the last applied snapshot
    pub fn last_server_tick(&self) -> Tick {
        self.last_server_tick
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectTable, SimpleShip};
    use glam::{Quat, Vec3};
    use shipsync_core::{ObjectId, ObjectUpdate, PlayerAuthState, Pose, RawControls};

    const DT: f32 = 1.0 / 60.0;

    fn steady_controls() -> RawControls {
        RawControls {
            throttle: 1.0,
            steering: Vec3::new(0.0, 0.05, 0.0),
            ..Default::default()
        }
    }

    /// Predict ticks 1..=last and return the live ship and its history
    fn predicted(last: Tick, controls: RawControls) -> (SimpleShip, InputRecorder) {
        let mut ship = SimpleShip::default();
        let mut recorder = InputRecorder::default();
        for tick in 1..=last {
            let pose = ship.advance_physics_step(DT, &controls);
            recorder.record_tick(tick, pose, controls);
        }
        (ship, recorder)
    }

    fn authoritative(recorder: &InputRecorder, tick: Tick, shift: Vec3) -> Snapshot {
        let index = recorder.find_tick(tick).unwrap();
        let pose = recorder.moves()[index].pose;
        Snapshot {
            tick,
            input_sequence: tick,
            player: PlayerAuthState {
                position: pose.position + shift,
                orientation: pose.orientation,
                linear_velocity: pose.orientation * Vec3::new(0.0, 0.0, -80.0),
                health: 0.7,
                shield: 0.4,
                ..Default::default()
            },
            updates: vec![],
        }
    }

    #[test]
    fn test_divergence_snaps_and_replays() {
        let (mut ship, mut recorder) = predicted(1000, steady_controls());
        let before: Vec<Pose> = recorder.moves().iter().map(|m| m.pose).collect();
        let live_before = ship.pose();

        let shift = Vec3::new(5.0, 0.0, 0.0);
        let snapshot = authoritative(&recorder, 995, shift);
        let mut world = ObjectTable::new();
        let mut reconciler = Reconciler::default();

        let outcome =
            reconciler.apply_authoritative(&snapshot, true, &mut recorder, &mut ship, &mut world);

        match outcome {
            ReconcileOutcome::Corrected {
                position_error,
                replayed,
                ..
            } => {
                assert!((position_error - 5.0).abs() < 1e-3);
                assert_eq!(replayed, 5);
            }
            other => panic!("expected correction, got {other:?}"),
        }

        // Ticks 995..=1000 are the last six entries, all shifted by +5 X
        let after: Vec<Pose> = recorder.moves().iter().map(|m| m.pose).collect();
        for i in after.len() - 6..after.len() {
            let moved = after[i].position - before[i].position;
            assert!((moved - shift).length() < 1e-2, "tick index {i} moved {moved}");
        }
        assert_eq!(after[after.len() - 7], before[before.len() - 7]);

        assert_eq!(ship.pose(), after[after.len() - 1]);
        assert!((ship.pose().position - live_before.position - shift).length() < 1e-2);

        let offset = reconciler.smoothing().position;
        assert!((offset + shift).length() < 1e-2);
        assert!(reconciler.smoothing().render_pose(ship.pose()).position_error(&live_before) < 1e-2);
        assert_eq!(reconciler.corrections(), 1);
        assert_eq!(world.player_health(), 0.7);
    }

    #[test]
    fn test_within_tolerance_is_noop() {
        let (mut ship, mut recorder) = predicted(200, steady_controls());
        let live_before = ship.pose();
        let snapshot = authoritative(&recorder, 190, Vec3::new(0.05, 0.0, 0.0));

        let mut reconciler = Reconciler::default();
        let outcome = reconciler.apply_authoritative(
            &snapshot,
            true,
            &mut recorder,
            &mut ship,
            &mut ObjectTable::new(),
        );

        assert!(matches!(outcome, ReconcileOutcome::WithinTolerance { .. }));
        assert_eq!(ship.pose(), live_before);
        assert!(reconciler.smoothing().is_idle());
        assert_eq!(reconciler.corrections(), 0);
    }

    fn cruise_controls() -> RawControls {
        RawControls {
            cruise: true,
            ..steady_controls()
        }
    }

    #[test]
    fn test_within_tolerance_resyncs_cruise() {
        // One second of charging: 20% locally, server reports 50% at tick 50
        let (mut ship, mut recorder) = predicted(60, cruise_controls());
        let live_before = ship.pose();
        assert!((ship.cruise().charge_pct - 0.2).abs() < 1e-5);

        let mut snapshot = authoritative(&recorder, 50, Vec3::ZERO);
        snapshot.player.cruise_charge_pct = 0.5;

        let outcome = Reconciler::default().apply_authoritative(
            &snapshot,
            true,
            &mut recorder,
            &mut ship,
            &mut ObjectTable::new(),
        );

        assert!(matches!(outcome, ReconcileOutcome::WithinTolerance { .. }));
        assert_eq!(ship.pose(), live_before);
        // Tick 50 sits 11 entries from the end of a 60-move history
        let expected = 0.5 + 11.0 * DT / 5.0;
        assert!((ship.cruise().charge_pct - expected).abs() < 1e-5);
        assert_eq!(ship.cruise().accel_pct, 0.0);
    }

    #[test]
    fn test_correction_copies_cruise_and_angular_velocity() {
        let (mut ship, mut recorder) = predicted(60, cruise_controls());
        let mut snapshot = authoritative(&recorder, 60, Vec3::new(5.0, 0.0, 0.0));
        snapshot.player.cruise_charge_pct = 0.7;
        snapshot.player.angular_velocity = Vec3::new(0.0, 0.4, 0.0);

        let outcome = Reconciler::default().apply_authoritative(
            &snapshot,
            true,
            &mut recorder,
            &mut ship,
            &mut ObjectTable::new(),
        );

        // Newest tick: nothing to replay, the snapped state stays on the body
        assert!(matches!(outcome, ReconcileOutcome::Corrected { replayed: 0, .. }));
        assert_eq!(ship.cruise().charge_pct, 0.7);
        assert_eq!(ship.angular_velocity(), Vec3::new(0.0, 0.4, 0.0));
        assert_eq!(ship.linear_velocity(), snapshot.player.linear_velocity);
    }

    #[test]
    fn test_replay_continues_from_snapped_cruise() {
        let (mut ship, mut recorder) = predicted(60, cruise_controls());
        let mut snapshot = authoritative(&recorder, 50, Vec3::new(5.0, 0.0, 0.0));
        snapshot.player.cruise_charge_pct = 0.7;

        let outcome = Reconciler::default().apply_authoritative(
            &snapshot,
            true,
            &mut recorder,
            &mut ship,
            &mut ObjectTable::new(),
        );

        assert!(matches!(outcome, ReconcileOutcome::Corrected { replayed: 10, .. }));
        let expected = 0.7 + 10.0 * DT / 5.0;
        assert!((ship.cruise().charge_pct - expected).abs() < 1e-5);
    }

    #[test]
    fn test_orientation_divergence_corrects() {
        let (mut ship, mut recorder) = predicted(100, steady_controls());
        let mut snapshot = authoritative(&recorder, 98, Vec3::ZERO);
        snapshot.player.orientation = snapshot.player.orientation * Quat::from_rotation_x(1.5);

        let outcome = Reconciler::default().apply_authoritative(
            &snapshot,
            true,
            &mut recorder,
            &mut ship,
            &mut ObjectTable::new(),
        );
        assert!(outcome.is_correction());
    }

    #[test]
    fn test_not_last_only_applies_remote_state() {
        let (mut ship, mut recorder) = predicted(50, steady_controls());
        let live_before = ship.pose();

        let mut snapshot = authoritative(&recorder, 45, Vec3::new(100.0, 0.0, 0.0));
        let mut remote = ObjectUpdate::blank(ObjectId(3));
        remote.position = Vec3::new(9.0, 9.0, 9.0);
        snapshot.updates.push(remote.clone());

        let mut world = ObjectTable::new();
        world.spawn(ObjectId(3));

        let outcome = Reconciler::default().apply_authoritative(
            &snapshot,
            false,
            &mut recorder,
            &mut ship,
            &mut world,
        );

        assert_eq!(outcome, ReconcileOutcome::Deferred);
        assert_eq!(ship.pose(), live_before);
        assert_eq!(world.get(ObjectId(3)), Some(&remote));
        assert_eq!(world.player_shield(), 0.4);
    }

    #[test]
    fn test_evicted_history_is_skipped() {
        let (mut ship, mut recorder) = predicted(400, steady_controls());
        let live_before = ship.pose();
        let snapshot = Snapshot {
            tick: 10,
            player: PlayerAuthState {
                position: Vec3::new(1e4, 0.0, 0.0),
                ..Default::default()
            },
            ..Default::default()
        };

        let outcome = Reconciler::default().apply_authoritative(
            &snapshot,
            true,
            &mut recorder,
            &mut ship,
            &mut ObjectTable::new(),
        );

        assert_eq!(outcome, ReconcileOutcome::HistoryEvicted);
        assert_eq!(ship.pose(), live_before);
    }

    #[test]
    fn test_teleport_clears_smoothing() {
        // Stationary ship: any jump exceeds a third of its speed
        let (mut ship, mut recorder) = predicted(30, RawControls::default());
        let mut snapshot = authoritative(&recorder, 25, Vec3::new(500.0, 0.0, 0.0));
        snapshot.player.linear_velocity = Vec3::ZERO;

        let mut reconciler = Reconciler::default();
        reconciler.smoothing.record(Pose::new(Vec3::ONE, Quat::IDENTITY), Pose::IDENTITY);

        let outcome = reconciler.apply_authoritative(
            &snapshot,
            true,
            &mut recorder,
            &mut ship,
            &mut ObjectTable::new(),
        );

        assert!(outcome.is_correction());
        assert!(reconciler.smoothing().is_idle());
        assert!((ship.pose().position.x - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let (ship, recorder) = predicted(300, steady_controls());
        let snapshot = authoritative(&recorder, 250, Vec3::new(0.0, 3.0, 0.0));

        let run = || {
            let mut ship = ship.clone();
            let mut recorder = recorder.clone();
            Reconciler::default().apply_authoritative(
                &snapshot,
                true,
                &mut recorder,
                &mut ship,
                &mut ObjectTable::new(),
            );
            (ship.pose(), recorder.moves().iter().map(|m| m.pose).collect::<Vec<_>>())
        };

        assert_eq!(run(), run());
    }
}
