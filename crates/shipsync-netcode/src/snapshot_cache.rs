//! Decoded snapshot cache and delta decoding
//!
//! Every decoded snapshot is kept as a potential baseline for later deltas.
//! The cache is bounded; once full, the oldest snapshot is evicted and any
//! delta still referencing it fails with [`Error::MissingBaseline`].

use crate::{Error, Result};
use shipsync_core::{InboundUpdate, Snapshot, Tick};
use shipsync_ring_buffer::RingBuffer;

/// Default number of cached snapshots
pub const DEFAULT_SNAPSHOT_CACHE: usize = 1000;

/// Bounded FIFO of decoded snapshots
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    snapshots: RingBuffer<Snapshot>,
}

impl SnapshotCache {
    /// Create a cache holding up to `capacity` snapshots
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: RingBuffer::new(capacity),
        }
    }

    /// Materialize an inbound update into a full snapshot and cache it
    ///
    /// Full snapshots are stored as-is. A delta is merged onto the cached
    /// snapshot for its `old_tick`, or onto an all-default snapshot when
    /// `old_tick` is 0. The cache is left untouched on error.
    pub fn decode(&mut self, update: InboundUpdate) -> Result<Snapshot> {
        let snapshot = match update {
            InboundUpdate::Full(snapshot) => snapshot,
            InboundUpdate::Delta(delta) => {
                if delta.has_baseline() {
                    let baseline = self.get(delta.old_tick).ok_or(Error::MissingBaseline {
                        tick: delta.tick,
                        old_tick: delta.old_tick,
                    })?;
                    delta.apply_to(baseline)
                } else {
                    delta.apply_to(&Snapshot::default())
                }
            }
        };

        self.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Cached snapshot for a tick
    ///
    /// Searches newest first, so a re-sent tick resolves to its latest copy.
    pub fn get(&self, tick: Tick) -> Option<&Snapshot> {
        self.snapshots.iter().rev().find(|s| s.tick == tick)
    }

    /// Check if a tick is cached
    pub fn contains(&self, tick: Tick) -> bool {
        self.get(tick).is_some()
    }

    /// Newest cached snapshot
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.newest()
    }

    /// Number of cached snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Maximum number of cached snapshots
    pub fn capacity(&self) -> usize {
        self.snapshots.capacity()
    }

    /// Drop every cached snapshot
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_CACHE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use shipsync_core::{
        DeltaSnapshot, ObjectDelta, ObjectId, ObjectUpdate, PlayerAuthDelta, PlayerAuthState,
    };

    fn full(tick: Tick) -> Snapshot {
        Snapshot {
            tick,
            input_sequence: tick + 2,
            player: PlayerAuthState {
                position: Vec3::new(tick as f32, 0.0, 0.0),
                health: 1.0,
                shield: 1.0,
                ..Default::default()
            },
            updates: vec![ObjectUpdate::blank(ObjectId(1)), ObjectUpdate::blank(ObjectId(2))],
        }
    }

    #[test]
    fn test_full_snapshot_round_trip() {
        let mut cache = SnapshotCache::default();
        let snapshot = full(10);

        let decoded = cache.decode(snapshot.clone().into()).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(cache.get(10), Some(&snapshot));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delta_without_baseline() {
        let mut cache = SnapshotCache::default();
        let delta = DeltaSnapshot {
            tick: 3,
            input_sequence: 5,
            old_tick: 0,
            player: PlayerAuthDelta {
                health: Some(0.8),
                ..Default::default()
            },
            objects: vec![ObjectDelta::unchanged(ObjectId(4))],
            removed: vec![],
        };

        let snapshot = cache.decode(delta.into()).unwrap();
        assert_eq!(snapshot.tick, 3);
        assert_eq!(snapshot.player.health, 0.8);
        assert_eq!(snapshot.player.position, Vec3::ZERO);
        assert_eq!(snapshot.updates, vec![ObjectUpdate::blank(ObjectId(4))]);
        assert!(cache.contains(3));
    }

    #[test]
    fn test_delta_matches_overridden_baseline() {
        let mut cache = SnapshotCache::default();
        let baseline = cache.decode(full(20).into()).unwrap();

        let delta = DeltaSnapshot {
            tick: 24,
            input_sequence: 27,
            old_tick: 20,
            player: PlayerAuthDelta {
                position: Some(Vec3::new(1.0, 1.0, 1.0)),
                ..Default::default()
            },
            objects: vec![ObjectDelta {
                throttle: Some(0.5),
                ..ObjectDelta::unchanged(ObjectId(2))
            }],
            removed: vec![],
        };

        let decoded = cache.decode(delta.into()).unwrap();

        let mut expected = baseline.clone();
        expected.tick = 24;
        expected.input_sequence = 27;
        expected.player.position = Vec3::new(1.0, 1.0, 1.0);
        expected.updates[1].throttle = 0.5;
        assert_eq!(decoded, expected);
        assert_eq!(cache.get(24), Some(&expected));
        // Baseline itself is not modified
        assert_eq!(cache.get(20), Some(&baseline));
    }

    #[test]
    fn test_diff_decodes_to_current() {
        let mut cache = SnapshotCache::default();
        let baseline = cache.decode(full(30).into()).unwrap();

        let mut current = full(31);
        current.updates.remove(0);
        current.updates.push(ObjectUpdate::blank(ObjectId(9)));
        current.player.shield = 0.1;

        let delta = DeltaSnapshot::diff(30, &baseline, &current);
        assert_eq!(cache.decode(delta.into()).unwrap(), current);
    }

    #[test]
    fn test_evicted_baseline_is_missing() {
        // Baseline 50 falls out after 1000 newer snapshots
        let mut cache = SnapshotCache::default();
        cache.decode(full(50).into()).unwrap();
        for tick in 51..=1050 {
            cache.decode(full(tick).into()).unwrap();
        }
        assert_eq!(cache.len(), DEFAULT_SNAPSHOT_CACHE);
        assert!(!cache.contains(50));

        let delta = DeltaSnapshot {
            tick: 1051,
            old_tick: 50,
            ..Default::default()
        };
        let result = cache.decode(delta.into());
        assert!(matches!(
            result,
            Err(Error::MissingBaseline {
                tick: 1051,
                old_tick: 50
            })
        ));
        assert_eq!(cache.latest().map(|s| s.tick), Some(1050));
    }
}
