//! Delta-encoded snapshots
//!
//! A [`DeltaSnapshot`] names a baseline tick and carries only the fields that
//! differ from the snapshot cached for that tick. Merging it onto a copy of
//! the baseline materializes a full [`Snapshot`].
//!
//! ```text
//! baseline (old_tick) ──┐
//!                       ├──▶ apply_to ──▶ Snapshot (tick)
//! DeltaSnapshot ────────┘
//! ```
//!
//! `old_tick == 0` means there is no baseline; the delta is applied to an
//! all-default snapshot instead.

use crate::{GunOrient, ObjectFlags, ObjectId, ObjectUpdate, PlayerAuthState, Snapshot, Tick};
use glam::{Quat, Vec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
    if old == new {
        None
    } else {
        Some(new.clone())
    }
}

/// Changed fields of the local player's authoritative state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerAuthDelta {
    pub position: Option<Vec3>,
    pub orientation: Option<Quat>,
    pub linear_velocity: Option<Vec3>,
    pub angular_velocity: Option<Vec3>,
    pub health: Option<f32>,
    pub shield: Option<f32>,
    pub cruise_charge_pct: Option<f32>,
    pub cruise_accel_pct: Option<f32>,
}

impl PlayerAuthDelta {
    /// Fields of `new` that differ from `old`
    pub fn diff(old: &PlayerAuthState, new: &PlayerAuthState) -> Self {
        Self {
            position: changed(&old.position, &new.position),
            orientation: changed(&old.orientation, &new.orientation),
            linear_velocity: changed(&old.linear_velocity, &new.linear_velocity),
            angular_velocity: changed(&old.angular_velocity, &new.angular_velocity),
            health: changed(&old.health, &new.health),
            shield: changed(&old.shield, &new.shield),
            cruise_charge_pct: changed(&old.cruise_charge_pct, &new.cruise_charge_pct),
            cruise_accel_pct: changed(&old.cruise_accel_pct, &new.cruise_accel_pct),
        }
    }

    /// Baseline with this delta's fields overridden
    pub fn apply(&self, base: &PlayerAuthState) -> PlayerAuthState {
        PlayerAuthState {
            position: self.position.unwrap_or(base.position),
            orientation: self.orientation.unwrap_or(base.orientation),
            linear_velocity: self.linear_velocity.unwrap_or(base.linear_velocity),
            angular_velocity: self.angular_velocity.unwrap_or(base.angular_velocity),
            health: self.health.unwrap_or(base.health),
            shield: self.shield.unwrap_or(base.shield),
            cruise_charge_pct: self.cruise_charge_pct.unwrap_or(base.cruise_charge_pct),
            cruise_accel_pct: self.cruise_accel_pct.unwrap_or(base.cruise_accel_pct),
        }
    }

    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Changed fields of one object's update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDelta {
    pub id: ObjectId,
    pub position: Option<Vec3>,
    pub orientation: Option<Quat>,
    pub linear_velocity: Option<Vec3>,
    pub angular_velocity: Option<Vec3>,
    pub flags: Option<ObjectFlags>,
    pub throttle: Option<f32>,
    pub hull: Option<f32>,
    pub shield: Option<f32>,
    pub guns: Option<Vec<GunOrient>>,
}

impl ObjectDelta {
    /// Delta that changes nothing
    pub fn unchanged(id: ObjectId) -> Self {
        Self {
            id,
            position: None,
            orientation: None,
            linear_velocity: None,
            angular_velocity: None,
            flags: None,
            throttle: None,
            hull: None,
            shield: None,
            guns: None,
        }
    }

    /// Fields of `new` that differ from `old`
    pub fn diff(old: &ObjectUpdate, new: &ObjectUpdate) -> Self {
        Self {
            id: new.id,
            position: changed(&old.position, &new.position),
            orientation: changed(&old.orientation, &new.orientation),
            linear_velocity: changed(&old.linear_velocity, &new.linear_velocity),
            angular_velocity: changed(&old.angular_velocity, &new.angular_velocity),
            flags: changed(&old.flags, &new.flags),
            throttle: changed(&old.throttle, &new.throttle),
            hull: changed(&old.hull, &new.hull),
            shield: changed(&old.shield, &new.shield),
            guns: changed(&old.guns, &new.guns),
        }
    }

    /// Baseline update with this delta's fields overridden
    pub fn apply(&self, base: &ObjectUpdate) -> ObjectUpdate {
        ObjectUpdate {
            id: self.id,
            position: self.position.unwrap_or(base.position),
            orientation: self.orientation.unwrap_or(base.orientation),
            linear_velocity: self.linear_velocity.unwrap_or(base.linear_velocity),
            angular_velocity: self.angular_velocity.unwrap_or(base.angular_velocity),
            flags: self.flags.unwrap_or(base.flags),
            throttle: self.throttle.unwrap_or(base.throttle),
            hull: self.hull.unwrap_or(base.hull),
            shield: self.shield.unwrap_or(base.shield),
            guns: self.guns.clone().unwrap_or_else(|| base.guns.clone()),
        }
    }

    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        *self == Self::unchanged(self.id)
    }
}

/// Snapshot encoded as changes against a cached baseline
///
/// Wire name: `PackedUpdatePacket`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaSnapshot {
    pub tick: Tick,
    pub input_sequence: Tick,
    /// Baseline tick, 0 for none
    pub old_tick: Tick,
    pub player: PlayerAuthDelta,
    /// Changed and newly visible objects
    pub objects: Vec<ObjectDelta>,
    /// Objects present in the baseline that no longer exist
    pub removed: Vec<ObjectId>,
}

impl DeltaSnapshot {
    /// Check if this delta references a cached baseline
    pub fn has_baseline(&self) -> bool {
        self.old_tick != 0
    }

    /// Materialize the full snapshot by merging onto `baseline`
    ///
    /// Objects keep the baseline's order; removed ones are dropped and newly
    /// seen ones are appended, merged onto a blank update.
    pub fn apply_to(&self, baseline: &Snapshot) -> Snapshot {
        let mut objects: IndexMap<ObjectId, ObjectUpdate> = baseline
            .updates
            .iter()
            .map(|update| (update.id, update.clone()))
            .collect();

        for id in &self.removed {
            objects.shift_remove(id);
        }

        for delta in &self.objects {
            let merged = match objects.get(&delta.id) {
                Some(base) => delta.apply(base),
                None => delta.apply(&ObjectUpdate::blank(delta.id)),
            };
            objects.insert(delta.id, merged);
        }

        Snapshot {
            tick: self.tick,
            input_sequence: self.input_sequence,
            player: self.player.apply(&baseline.player),
            updates: objects.into_values().collect(),
        }
    }

    /// Build the delta that turns `baseline` into `current`
    ///
    /// Pass `Snapshot::default()` with `old_tick = 0` when the client has
    /// acknowledged nothing yet.
    pub fn diff(old_tick: Tick, baseline: &Snapshot, current: &Snapshot) -> Self {
        let removed = baseline
            .updates
            .iter()
            .filter(|old| current.update_for(old.id).is_none())
            .map(|old| old.id)
            .collect();

        let objects = current
            .updates
            .iter()
            .filter_map(|new| match baseline.update_for(new.id) {
                Some(old) => Some(ObjectDelta::diff(old, new)).filter(|d| !d.is_empty()),
                None => Some(ObjectDelta::diff(&ObjectUpdate::blank(new.id), new)),
            })
            .collect();

        Self {
            tick: current.tick,
            input_sequence: current.input_sequence,
            old_tick,
            player: PlayerAuthDelta::diff(&baseline.player, &current.player),
            objects,
            removed,
        }
    }
}

/// A snapshot as delivered by the transport, full or delta-encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundUpdate {
    Full(Snapshot),
    Delta(DeltaSnapshot),
}

impl InboundUpdate {
    /// Server tick of the carried snapshot
    pub fn tick(&self) -> Tick {
        match self {
            InboundUpdate::Full(snapshot) => snapshot.tick,
            InboundUpdate::Delta(delta) => delta.tick,
        }
    }
}

impl From<Snapshot> for InboundUpdate {
    fn from(snapshot: Snapshot) -> Self {
        InboundUpdate::Full(snapshot)
    }
}

impl From<DeltaSnapshot> for InboundUpdate {
    fn from(delta: DeltaSnapshot) -> Self {
        InboundUpdate::Delta(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship(id: u32, x: f32) -> ObjectUpdate {
        ObjectUpdate {
            position: Vec3::new(x, 0.0, 0.0),
            hull: 1.0,
            ..ObjectUpdate::blank(ObjectId(id))
        }
    }

    fn baseline() -> Snapshot {
        Snapshot {
            tick: 50,
            input_sequence: 52,
            player: PlayerAuthState {
                position: Vec3::new(1.0, 2.0, 3.0),
                health: 0.9,
                shield: 0.5,
                ..Default::default()
            },
            updates: vec![ship(1, 10.0), ship(2, 20.0), ship(3, 30.0)],
        }
    }

    #[test]
    fn test_apply_overrides_only_changed_fields() {
        let delta = DeltaSnapshot {
            tick: 53,
            input_sequence: 55,
            old_tick: 50,
            player: PlayerAuthDelta {
                health: Some(0.4),
                ..Default::default()
            },
            objects: vec![ObjectDelta {
                position: Some(Vec3::new(25.0, 0.0, 0.0)),
                ..ObjectDelta::unchanged(ObjectId(2))
            }],
            removed: vec![],
        };

        let snapshot = delta.apply_to(&baseline());
        assert_eq!(snapshot.tick, 53);
        assert_eq!(snapshot.input_sequence, 55);
        assert_eq!(snapshot.player.health, 0.4);
        assert_eq!(snapshot.player.shield, 0.5);
        assert_eq!(snapshot.player.position, Vec3::new(1.0, 2.0, 3.0));

        let moved = snapshot.update_for(ObjectId(2)).unwrap();
        assert_eq!(moved.position, Vec3::new(25.0, 0.0, 0.0));
        assert_eq!(moved.hull, 1.0);
        assert_eq!(snapshot.update_for(ObjectId(1)), Some(&ship(1, 10.0)));
    }

    #[test]
    fn test_removed_and_new_objects() {
        let delta = DeltaSnapshot {
            tick: 51,
            old_tick: 50,
            objects: vec![ObjectDelta {
                hull: Some(0.75),
                ..ObjectDelta::unchanged(ObjectId(8))
            }],
            removed: vec![ObjectId(1)],
            ..Default::default()
        };

        let snapshot = delta.apply_to(&baseline());
        let ids: Vec<u32> = snapshot.updates.iter().map(|u| u.id.0).collect();
        assert_eq!(ids, vec![2, 3, 8]);

        let fresh = snapshot.update_for(ObjectId(8)).unwrap();
        assert_eq!(fresh.hull, 0.75);
        assert_eq!(fresh.position, Vec3::ZERO);
    }

    #[test]
    fn test_diff_then_apply_reproduces_current() {
        let base = baseline();
        let mut current = base.clone();
        current.tick = 60;
        current.input_sequence = 63;
        current.player.position.x += 4.0;
        current.player.cruise_charge_pct = 0.3;
        current.updates.remove(0);
        current.updates[0].throttle = 0.5;
        current.updates.push(ship(11, -5.0));

        let delta = DeltaSnapshot::diff(base.tick, &base, &current);
        assert_eq!(delta.removed, vec![ObjectId(1)]);
        // Object 3 is unchanged and omitted
        assert_eq!(delta.objects.len(), 2);
        assert!(delta.player.health.is_none());

        let rebuilt = delta.apply_to(&base);
        assert_eq!(rebuilt, current);
    }

    #[test]
    fn test_diff_against_blank_baseline() {
        let current = baseline();
        let delta = DeltaSnapshot::diff(0, &Snapshot::default(), &current);
        assert!(!delta.has_baseline());
        assert_eq!(delta.apply_to(&Snapshot::default()), current);
    }

    #[test]
    fn test_object_delta_is_empty() {
        let a = ship(5, 1.0);
        assert!(ObjectDelta::diff(&a, &a).is_empty());
        assert!(PlayerAuthDelta::default().is_empty());
    }
}
