//! Sink for authoritative state that is applied without prediction

use indexmap::IndexMap;
use shipsync_core::{ObjectId, ObjectUpdate};

/// World-side receiver for non-predicted state
///
/// Remote objects are snapped to their reported state and the local
/// player's vitals are shown as-is; neither is ever reconciled.
pub trait RemoteWorld {
    /// Snap a remote object to its reported state
    ///
    /// Updates for objects the world does not know are ignored.
    fn apply_object_update(&mut self, update: &ObjectUpdate);

    /// Display the local player's authoritative health and shield
    fn set_player_vitals(&mut self, health: f32, shield: f32);
}

/// Minimal mirror of remote objects keyed by network id
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    objects: IndexMap<ObjectId, ObjectUpdate>,
    player_health: f32,
    player_shield: f32,
    /// Updates dropped because the object was not spawned
    pub unknown_updates: u64,
}

impl ObjectTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spawned object
    pub fn spawn(&mut self, id: ObjectId) {
        self.objects
            .entry(id)
            .or_insert_with(|| ObjectUpdate::blank(id));
    }

    /// Remove a despawned object
    pub fn despawn(&mut self, id: ObjectId) -> Option<ObjectUpdate> {
        self.objects.shift_remove(&id)
    }

    /// Last applied state of an object
    pub fn get(&self, id: ObjectId) -> Option<&ObjectUpdate> {
        self.objects.get(&id)
    }

    /// Iterate objects in spawn order
    pub fn iter(&self) -> impl Iterator<Item = &ObjectUpdate> {
        self.objects.values()
    }

    /// Number of spawned objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if no objects are spawned
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Displayed player health
    pub fn player_health(&self) -> f32 {
        self.player_health
    }

    /// Displayed player shield
    pub fn player_shield(&self) -> f32 {
        self.player_shield
    }
}

impl RemoteWorld for ObjectTable {
    fn apply_object_update(&mut self, update: &ObjectUpdate) {
        match self.objects.get_mut(&update.id) {
            Some(object) => *object = update.clone(),
            None => self.unknown_updates += 1,
        }
    }

    fn set_player_vitals(&mut self, health: f32, shield: f32) {
        self.player_health = health;
        self.player_shield = shield;
    }
}
