//! Outbound input packet and acknowledgement window
//!
//! The input channel is sequenced but unreliable: a newer packet supersedes
//! an older one and nothing is retransmitted. Every packet therefore carries
//! the newest control record plus up to three older ones, so the server can
//! rebuild its input stream after as many as three consecutive drops.

use crate::{FireCommand, MoveState, ObjectId, RawControls, StrafeControls, Tick};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of ticks tracked by the ack history mask
pub const ACK_WINDOW: u32 = 64;

/// One tick of control input as sent to the server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetInputControls {
    pub tick: Tick,
    pub steering: Vec3,
    pub aim_point: Vec3,
    pub strafe: StrafeControls,
    pub throttle: f32,
    pub cruise: bool,
    pub thrust: bool,
    pub fire_command: Option<FireCommand>,
}

impl NetInputControls {
    /// The raw controls carried by this record
    pub fn controls(&self) -> RawControls {
        RawControls {
            steering: self.steering,
            aim_point: self.aim_point,
            throttle: self.throttle,
            strafe: self.strafe,
            thrust: self.thrust,
            cruise: self.cruise,
            fire_command: self.fire_command,
        }
    }
}

impl From<&MoveState> for NetInputControls {
    fn from(state: &MoveState) -> Self {
        Self {
            tick: state.tick,
            steering: state.controls.steering,
            aim_point: state.controls.aim_point,
            strafe: state.controls.strafe,
            throttle: state.controls.throttle,
            cruise: state.controls.cruise,
            thrust: state.controls.thrust,
            fire_command: state.controls.fire_command,
        }
    }
}

/// Newest decoded snapshot tick plus a mask of the ticks decoded before it
///
/// Bit `k` of `history` covers tick `tick - 1 - k`. A zero `tick` means
/// nothing has been acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAck {
    tick: Tick,
    history: u64,
}

impl UpdateAck {
    /// Ack for a single tick with no history
    pub fn new(tick: Tick) -> Self {
        Self { tick, history: 0 }
    }

    /// Newest acknowledged tick (the packet's `AckTick`)
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Raw history mask
    pub fn history(&self) -> u64 {
        self.history
    }

    /// Check if nothing is acknowledged
    pub fn is_empty(&self) -> bool {
        self.tick == 0
    }

    /// Mark a tick as decoded
    ///
    /// A newer tick becomes the head and shifts the mask, keeping bits for
    /// ticks still inside the window. An older tick only sets its bit.
    pub fn acknowledge(&mut self, tick: Tick) {
        if self.tick == 0 {
            *self = Self::new(tick);
            return;
        }

        if tick > self.tick {
            let shift = tick - self.tick;
            let kept = self.history.checked_shl(shift).unwrap_or(0);
            let previous_head = 1u64.checked_shl(shift - 1).unwrap_or(0);
            self.tick = tick;
            self.history = kept | previous_head;
        } else if tick < self.tick {
            let back = self.tick - tick - 1;
            if back < ACK_WINDOW {
                self.history |= 1 << back;
            }
        }
    }

    /// Check if a tick is acknowledged
    pub fn contains(&self, tick: Tick) -> bool {
        if self.tick == 0 || tick > self.tick {
            return false;
        }
        if tick == self.tick {
            return true;
        }
        let back = self.tick - tick - 1;
        back < ACK_WINDOW && (self.history >> back) & 1 == 1
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Client to server input update, sent once per local tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputUpdatePacket {
    /// Latest control record
    pub current: NetInputControls,
    /// One tick older than `current`
    pub history_a: Option<NetInputControls>,
    /// Two ticks older than `current`
    pub history_b: Option<NetInputControls>,
    /// Three ticks older than `current`
    pub history_c: Option<NetInputControls>,
    pub acks: UpdateAck,
    pub selected_object: Option<ObjectId>,
}

impl InputUpdatePacket {
    /// Last snapshot tick the client fully processed
    pub fn ack_tick(&self) -> Tick {
        self.acks.tick()
    }

    /// All carried control records, oldest first
    pub fn inputs_oldest_first(&self) -> impl Iterator<Item = &NetInputControls> {
        [
            self.history_c.as_ref(),
            self.history_b.as_ref(),
            self.history_a.as_ref(),
            Some(&self.current),
        ]
        .into_iter()
        .flatten()
    }

    /// Records the server has not consumed yet, oldest first
    ///
    /// This is how a server fills gaps left by dropped packets.
    pub fn inputs_after(&self, last_consumed: Tick) -> Vec<NetInputControls> {
        self.inputs_oldest_first()
            .filter(|input| input.tick > last_consumed)
            .copied()
            .collect()
    }
}
