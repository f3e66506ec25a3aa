//! Predicted move history and outbound input packets
//!
//! Records one [`MoveState`] per simulated tick. The history serves two
//! purposes: every outbound packet repeats the newest four records, and
//! reconciliation replays the records after a corrected tick.

use shipsync_core::{
    InputUpdatePacket, MoveState, NetInputControls, ObjectId, Pose, RawControls, Tick, UpdateAck,
};
use shipsync_ring_buffer::RingBuffer;

/// Default number of moves kept (about 2.1 seconds at 60Hz)
pub const DEFAULT_MOVE_HISTORY: usize = 128;

/// History of predicted moves plus the snapshot ack window
#[derive(Debug, Clone)]
pub struct InputRecorder {
    /// Predicted moves, oldest first
    moves: RingBuffer<MoveState>,
    /// Snapshots decoded so far
    acks: UpdateAck,
}

impl InputRecorder {
    /// Create a recorder keeping `capacity` moves
    pub fn new(capacity: usize) -> Self {
        Self {
            moves: RingBuffer::new(capacity),
            acks: UpdateAck::default(),
        }
    }

    /// Append the move predicted for `tick`
    ///
    /// Returns the evicted oldest move once the history is full.
    pub fn record_tick(
        &mut self,
        tick: Tick,
        pose: Pose,
        controls: RawControls,
    ) -> Option<MoveState> {
        self.moves.push(MoveState::new(tick, pose, controls))
    }

    /// Build the packet for the newest recorded move
    ///
    /// The three preceding moves ride along as history when they exist.
    /// Returns `None` before the first move is recorded.
    pub fn build_outbound_packet(&self, selected: Option<ObjectId>) -> Option<InputUpdatePacket> {
        let current = self.moves.newest()?;
        let history = |back| self.moves.from_back(back).map(NetInputControls::from);

        Some(InputUpdatePacket {
            current: NetInputControls::from(current),
            history_a: history(1),
            history_b: history(2),
            history_c: history(3),
            acks: self.acks,
            selected_object: selected,
        })
    }

    /// Record a successfully decoded snapshot tick
    pub fn acknowledge(&mut self, tick: Tick) {
        self.acks.acknowledge(tick);
    }

    /// Forget every acknowledgement so the server falls back to full state
    pub fn reset_acks(&mut self) {
        self.acks.reset();
    }

    /// Current ack window
    pub fn acks(&self) -> UpdateAck {
        self.acks
    }

    /// Newest acknowledged tick (0 when none)
    pub fn ack_tick(&self) -> Tick {
        self.acks.tick()
    }

    /// Recorded moves
    pub fn moves(&self) -> &RingBuffer<MoveState> {
        &self.moves
    }

    /// Mutable access to recorded moves, for replay
    pub fn moves_mut(&mut self) -> &mut RingBuffer<MoveState> {
        &mut self.moves
    }

    /// Logical index of the move recorded for `tick`, scanning newest first
    pub fn find_tick(&self, tick: Tick) -> Option<usize> {
        self.moves.rposition(|m| m.tick == tick)
    }

    /// Drop the move history, keeping acknowledgements
    pub fn clear_moves(&mut self) {
        self.moves.clear();
    }

    /// Number of recorded moves
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Check if no moves are recorded
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Default for InputRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_HISTORY)
    }
}
