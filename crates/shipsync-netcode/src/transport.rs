//! Packet link between the client session and the server
//!
//! The link hands over complete, already-decoded packets. Byte encoding,
//! reliability classes and timeouts belong to the implementation behind it.
//! Inbound updates are returned in arrival order; returning `None` simply
//! means nothing arrived this frame.

use shipsync_core::{InboundUpdate, InputUpdatePacket};
use std::collections::VecDeque;
use thiserror::Error;

/// Connection to the authoritative server
pub trait PacketLink {
    /// Error type for this link
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send an input packet over the unreliable, sequenced channel
    fn send_input(&mut self, packet: InputUpdatePacket) -> Result<(), Self::Error>;

    /// Take the next received snapshot (non-blocking)
    fn recv_update(&mut self) -> Option<InboundUpdate>;

    /// Number of received snapshots not yet taken
    fn pending_updates(&self) -> usize {
        0
    }
}

/// Loopback link error
#[derive(Debug, Error)]
pub enum LoopbackError {
    #[error("Link is closed")]
    Closed,
}

/// In-memory link for tests and local play
///
/// Sent packets queue up in `outbound`; updates queued with
/// [`LoopbackLink::deliver`] are handed to the session in order.
#[derive(Debug, Default)]
pub struct LoopbackLink {
    outbound: VecDeque<InputUpdatePacket>,
    inbound: VecDeque<InboundUpdate>,
    closed: bool,
}

impl LoopbackLink {
    /// Create an open link
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an update for the client
    pub fn deliver(&mut self, update: impl Into<InboundUpdate>) {
        self.inbound.push_back(update.into());
    }

    /// Drain every packet the client sent, oldest first
    pub fn take_sent(&mut self) -> Vec<InputUpdatePacket> {
        self.outbound.drain(..).collect()
    }

    /// Newest packet the client sent
    pub fn last_sent(&self) -> Option<&InputUpdatePacket> {
        self.outbound.back()
    }

    /// Refuse further sends
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Check if the link was closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl PacketLink for LoopbackLink {
    type Error = LoopbackError;

    fn send_input(&mut self, packet: InputUpdatePacket) -> Result<(), Self::Error> {
        if self.closed {
            return Err(LoopbackError::Closed);
        }
        self.outbound.push_back(packet);
        Ok(())
    }

    fn recv_update(&mut self) -> Option<InboundUpdate> {
        self.inbound.pop_front()
    }

    fn pending_updates(&self) -> usize {
        self.inbound.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipsync_core::{Snapshot, UpdateAck};

    fn packet(tick: u32) -> InputUpdatePacket {
        let state = shipsync_core::MoveState::new(tick, Default::default(), Default::default());
        InputUpdatePacket {
            current: (&state).into(),
            history_a: None,
            history_b: None,
            history_c: None,
            acks: UpdateAck::default(),
            selected_object: None,
        }
    }

    #[test]
    fn test_updates_arrive_in_order() {
        let mut link = LoopbackLink::new();
        for tick in [5, 6, 7] {
            link.deliver(Snapshot {
                tick,
                ..Default::default()
            });
        }
        assert_eq!(link.pending_updates(), 3);

        let ticks: Vec<u32> = std::iter::from_fn(|| link.recv_update())
            .map(|u| u.tick())
            .collect();
        assert_eq!(ticks, vec![5, 6, 7]);
        assert!(link.recv_update().is_none());
    }

    #[test]
    fn test_closed_link_rejects_sends() {
        let mut link = LoopbackLink::new();
        link.send_input(packet(1)).unwrap();
        link.close();
        assert!(link.send_input(packet(2)).is_err());

        let sent = link.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].current.tick, 1);
        assert!(link.last_sent().is_none());
    }
}
