//! ShipSync Netcode - Client-side prediction against an authoritative server
//!
//! This crate keeps a locally simulated ship responsive under latency while
//! converging on the server's state:
//!
//! - **Input Recording**: One move per tick, sent with three ticks of history
//! - **Snapshot Cache**: Full and delta snapshots decoded against baselines
//! - **Clock Sync**: Tick drift turned into a playback interval, with time-warp
//! - **Reconciliation**: Snap and kinematic replay when prediction diverges
//! - **Smoothing**: Render-only offset that hides corrections
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ClientSession                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
//! │  │  ShipBody    │─▶│InputRecorder │─▶│   PacketLink     │──▶ server
//! │  └──────────────┘  └──────────────┘  └──────────────────┘    │
//! │         ▲                  ▲                   │             │
//! │         │                  │                   ▼             │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
//! │  │  Smoothing   │◀─│  Reconciler  │◀─│  SnapshotCache   │◀── server
//! │  └──────────────┘  └──────────────┘  └──────────────────┘    │
//! │                                              │               │
//! │                                              ▼               │
//! │                                   ┌─────────────────────┐    │
//! │                                   │ ClockSyncController │    │
//! │                                   └─────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use shipsync_core::{RawControls, SyncConfig};
//! use shipsync_netcode::{ClientSession, LoopbackLink, ObjectTable, SimpleShip};
//!
//! let mut session = ClientSession::new(SyncConfig::default()).unwrap();
//! let mut ship = SimpleShip::default();
//! let mut world = ObjectTable::new();
//! let mut link = LoopbackLink::new();
//!
//! session.begin_update_processing();
//! for _ in 0..session.ticks_due(0.055) {
//!     let controls = RawControls { throttle: 1.0, ..Default::default() };
//!     session.step(&mut ship, &mut world, &mut link, controls, None);
//! }
//!
//! assert_eq!(link.take_sent().len(), 3);
//! ```

mod clock_sync;
mod error;
mod input_recorder;
mod physics;
mod reconciliation;
mod session;
mod smoothing;
mod snapshot_cache;
mod transport;
mod world;

pub use clock_sync::{
    interval_for_offset, ClockAdjustment, ClockStats, ClockSyncController, INTERVAL_BANDS,
};
pub use error::{Error, Result};
pub use input_recorder::{InputRecorder, DEFAULT_MOVE_HISTORY};
pub use physics::{ShipBody, ShipParams, SimpleShip};
pub use reconciliation::{ReconcileOutcome, Reconciler};
pub use session::{ClientSession, SessionStats, StepReport};
pub use smoothing::SmoothingOffset;
pub use snapshot_cache::{SnapshotCache, DEFAULT_SNAPSHOT_CACHE};
pub use transport::{LoopbackError, LoopbackLink, PacketLink};
pub use world::{ObjectTable, RemoteWorld};
