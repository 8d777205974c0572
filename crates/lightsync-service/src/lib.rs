// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Light-sync service: receives CAD light payloads over TCP and reconciles
//! them into a host scene.
//!
//! Network work (accept, read) runs on a tokio runtime and only ever enqueues
//! text. Decoding, reconciliation, and every [`lightsync_port::LightHost`]
//! call happen on the scene thread via [`LightSyncController::tick`].

pub mod acceptor;
pub mod controller;
pub mod engine;
pub mod materializer;
mod tracing_host;

pub use acceptor::{
    payload_queue, Acceptor, BindError, ConnectionState, InboundPayload, PayloadReceiver,
    PayloadSender, ReadError, ReadLimits,
};
pub use controller::{wire_profile, LightSyncController};
pub use engine::{
    ApplyReport, DrainReport, ImportReport, LegacyImportError, MaterializedLight, SyncEngine,
};
pub use tracing_host::TracingHost;
