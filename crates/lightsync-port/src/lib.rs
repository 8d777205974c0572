// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene host port contract for light synchronization.
//!
//! This crate defines the light records a CAD sender describes and the
//! contract between the reconciliation engine and the host 3D scene.
//! It contains NO serialization logic; that lives in lightsync-codec.
//!
//! # Design Principles
//!
//! - **Hosts are dumb**: they spawn, move, recolor, and destroy lights. No diffing.
//! - **Sender units stay in records**: [`LightRecord`] keeps the sender's
//!   convention; [`CoordinateProfile`] converts at materialization time.
//! - **Scene thread only**: every [`LightHost`] call happens on the thread
//!   that owns the scene.

use thiserror::Error;

/// Error type for host scene operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host declined to create the light (no world, spawn collision, etc.).
    #[error("host refused to spawn {0} light")]
    Refused(LightKind),
    /// The handle does not name a live light in the host scene.
    #[error("unknown light handle {0}")]
    UnknownHandle(HostHandle),
    /// A backend-specific error occurred.
    #[error("backend error: {0}")]
    Backend(String),
}

mod convert;
mod port;
mod types;

pub use convert::{direction_to_rotator, rgb8_to_linear, CoordinateProfile};
pub use port::{HostHandle, LightHost, Mobility};
pub use types::{
    DroppedLight, LightEventBatch, LightKind, LightRecord, LinearColor, Orientation, Rgb8,
    Rotator, SpotCone, UnsupportedLight, Vec3,
};
