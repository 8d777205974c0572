// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Codecs and test harness for lightsync-port.
//!
//! This crate provides:
//! - JSON decode for one wire payload into a [`LightEventBatch`](lightsync_port::LightEventBatch)
//! - Legacy line decode for the flat text import format
//! - MockHost for headless testing of engines driving a `LightHost`
//!
//! # Design
//!
//! Decoding is pure: no logging, no host calls. Dropped and unsupported
//! entries are reported in the batch so callers decide what to log.

mod legacy;
mod mock_host;
mod wire;

pub use legacy::*;
pub use mock_host::*;
pub use wire::*;
