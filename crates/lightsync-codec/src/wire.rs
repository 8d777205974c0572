// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON decoding for one wire payload.
//!
//! A payload is a single complete JSON document (framing is the acceptor's
//! job). Both protocol revisions are accepted: lights may carry an explicit
//! `rotation` object or a `direction` vector.

use lightsync_port::{
    DroppedLight, LightEventBatch, LightKind, LightRecord, Orientation, Rotator, SpotCone,
    UnsupportedLight, Vec3,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Whole-payload decode failure. The batch is rejected; nothing is applied.
#[derive(Debug, Error)]
pub enum WireDecodeError {
    /// Payload bytes are not UTF-8.
    #[error("payload is not valid utf-8: {0}")]
    Utf8(#[from] core::str::Utf8Error),
    /// Not JSON, or missing/mistyped `event`, `lightCount`, or `lights`.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Fewer (or more) usable entries than the sender declared; likely a truncated read.
    #[error("payload declares {declared} lights but {decoded} decoded")]
    CountMismatch {
        /// `lightCount` from the envelope.
        declared: usize,
        /// Supported plus unsupported-but-well-formed entries.
        decoded: usize,
    },
}

/// Single-entry decode failure. The entry is dropped; decoding continues.
#[derive(Debug, Error)]
pub enum LightDecodeError {
    /// Missing or mistyped required field (`type`, `location`, `intensity`, `color`).
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),
    /// Intensity below zero.
    #[error("negative intensity {0}")]
    NegativeIntensity(f32),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    event: String,
    light_count: usize,
    lights: Vec<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLight {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    id: Option<WireIdentity>,
    location: WireVec3,
    #[serde(default)]
    rotation: Option<WireRotation>,
    #[serde(default)]
    direction: Option<WireVec3>,
    intensity: f32,
    color: WireColor,
    #[serde(default)]
    spot_light: Option<WireSpot>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireIdentity {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
struct WireVec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Deserialize)]
struct WireRotation {
    pitch: f32,
    yaw: f32,
    roll: f32,
}

#[derive(Deserialize)]
struct WireColor {
    r: u8,
    g: u8,
    b: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSpot {
    inner_angle: f32,
    outer_angle: f32,
}

enum Entry {
    Supported(LightRecord),
    Unsupported(String),
}

/// Decode one payload received from the network.
pub fn decode_batch(bytes: &[u8]) -> Result<LightEventBatch, WireDecodeError> {
    decode_batch_str(core::str::from_utf8(bytes)?)
}

/// Decode one payload already known to be text.
///
/// Entry-level failures drop the entry; an entry with an unrecognized
/// `type` is kept as [`UnsupportedLight`] and still counts toward
/// `lightCount`. The batch is rejected when the count does not match.
pub fn decode_batch_str(text: &str) -> Result<LightEventBatch, WireDecodeError> {
    let envelope: WireEnvelope = serde_json::from_str(text)?;

    let mut lights = Vec::with_capacity(envelope.lights.len());
    let mut unsupported = Vec::new();
    let mut dropped = Vec::new();
    for (index, value) in envelope.lights.into_iter().enumerate() {
        match decode_entry(value) {
            Ok(Entry::Supported(record)) => lights.push(record),
            Ok(Entry::Unsupported(type_name)) => {
                unsupported.push(UnsupportedLight { index, type_name });
            }
            Err(err) => dropped.push(DroppedLight {
                index,
                reason: err.to_string(),
            }),
        }
    }

    let decoded = lights.len() + unsupported.len();
    if decoded != envelope.light_count {
        return Err(WireDecodeError::CountMismatch {
            declared: envelope.light_count,
            decoded,
        });
    }

    Ok(LightEventBatch {
        event_type: envelope.event,
        timestamp: envelope
            .timestamp
            .and_then(|ts| ts.as_str().map(str::to_owned)),
        declared_count: envelope.light_count,
        lights,
        unsupported,
        dropped,
    })
}

fn decode_entry(value: Value) -> Result<Entry, LightDecodeError> {
    let light: WireLight = serde_json::from_value(value)?;
    if light.intensity < 0.0 {
        return Err(LightDecodeError::NegativeIntensity(light.intensity));
    }
    let Ok(kind) = light.type_name.parse::<LightKind>() else {
        return Ok(Entry::Unsupported(light.type_name));
    };

    // Explicit rotation wins when a sender emits both encodings.
    let orientation = match (light.rotation, light.direction) {
        (Some(r), _) => Orientation::Rotation(Rotator::new(r.pitch, r.yaw, r.roll)),
        (None, Some(d)) => Orientation::Direction(Vec3::new(d.x, d.y, d.z)),
        (None, None) => Orientation::default(),
    };
    let cone = light.spot_light.map_or(SpotCone::DEFAULT, |s| SpotCone {
        inner_deg: s.inner_angle,
        outer_deg: s.outer_angle,
    });

    Ok(Entry::Supported(LightRecord {
        kind,
        identity: light.id.map(|id| match id {
            WireIdentity::Text(s) => s,
            WireIdentity::Number(n) => n.to_string(),
        }),
        position: Vec3::new(light.location.x, light.location.y, light.location.z),
        orientation,
        intensity: light.intensity,
        color: [light.color.r, light.color.g, light.color.b],
        cone,
    }))
}
