// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core light types shared by the codecs, the engine, and hosts.
//!
//! These types are pure domain objects with no serialization logic.
//! JSON and legacy line decoding is handled by lightsync-codec.

use core::fmt;
use core::str::FromStr;

/// 3D vector (positions and directions).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a (near-)zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if !len.is_finite() || len <= f32::EPSILON {
            return None;
        }
        Some(Self::new(self.x / len, self.y / len, self.z / len))
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X={:.3} Y={:.3} Z={:.3}", self.x, self.y, self.z)
    }
}

/// Euler rotation in degrees (host convention: pitch about Y, yaw about Z, roll about X).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotator {
    /// Pitch in degrees.
    pub pitch: f32,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Roll in degrees.
    pub roll: f32,
}

impl Rotator {
    /// No rotation.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a rotator from pitch/yaw/roll degrees.
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Sender color, 0–255 per channel (r, g, b).
pub type Rgb8 = [u8; 3];

/// Host color, 0.0–1.0 per channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearColor {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl LinearColor {
    /// Opaque white.
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
}

impl Default for LinearColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// The three light primitives a host can instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Omnidirectional light at a point.
    Point,
    /// Infinitely distant light (sun); only its rotation matters for lighting.
    Directional,
    /// Cone-shaped light with inner/outer angles.
    Spot,
}

impl LightKind {
    /// Sender type name for this kind (`"Point"`, `"Directional"`, `"Spot"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Directional => "Directional",
            Self::Spot => "Spot",
        }
    }
}

impl FromStr for LightKind {
    type Err = ();

    /// Exact, case-sensitive match on the sender's type names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Point" => Ok(Self::Point),
            "Directional" => Ok(Self::Directional),
            "Spot" => Ok(Self::Spot),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a record expresses where the light points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Orientation {
    /// Explicit pitch/yaw/roll degrees, forwarded unchanged.
    Rotation(Rotator),
    /// Direction vector in sender axes; normalized and converted by the profile.
    Direction(Vec3),
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Rotation(Rotator::ZERO)
    }
}

/// Spot cone angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotCone {
    /// Inner (full-intensity) cone angle.
    pub inner_deg: f32,
    /// Outer (falloff) cone angle.
    pub outer_deg: f32,
}

impl SpotCone {
    /// Angles used when the sender supplies none.
    pub const DEFAULT: Self = Self {
        inner_deg: 0.0,
        outer_deg: 45.0,
    };
}

impl Default for SpotCone {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One light's full description at a point in time, in sender units.
#[derive(Clone, Debug, PartialEq)]
pub struct LightRecord {
    /// Light primitive.
    pub kind: LightKind,
    /// Sender-side stable key, when the sender supplies one. The legacy format never does.
    pub identity: Option<String>,
    /// Position in sender axes and units.
    pub position: Vec3,
    /// Rotation or direction in sender convention.
    pub orientation: Orientation,
    /// Non-negative intensity in the sender's photometric unit.
    pub intensity: f32,
    /// Sender color.
    pub color: Rgb8,
    /// Cone angles; meaningful only for [`LightKind::Spot`].
    pub cone: SpotCone,
}

/// A well-formed light entry whose type is not one of the supported kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedLight {
    /// Position in the sender's `lights` array.
    pub index: usize,
    /// Type string the sender used.
    pub type_name: String,
}

/// A light entry that could not be decoded at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedLight {
    /// Position in the sender's `lights` array.
    pub index: usize,
    /// Human-readable decode failure.
    pub reason: String,
}

/// One decoded inbound payload.
///
/// A batch only exists if `lights.len() + unsupported.len() == declared_count`;
/// the codec rejects anything else in full.
#[derive(Clone, Debug, PartialEq)]
pub struct LightEventBatch {
    /// Free-form event tag (`"add"`, `"delete"`, `"modify"`, `"undelete"`, ...).
    pub event_type: String,
    /// Sender timestamp, when present.
    pub timestamp: Option<String>,
    /// Number of lights the sender asserted.
    pub declared_count: usize,
    /// Supported lights, in sender order.
    pub lights: Vec<LightRecord>,
    /// Well-formed entries with an unrecognized type; skipped at reconciliation.
    pub unsupported: Vec<UnsupportedLight>,
    /// Entries that failed to decode and were left out.
    pub dropped: Vec<DroppedLight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_exact_sender_names() {
        assert_eq!("Point".parse(), Ok(LightKind::Point));
        assert_eq!("Directional".parse(), Ok(LightKind::Directional));
        assert_eq!("Spot".parse(), Ok(LightKind::Spot));
        assert_eq!("Ambient".parse::<LightKind>(), Err(()));
        assert_eq!("point".parse::<LightKind>(), Err(()));
    }

    #[test]
    fn zero_vector_has_no_normal() {
        assert_eq!(Vec3::ZERO.normalized(), None);
        let n = Vec3::new(0.0, 3.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn spot_cone_defaults() {
        assert_eq!(SpotCone::default().inner_deg, 0.0);
        assert_eq!(SpotCone::default().outer_deg, 45.0);
    }
}
