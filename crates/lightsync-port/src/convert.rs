// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Unit and coordinate conversion from sender convention to host convention.
//!
//! Position and rotation conventions are deliberately NOT unified: positions
//! are axis-swapped and scaled per profile, explicit rotations pass through
//! unchanged. The sender side is external and fixed.

use crate::{LinearColor, Orientation, Rgb8, Rotator, Vec3};

/// Position convention for one protocol revision.
///
/// Each wire revision or file format declares its own profile; the converter
/// never guesses between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateProfile {
    /// Swap sender X and Y before scaling (sender is right-handed, host left-handed).
    pub swap_xy: bool,
    /// Multiplier from sender units to host units.
    pub scale: f32,
}

impl CoordinateProfile {
    /// JSON wire revision sending centimeter-like units: swap X/Y, ×0.1.
    pub const WIRE_CENTIMETERS: Self = Self {
        swap_xy: true,
        scale: 0.1,
    };

    /// JSON wire revision sending meters: swap X/Y, ×100.
    pub const WIRE_METERS: Self = Self {
        swap_xy: true,
        scale: 100.0,
    };

    /// Legacy line format: axes kept, ×0.1.
    pub const LEGACY: Self = Self {
        swap_xy: false,
        scale: 0.1,
    };

    fn remap(&self, v: Vec3) -> Vec3 {
        if self.swap_xy {
            Vec3::new(v.y, v.x, v.z)
        } else {
            v
        }
    }

    /// Convert a sender position into host world space.
    pub fn convert_position(&self, position: Vec3) -> Vec3 {
        let v = self.remap(position);
        Vec3::new(v.x * self.scale, v.y * self.scale, v.z * self.scale)
    }

    /// Resolve a sender orientation into a host rotator.
    ///
    /// Explicit rotations are forwarded as-is. Direction vectors get the same
    /// axis remap as positions (but no scale) and are then converted.
    pub fn convert_orientation(&self, orientation: &Orientation) -> Rotator {
        match orientation {
            Orientation::Rotation(rotation) => *rotation,
            Orientation::Direction(direction) => direction_to_rotator(self.remap(*direction)),
        }
    }
}

/// Convert a direction vector to a rotator (yaw from the horizontal
/// components, pitch from elevation, roll always zero).
///
/// A zero-length direction yields [`Rotator::ZERO`].
pub fn direction_to_rotator(direction: Vec3) -> Rotator {
    let Some(d) = direction.normalized() else {
        return Rotator::ZERO;
    };
    let yaw = d.y.atan2(d.x).to_degrees();
    let pitch = d.z.atan2(d.x.hypot(d.y)).to_degrees();
    Rotator::new(pitch, yaw, 0.0)
}

/// Convert 0–255 channels to 0.0–1.0 channels with opaque alpha.
pub fn rgb8_to_linear(color: Rgb8) -> LinearColor {
    let [r, g, b] = color;
    LinearColor {
        r: f32::from(r) / 255.0,
        g: f32::from(g) / 255.0,
        b: f32::from(b) / 255.0,
        a: 1.0,
    }
}
