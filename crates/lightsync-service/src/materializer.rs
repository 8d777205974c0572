// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Translate light records into host calls.

use lightsync_port::{
    rgb8_to_linear, CoordinateProfile, HostError, HostHandle, LightHost, LightKind, LightRecord,
    LinearColor, Mobility, Rotator, Vec3,
};
use tracing::warn;

/// Point intensity multiplier from sender units to host units.
pub const POINT_INTENSITY_SCALE: f32 = 1000.0;
/// Spot intensity multiplier.
pub const SPOT_INTENSITY_SCALE: f32 = 1000.0;
/// Directional intensity multiplier; the host treats it as illuminance.
pub const DIRECTIONAL_INTENSITY_SCALE: f32 = 10.0;

/// Host intensity multiplier for a light kind.
pub const fn intensity_scale(kind: LightKind) -> f32 {
    match kind {
        LightKind::Point => POINT_INTENSITY_SCALE,
        LightKind::Directional => DIRECTIONAL_INTENSITY_SCALE,
        LightKind::Spot => SPOT_INTENSITY_SCALE,
    }
}

/// A record converted into host space.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    kind: LightKind,
    location: Vec3,
    rotation: Rotator,
    intensity: f32,
    color: LinearColor,
    cone: Option<(f32, f32)>,
}

impl Placement {
    fn new(record: &LightRecord, profile: &CoordinateProfile) -> Self {
        Self {
            kind: record.kind,
            location: profile.convert_position(record.position),
            rotation: profile.convert_orientation(&record.orientation),
            intensity: record.intensity * intensity_scale(record.kind),
            color: rgb8_to_linear(record.color),
            cone: (record.kind == LightKind::Spot)
                .then_some((record.cone.inner_deg, record.cone.outer_deg)),
        }
    }

    fn apply<H: LightHost + ?Sized>(
        &self,
        host: &mut H,
        handle: HostHandle,
    ) -> Result<(), HostError> {
        host.set_rotation(handle, self.rotation)?;
        host.set_intensity(handle, self.intensity)?;
        host.set_color(handle, self.color)?;
        if let Some((inner, outer)) = self.cone {
            host.set_cone_angles(handle, inner, outer)?;
        }
        Ok(())
    }
}

/// Create a fully configured, movable host light for `record`.
///
/// If configuration fails after the spawn, the half-built light is destroyed
/// before the error is returned.
pub fn materialize<H: LightHost + ?Sized>(
    host: &mut H,
    record: &LightRecord,
    profile: &CoordinateProfile,
) -> Result<HostHandle, HostError> {
    let placement = Placement::new(record, profile);
    let handle = host.spawn_light(placement.kind, placement.location, placement.rotation)?;
    if let Err(err) = configure(host, handle, &placement) {
        if let Err(cleanup) = host.destroy_light(handle) {
            warn!(%handle, %cleanup, "failed to destroy partially configured light");
        }
        return Err(err);
    }
    Ok(handle)
}

fn configure<H: LightHost + ?Sized>(
    host: &mut H,
    handle: HostHandle,
    placement: &Placement,
) -> Result<(), HostError> {
    host.set_mobility(handle, Mobility::Movable)?;
    placement.apply(host, handle)
}

/// Re-apply transform, intensity, color, and cone to an existing light of the same kind.
pub fn update<H: LightHost + ?Sized>(
    host: &mut H,
    handle: HostHandle,
    record: &LightRecord,
    profile: &CoordinateProfile,
) -> Result<(), HostError> {
    let placement = Placement::new(record, profile);
    host.set_location(handle, placement.location)?;
    placement.apply(host, handle)
}

/// Destroy every handle. Returns how many were destroyed.
///
/// Handles the host no longer knows are skipped with a warning. An empty
/// input is a no-op.
pub fn destroy_all<H, I>(host: &mut H, handles: I) -> usize
where
    H: LightHost + ?Sized,
    I: IntoIterator<Item = HostHandle>,
{
    let mut destroyed = 0;
    for handle in handles {
        match host.destroy_light(handle) {
            Ok(()) => destroyed += 1,
            Err(err) => warn!(%handle, %err, "light already gone"),
        }
    }
    destroyed
}
