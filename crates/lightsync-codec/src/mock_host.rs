// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock host for headless testing of LightHost drivers.
//!
//! MockHost tracks lights in a BTreeMap without any engine behind it and
//! records every call, so tests can assert both the resulting scene and the
//! exact operations that produced it.

use std::collections::{BTreeMap, HashSet};

use lightsync_port::{
    HostError, HostHandle, LightHost, LightKind, LinearColor, Mobility, Rotator, Vec3,
};

/// Scene-side state of one mock light.
#[derive(Clone, Debug, PartialEq)]
pub struct MockLight {
    /// Primitive spawned.
    pub kind: LightKind,
    /// World location.
    pub location: Vec3,
    /// World rotation.
    pub rotation: Rotator,
    /// Host-unit intensity.
    pub intensity: f32,
    /// Light color.
    pub color: LinearColor,
    /// Component mobility.
    pub mobility: Mobility,
    /// Spot cone (inner, outer) degrees, once set.
    pub cone: Option<(f32, f32)>,
}

/// One recorded host call.
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    /// `spawn_light` succeeded.
    Spawn(HostHandle, LightKind),
    /// `set_location`.
    SetLocation(HostHandle),
    /// `set_rotation`.
    SetRotation(HostHandle),
    /// `set_intensity`.
    SetIntensity(HostHandle),
    /// `set_color`.
    SetColor(HostHandle),
    /// `set_mobility`.
    SetMobility(HostHandle),
    /// `set_cone_angles`.
    SetConeAngles(HostHandle),
    /// `destroy_light`.
    Destroy(HostHandle),
}

/// Mock light host for testing.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Live lights keyed by handle (handles increase with spawn order).
    pub lights: BTreeMap<HostHandle, MockLight>,
    /// Every successful call, in order.
    pub calls: Vec<HostCall>,
    next_handle: u64,
    refused: HashSet<LightKind>,
}

impl MockHost {
    /// Create an empty mock host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `spawn_light` of `kind` fail with [`HostError::Refused`].
    pub fn refuse_spawns_of(&mut self, kind: LightKind) {
        self.refused.insert(kind);
    }

    /// Number of live lights.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Get a live light by handle.
    pub fn get_light(&self, handle: HostHandle) -> Option<&MockLight> {
        self.lights.get(&handle)
    }

    /// Live lights in spawn order.
    pub fn lights_in_order(&self) -> Vec<&MockLight> {
        self.lights.values().collect()
    }

    /// Count recorded calls matching a predicate.
    pub fn count_calls(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }

    /// Number of successful spawns so far.
    pub fn spawn_count(&self) -> usize {
        self.count_calls(|c| matches!(c, HostCall::Spawn(..)))
    }

    /// Number of successful destroys so far.
    pub fn destroy_count(&self) -> usize {
        self.count_calls(|c| matches!(c, HostCall::Destroy(_)))
    }

    /// Forget recorded calls (scene state is kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn light_mut(&mut self, handle: HostHandle) -> Result<&mut MockLight, HostError> {
        self.lights
            .get_mut(&handle)
            .ok_or(HostError::UnknownHandle(handle))
    }
}

impl LightHost for MockHost {
    fn spawn_light(
        &mut self,
        kind: LightKind,
        location: Vec3,
        rotation: Rotator,
    ) -> Result<HostHandle, HostError> {
        if self.refused.contains(&kind) {
            return Err(HostError::Refused(kind));
        }
        self.next_handle += 1;
        let handle = HostHandle(self.next_handle);
        self.lights.insert(
            handle,
            MockLight {
                kind,
                location,
                rotation,
                intensity: 1.0,
                color: LinearColor::WHITE,
                mobility: Mobility::Static,
                cone: None,
            },
        );
        self.calls.push(HostCall::Spawn(handle, kind));
        Ok(handle)
    }

    fn set_location(&mut self, handle: HostHandle, location: Vec3) -> Result<(), HostError> {
        self.light_mut(handle)?.location = location;
        self.calls.push(HostCall::SetLocation(handle));
        Ok(())
    }

    fn set_rotation(&mut self, handle: HostHandle, rotation: Rotator) -> Result<(), HostError> {
        self.light_mut(handle)?.rotation = rotation;
        self.calls.push(HostCall::SetRotation(handle));
        Ok(())
    }

    fn set_intensity(&mut self, handle: HostHandle, intensity: f32) -> Result<(), HostError> {
        self.light_mut(handle)?.intensity = intensity;
        self.calls.push(HostCall::SetIntensity(handle));
        Ok(())
    }

    fn set_color(&mut self, handle: HostHandle, color: LinearColor) -> Result<(), HostError> {
        self.light_mut(handle)?.color = color;
        self.calls.push(HostCall::SetColor(handle));
        Ok(())
    }

    fn set_mobility(&mut self, handle: HostHandle, mobility: Mobility) -> Result<(), HostError> {
        self.light_mut(handle)?.mobility = mobility;
        self.calls.push(HostCall::SetMobility(handle));
        Ok(())
    }

    fn set_cone_angles(
        &mut self,
        handle: HostHandle,
        inner_deg: f32,
        outer_deg: f32,
    ) -> Result<(), HostError> {
        let light = self.light_mut(handle)?;
        if light.kind != LightKind::Spot {
            return Err(HostError::Backend(format!(
                "cone angles on {} light {handle}",
                light.kind
            )));
        }
        light.cone = Some((inner_deg, outer_deg));
        self.calls.push(HostCall::SetConeAngles(handle));
        Ok(())
    }

    fn destroy_light(&mut self, handle: HostHandle) -> Result<(), HostError> {
        self.lights
            .remove(&handle)
            .ok_or(HostError::UnknownHandle(handle))?;
        self.calls.push(HostCall::Destroy(handle));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_then_configure() {
        let mut host = MockHost::new();
        let handle = host
            .spawn_light(LightKind::Spot, Vec3::new(1.0, 2.0, 3.0), Rotator::ZERO)
            .expect("spawn failed");
        host.set_intensity(handle, 1000.0).expect("intensity");
        host.set_cone_angles(handle, 10.0, 40.0).expect("cone");

        let light = host.get_light(handle).unwrap();
        assert_eq!(light.location, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(light.intensity, 1000.0);
        assert_eq!(light.cone, Some((10.0, 40.0)));
        assert_eq!(host.spawn_count(), 1);
    }

    #[test]
    fn handles_increase_in_spawn_order() {
        let mut host = MockHost::new();
        let a = host
            .spawn_light(LightKind::Point, Vec3::ZERO, Rotator::ZERO)
            .unwrap();
        let b = host
            .spawn_light(LightKind::Point, Vec3::ZERO, Rotator::ZERO)
            .unwrap();
        assert!(a < b);
    }

    #[test]
    fn refused_kind_fails_to_spawn() {
        let mut host = MockHost::new();
        host.refuse_spawns_of(LightKind::Directional);
        assert_eq!(
            host.spawn_light(LightKind::Directional, Vec3::ZERO, Rotator::ZERO),
            Err(HostError::Refused(LightKind::Directional))
        );
        assert!(host
            .spawn_light(LightKind::Point, Vec3::ZERO, Rotator::ZERO)
            .is_ok());
        assert_eq!(host.light_count(), 1);
    }

    #[test]
    fn cone_angles_only_on_spots() {
        let mut host = MockHost::new();
        let handle = host
            .spawn_light(LightKind::Point, Vec3::ZERO, Rotator::ZERO)
            .unwrap();
        assert!(matches!(
            host.set_cone_angles(handle, 0.0, 45.0),
            Err(HostError::Backend(_))
        ));
    }

    #[test]
    fn destroy_unknown_handle_errors() {
        let mut host = MockHost::new();
        let handle = host
            .spawn_light(LightKind::Point, Vec3::ZERO, Rotator::ZERO)
            .unwrap();
        host.destroy_light(handle).expect("destroy");
        assert_eq!(
            host.destroy_light(handle),
            Err(HostError::UnknownHandle(handle))
        );
        assert_eq!(host.destroy_count(), 1);
        assert_eq!(host.light_count(), 0);
    }
}
