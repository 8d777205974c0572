// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless host that logs every scene operation instead of rendering.

use std::collections::BTreeSet;

use lightsync_port::{
    HostError, HostHandle, LightHost, LightKind, LinearColor, Mobility, Rotator, Vec3,
};
use tracing::info;

/// A [`LightHost`] with no scene behind it; each call becomes a `tracing` event.
#[derive(Debug, Default)]
pub struct TracingHost {
    live: BTreeSet<HostHandle>,
    next_handle: u64,
}

impl TracingHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live lights.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn check(&self, handle: HostHandle) -> Result<(), HostError> {
        if self.live.contains(&handle) {
            Ok(())
        } else {
            Err(HostError::UnknownHandle(handle))
        }
    }
}

impl LightHost for TracingHost {
    fn spawn_light(
        &mut self,
        kind: LightKind,
        location: Vec3,
        rotation: Rotator,
    ) -> Result<HostHandle, HostError> {
        self.next_handle += 1;
        let handle = HostHandle(self.next_handle);
        self.live.insert(handle);
        info!(%handle, %kind, %location, ?rotation, "spawn light");
        Ok(handle)
    }

    fn set_location(&mut self, handle: HostHandle, location: Vec3) -> Result<(), HostError> {
        self.check(handle)?;
        info!(%handle, %location, "set location");
        Ok(())
    }

    fn set_rotation(&mut self, handle: HostHandle, rotation: Rotator) -> Result<(), HostError> {
        self.check(handle)?;
        info!(%handle, ?rotation, "set rotation");
        Ok(())
    }

    fn set_intensity(&mut self, handle: HostHandle, intensity: f32) -> Result<(), HostError> {
        self.check(handle)?;
        info!(%handle, intensity, "set intensity");
        Ok(())
    }

    fn set_color(&mut self, handle: HostHandle, color: LinearColor) -> Result<(), HostError> {
        self.check(handle)?;
        info!(%handle, r = color.r, g = color.g, b = color.b, "set color");
        Ok(())
    }

    fn set_mobility(&mut self, handle: HostHandle, mobility: Mobility) -> Result<(), HostError> {
        self.check(handle)?;
        info!(%handle, ?mobility, "set mobility");
        Ok(())
    }

    fn set_cone_angles(
        &mut self,
        handle: HostHandle,
        inner_deg: f32,
        outer_deg: f32,
    ) -> Result<(), HostError> {
        self.check(handle)?;
        info!(%handle, inner_deg, outer_deg, "set cone angles");
        Ok(())
    }

    fn destroy_light(&mut self, handle: HostHandle) -> Result<(), HostError> {
        if !self.live.remove(&handle) {
            return Err(HostError::UnknownHandle(handle));
        }
        info!(%handle, "destroy light");
        Ok(())
    }
}
