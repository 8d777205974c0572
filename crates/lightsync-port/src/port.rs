// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Light host trait defining the scene contract.

use core::fmt;

use crate::{HostError, LightKind, LinearColor, Rotator, Vec3};

/// Opaque reference to a light instantiated by a host.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostHandle(pub u64);

impl fmt::Display for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How often the host may move or relight a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mobility {
    /// Baked; never changes after load.
    Static,
    /// Fixed transform, adjustable color/intensity.
    Stationary,
    /// Fully dynamic; may change every frame.
    Movable,
}

/// Scene host port trait.
///
/// Implementors own real scene objects (a game engine's actors, a renderer's
/// nodes, a log). All methods are called from the scene thread only.
///
/// # Design
///
/// This trait is a hexagonal port. The reconciliation engine decides what
/// to create, update, and destroy; adapters implement this trait to do it.
///
/// # Rotation
///
/// `spawn_light` receives the rotation, but some hosts ignore it at
/// construction time. Callers set rotation again with `set_rotation` after
/// spawning; hosts that honor it at spawn may treat the second call as a no-op.
pub trait LightHost {
    /// Instantiate a light of `kind` at a world-space transform.
    fn spawn_light(
        &mut self,
        kind: LightKind,
        location: Vec3,
        rotation: Rotator,
    ) -> Result<HostHandle, HostError>;

    /// Move a light.
    fn set_location(&mut self, handle: HostHandle, location: Vec3) -> Result<(), HostError>;

    /// Re-orient a light.
    fn set_rotation(&mut self, handle: HostHandle, rotation: Rotator) -> Result<(), HostError>;

    /// Set intensity in host photometric units.
    fn set_intensity(&mut self, handle: HostHandle, intensity: f32) -> Result<(), HostError>;

    /// Set light color.
    fn set_color(&mut self, handle: HostHandle, color: LinearColor) -> Result<(), HostError>;

    /// Set component mobility.
    fn set_mobility(&mut self, handle: HostHandle, mobility: Mobility) -> Result<(), HostError>;

    /// Set spot cone angles in degrees. Only valid for spot lights.
    fn set_cone_angles(
        &mut self,
        handle: HostHandle,
        inner_deg: f32,
        outer_deg: f32,
    ) -> Result<(), HostError>;

    /// Remove a light from the scene.
    fn destroy_light(&mut self, handle: HostHandle) -> Result<(), HostError>;
}
