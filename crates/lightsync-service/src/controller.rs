// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Control surface for the UI collaborator: start, stop, import, and tick.

use std::net::SocketAddr;
use std::path::Path;

use lightsync_app_core::prefs::{SyncPrefs, WireUnits};
use lightsync_port::{CoordinateProfile, LightHost};
use tokio::runtime::Handle;

use crate::acceptor::{payload_queue, Acceptor, BindError, ConnectionState, ReadLimits};
use crate::engine::{DrainReport, ImportReport, LegacyImportError, SyncEngine};

/// Coordinate profile for a configured wire revision.
pub const fn wire_profile(units: WireUnits) -> CoordinateProfile {
    match units {
        WireUnits::Centimeters => CoordinateProfile::WIRE_CENTIMETERS,
        WireUnits::Meters => CoordinateProfile::WIRE_METERS,
    }
}

/// Acceptor and engine wired together from [`SyncPrefs`].
///
/// Every method must be called from the scene thread; network work runs on
/// the runtime passed to [`LightSyncController::new`].
pub struct LightSyncController<H> {
    prefs: SyncPrefs,
    acceptor: Acceptor,
    engine: SyncEngine<H>,
}

impl<H: LightHost> LightSyncController<H> {
    /// Build a stopped controller driving `host`.
    pub fn new(host: H, prefs: SyncPrefs, runtime: Handle) -> Self {
        let (sender, inbox) = payload_queue();
        let acceptor = Acceptor::new(runtime, sender, ReadLimits::from(&prefs));
        let engine = SyncEngine::new(host, inbox, wire_profile(prefs.wire_units), prefs.policy);
        Self {
            prefs,
            acceptor,
            engine,
        }
    }

    /// Bind the configured address and start accepting payloads.
    pub fn start_listening(&mut self) -> Result<SocketAddr, BindError> {
        self.acceptor.start(self.prefs.listen_addr())
    }

    /// Close the listener, then apply whatever is already queued.
    pub fn stop_listening(&mut self) -> DrainReport {
        self.acceptor.stop();
        self.engine.drain_and_apply()
    }

    /// Import a legacy text file as a full-replace batch.
    pub fn import_legacy_file(&mut self, path: &Path) -> Result<ImportReport, LegacyImportError> {
        self.engine.apply_legacy_file(path)
    }

    /// Import the legacy file named in prefs. `None` when no file is configured.
    pub fn import_configured_legacy_file(
        &mut self,
    ) -> Option<Result<ImportReport, LegacyImportError>> {
        let path = self.prefs.legacy_file.clone()?;
        Some(self.engine.apply_legacy_file(&path))
    }

    /// One scene-thread poll: drain and apply queued payloads.
    pub fn tick(&mut self) -> DrainReport {
        self.engine.drain_and_apply()
    }

    /// Listener state.
    pub fn state(&self) -> ConnectionState {
        self.acceptor.state()
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// Preferences this controller was built from.
    pub fn prefs(&self) -> &SyncPrefs {
        &self.prefs
    }

    /// Borrow the engine.
    pub fn engine(&self) -> &SyncEngine<H> {
        &self.engine
    }

    /// Mutably borrow the engine.
    pub fn engine_mut(&mut self) -> &mut SyncEngine<H> {
        &mut self.engine
    }
}
