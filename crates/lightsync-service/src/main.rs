// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless light-sync runner: listens for CAD payloads and logs the scene
//! operations they produce.

use std::time::Duration;

use anyhow::Result;
use lightsync_app_core::config::ConfigService;
use lightsync_app_core::prefs::{SyncPrefs, PREFS_KEY};
use lightsync_config_fs::FsConfigStore;
use lightsync_service::{LightSyncController, TracingHost};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = load_prefs();
    let tick = prefs.tick_interval();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lightsync-net")
        .build()?;

    let (stop_tx, mut stop_rx) = oneshot::channel();
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("ctrl-c received; stopping"),
            Err(err) => warn!(%err, "cannot listen for ctrl-c; stopping"),
        }
        let _ = stop_tx.send(());
    });

    // The main thread is the scene thread from here on.
    let mut controller =
        LightSyncController::new(TracingHost::new(), prefs, runtime.handle().clone());
    if let Some(Err(err)) = controller.import_configured_legacy_file() {
        warn!(%err, "legacy import skipped");
    }
    let addr = controller.start_listening()?;
    info!(%addr, "light sync ready");

    while matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
        controller.tick();
        std::thread::sleep(tick);
    }

    let report = controller.stop_listening();
    info!(?report, "final drain complete");
    drop(controller);
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

/// Load prefs, persisting defaults on first run. Falls back to defaults on any error.
fn load_prefs() -> SyncPrefs {
    let config = match FsConfigStore::new() {
        Ok(store) => ConfigService::new(store),
        Err(err) => {
            warn!(%err, "config directory unavailable; using defaults");
            return SyncPrefs::default();
        }
    };
    config
        .load_or_init::<SyncPrefs>(PREFS_KEY)
        .unwrap_or_else(|err| {
            warn!(%err, "failed to load prefs; using defaults");
            SyncPrefs::default()
        })
}
