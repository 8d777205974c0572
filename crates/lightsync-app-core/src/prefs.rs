// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved preferences for the light-sync listener and importer.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Config key under which [`SyncPrefs`] are stored.
pub const PREFS_KEY: &str = "light_sync";

/// Default TCP port the CAD sender connects to.
pub const DEFAULT_PORT: u16 = 5173;

/// Position convention of the JSON wire revision the sender speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireUnits {
    /// Centimeter-like sender units: swap X/Y, scale ×0.1.
    #[default]
    Centimeters,
    /// Meter sender units: swap X/Y, scale ×100.
    Meters,
}

/// How a decoded batch is reconciled against the materialized lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Destroy every materialized light, then create one per record.
    #[default]
    FullReplace,
    /// Same end state, reached by updating lights whose identity and kind
    /// survive. Batches without complete, unique identities fall back to
    /// full replace.
    KeyedDiff,
}

/// Light-sync preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPrefs {
    /// TCP port to listen on.
    pub port: u16,
    /// Interface to bind (all interfaces by default).
    pub bind_address: IpAddr,
    /// Wire revision position convention.
    pub wire_units: WireUnits,
    /// Legacy text file to import on request.
    pub legacy_file: Option<PathBuf>,
    /// Per-connection deadline for the whole payload; `None` waits forever.
    pub read_timeout_ms: Option<u64>,
    /// Largest accepted payload per connection.
    pub max_payload_bytes: usize,
    /// Socket receive buffer and read chunk size.
    pub recv_buffer_bytes: usize,
    /// Scene-thread polling interval for headless runs.
    pub tick_interval_ms: u64,
    /// Reconciliation policy.
    pub policy: ReconcilePolicy,
}

impl Default for SyncPrefs {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            wire_units: WireUnits::default(),
            legacy_file: None,
            read_timeout_ms: Some(30_000),
            max_payload_bytes: 8 * 1024 * 1024,
            recv_buffer_bytes: 64 * 1024,
            tick_interval_ms: 16,
            policy: ReconcilePolicy::default(),
        }
    }
}

impl SyncPrefs {
    /// Socket address the listener binds.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Read deadline as a duration.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Tick interval as a duration (at least 1 ms).
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces() {
        let prefs = SyncPrefs::default();
        assert_eq!(prefs.listen_addr(), "0.0.0.0:5173".parse().unwrap());
        assert_eq!(prefs.read_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(prefs.policy, ReconcilePolicy::FullReplace);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"port": 6000, "wire_units": "meters", "policy": "keyed_diff"}"#;
        let prefs: SyncPrefs = serde_json::from_str(json).unwrap();
        assert_eq!(prefs.port, 6000);
        assert_eq!(prefs.wire_units, WireUnits::Meters);
        assert_eq!(prefs.policy, ReconcilePolicy::KeyedDiff);
        assert_eq!(prefs.max_payload_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn null_timeout_disables_deadline() {
        let prefs: SyncPrefs = serde_json::from_str(r#"{"read_timeout_ms": null}"#).unwrap();
        assert_eq!(prefs.read_timeout(), None);
    }
}
