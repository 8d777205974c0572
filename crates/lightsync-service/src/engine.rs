// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reconciliation engine: the single scene-thread consumer of the payload queue.
//!
//! The engine owns the set of materialized lights. Every successfully decoded
//! batch becomes the complete new set; failed decodes leave the set untouched.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use lightsync_app_core::prefs::ReconcilePolicy;
use lightsync_codec::{
    decode_batch_str, decode_legacy_bytes, decode_line, is_skippable_line, WireDecodeError,
};
use lightsync_port::{CoordinateProfile, HostHandle, LightHost, LightRecord};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::acceptor::PayloadReceiver;
use crate::materializer::{destroy_all, materialize, update};

/// A light instantiated in the host scene, and the record it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedLight {
    /// Host-side handle.
    pub handle: HostHandle,
    /// Record last used to create or update the light (sender units).
    pub record: LightRecord,
}

/// Host operations performed for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Lights spawned.
    pub created: usize,
    /// Lights updated in place (keyed diff only).
    pub updated: usize,
    /// Lights kept without any host call (keyed diff only, identical record).
    pub unchanged: usize,
    /// Lights destroyed.
    pub destroyed: usize,
    /// Records the host refused.
    pub skipped: usize,
}

impl ApplyReport {
    fn absorb(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.destroyed += other.destroyed;
        self.skipped += other.skipped;
    }
}

/// Outcome of one [`SyncEngine::drain_and_apply`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Payloads dequeued.
    pub payloads: usize,
    /// Payloads decoded and applied.
    pub applied: usize,
    /// Payloads rejected at decode.
    pub rejected: usize,
    /// Host operations summed over applied batches.
    pub lights: ApplyReport,
}

/// Outcome of a legacy import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Non-comment, non-blank lines seen.
    pub lines: usize,
    /// Lines that failed to decode.
    pub rejected_lines: usize,
    /// Host operations for the resulting batch.
    pub lights: ApplyReport,
}

/// Legacy import failure. Materialized state is untouched.
#[derive(Debug, Error)]
pub enum LegacyImportError {
    /// The file could not be read as text.
    #[error("failed to read legacy file {}: {source}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Scene-thread reconciliation engine over a [`LightHost`].
pub struct SyncEngine<H> {
    host: H,
    inbox: PayloadReceiver,
    wire_profile: CoordinateProfile,
    policy: ReconcilePolicy,
    materialized: Vec<MaterializedLight>,
}

impl<H: LightHost> SyncEngine<H> {
    /// Create an engine with nothing materialized.
    pub fn new(
        host: H,
        inbox: PayloadReceiver,
        wire_profile: CoordinateProfile,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            host,
            inbox,
            wire_profile,
            policy,
            materialized: Vec::new(),
        }
    }

    /// Apply the payloads queued when the call starts, in FIFO order, then return.
    ///
    /// Payloads enqueued during the drain wait for the next call. A payload
    /// that fails to decode is logged and skipped.
    pub fn drain_and_apply(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        let pending = self.inbox.len();
        for _ in 0..pending {
            let Ok(payload) = self.inbox.try_recv() else {
                break;
            };
            report.payloads += 1;
            debug!(peer = %payload.peer, bytes = payload.text.len(), "applying payload");
            match self.apply_payload(&payload.text) {
                Ok(lights) => {
                    report.applied += 1;
                    report.lights.absorb(lights);
                }
                Err(_) => report.rejected += 1,
            }
        }
        report
    }

    /// Decode one wire payload and, if valid, reconcile it.
    pub fn apply_payload(&mut self, text: &str) -> Result<ApplyReport, WireDecodeError> {
        let batch = decode_batch_str(text)
            .inspect_err(|err| warn!(%err, "light batch rejected; scene unchanged"))?;
        info!(
            event = %batch.event_type,
            timestamp = batch.timestamp.as_deref().unwrap_or("-"),
            count = batch.declared_count,
            "light batch decoded"
        );
        for entry in &batch.unsupported {
            warn!(
                index = entry.index,
                type_name = %entry.type_name,
                "unsupported light type skipped"
            );
        }
        for entry in &batch.dropped {
            warn!(index = entry.index, reason = %entry.reason, "malformed light entry dropped");
        }
        let profile = self.wire_profile;
        Ok(self.apply_records(&batch.lights, &profile))
    }

    /// Reconcile already-decoded records (sender units in `profile`) under the engine's policy.
    pub fn apply_records(
        &mut self,
        records: &[LightRecord],
        profile: &CoordinateProfile,
    ) -> ApplyReport {
        let report = match self.policy {
            ReconcilePolicy::FullReplace => self.full_replace(records, profile),
            ReconcilePolicy::KeyedDiff if has_unique_identities(records) => {
                self.keyed_diff(records, profile)
            }
            ReconcilePolicy::KeyedDiff => {
                debug!("batch lacks unique identities; falling back to full replace");
                self.full_replace(records, profile)
            }
        };
        debug!(?report, live = self.materialized.len(), "batch reconciled");
        report
    }

    /// Read a legacy text file and apply it as one full-replace batch.
    ///
    /// A read failure leaves the scene untouched. Lines that fail to decode are
    /// skipped. Bytes are decoded with [`decode_legacy_bytes`], so a byte order
    /// mark or Latin-1 degree signs do not fail the import.
    pub fn apply_legacy_file(&mut self, path: &Path) -> Result<ImportReport, LegacyImportError> {
        let bytes = std::fs::read(path).map_err(|source| LegacyImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let report = self.apply_legacy_text(&decode_legacy_bytes(&bytes));
        info!(
            path = %path.display(),
            lines = report.lines,
            rejected = report.rejected_lines,
            created = report.lights.created,
            "legacy file imported"
        );
        Ok(report)
    }

    /// Apply legacy lines already in memory.
    pub fn apply_legacy_text(&mut self, text: &str) -> ImportReport {
        let mut report = ImportReport::default();
        let mut records = Vec::new();
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        for (number, line) in text.lines().enumerate() {
            if is_skippable_line(line) {
                continue;
            }
            report.lines += 1;
            match decode_line(line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    report.rejected_lines += 1;
                    warn!(line = number + 1, %err, "legacy line skipped");
                }
            }
        }
        report.lights = self.apply_records(&records, &CoordinateProfile::LEGACY);
        report
    }

    /// Destroy every materialized light. Returns how many were destroyed.
    pub fn clear(&mut self) -> usize {
        destroy_all(
            &mut self.host,
            self.materialized.drain(..).map(|light| light.handle),
        )
    }

    /// Lights currently materialized, in batch order.
    pub fn materialized(&self) -> &[MaterializedLight] {
        &self.materialized
    }

    /// Active reconciliation policy.
    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Position convention applied to wire payloads.
    pub fn wire_profile(&self) -> CoordinateProfile {
        self.wire_profile
    }

    /// Borrow the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutably borrow the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn full_replace(
        &mut self,
        records: &[LightRecord],
        profile: &CoordinateProfile,
    ) -> ApplyReport {
        let mut report = ApplyReport {
            destroyed: self.clear(),
            ..ApplyReport::default()
        };
        for (index, record) in records.iter().enumerate() {
            self.create(index, record, profile, &mut report);
        }
        report
    }

    fn keyed_diff(
        &mut self,
        records: &[LightRecord],
        profile: &CoordinateProfile,
    ) -> ApplyReport {
        let wanted: HashSet<&str> = records.iter().filter_map(|r| r.identity.as_deref()).collect();
        let mut stale = Vec::new();
        let mut previous: HashMap<String, MaterializedLight> = HashMap::new();
        for light in self.materialized.drain(..) {
            match light.record.identity.clone() {
                Some(id) if wanted.contains(id.as_str()) => {
                    if let Some(duplicate) = previous.insert(id, light) {
                        stale.push(duplicate.handle);
                    }
                }
                _ => stale.push(light.handle),
            }
        }

        let mut report = ApplyReport {
            destroyed: destroy_all(&mut self.host, stale),
            ..ApplyReport::default()
        };
        for (index, record) in records.iter().enumerate() {
            let prior = record.identity.as_ref().and_then(|id| previous.remove(id));
            match prior {
                Some(prior) if prior.record == *record => {
                    report.unchanged += 1;
                    self.materialized.push(prior);
                }
                Some(prior) if prior.record.kind == record.kind => {
                    match update(&mut self.host, prior.handle, record, profile) {
                        Ok(()) => {
                            report.updated += 1;
                            self.materialized.push(MaterializedLight {
                                handle: prior.handle,
                                record: record.clone(),
                            });
                        }
                        Err(err) => {
                            warn!(index, %err, "in-place update failed; recreating light");
                            report.destroyed += destroy_all(&mut self.host, [prior.handle]);
                            self.create(index, record, profile, &mut report);
                        }
                    }
                }
                Some(prior) => {
                    report.destroyed += destroy_all(&mut self.host, [prior.handle]);
                    self.create(index, record, profile, &mut report);
                }
                None => self.create(index, record, profile, &mut report),
            }
        }
        report
    }

    fn create(
        &mut self,
        index: usize,
        record: &LightRecord,
        profile: &CoordinateProfile,
        report: &mut ApplyReport,
    ) {
        match materialize(&mut self.host, record, profile) {
            Ok(handle) => {
                report.created += 1;
                self.materialized.push(MaterializedLight {
                    handle,
                    record: record.clone(),
                });
            }
            Err(err) => {
                report.skipped += 1;
                warn!(index, kind = %record.kind, %err, "host refused light; skipped");
            }
        }
    }
}

/// True when every record has an identity and none repeat.
fn has_unique_identities(records: &[LightRecord]) -> bool {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .all(|record| record.identity.as_deref().is_some_and(|id| seen.insert(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::{payload_queue, InboundPayload, PayloadSender};
    use lightsync_codec::{HostCall, MockHost};
    use lightsync_port::{HostError, LightKind, LinearColor, Mobility, Rotator, Vec3};

    fn engine(policy: ReconcilePolicy) -> (SyncEngine<MockHost>, PayloadSender) {
        let (tx, rx) = payload_queue();
        let engine = SyncEngine::new(
            MockHost::new(),
            rx,
            CoordinateProfile::WIRE_CENTIMETERS,
            policy,
        );
        (engine, tx)
    }

    fn send(tx: &PayloadSender, text: &str) {
        tx.send(InboundPayload {
            peer: "127.0.0.1:40000".parse().unwrap(),
            text: text.to_owned(),
        })
        .unwrap();
    }

    const TWO_LIGHTS: &str = r#"{
        "event": "add",
        "lightCount": 2,
        "lights": [
            {"type": "Point", "location": {"x": 10, "y": 20, "z": 30},
             "rotation": {"pitch": 0, "yaw": 0, "roll": 0},
             "intensity": 2, "color": {"r": 255, "g": 0, "b": 128}},
            {"type": "Directional", "location": {"x": 0, "y": 0, "z": 0},
             "direction": {"x": 0, "y": 0, "z": -1},
             "intensity": 3, "color": {"r": 255, "g": 255, "b": 255}}
        ]
    }"#;

    fn keyed(ids: &[(&str, &str, f32)]) -> String {
        let lights: Vec<String> = ids
            .iter()
            .map(|(id, kind, x)| {
                format!(
                    r#"{{"id": "{id}", "type": "{kind}", "location": {{"x": {x}, "y": 0, "z": 0}},
                        "intensity": 1, "color": {{"r": 1, "g": 2, "b": 3}}}}"#
                )
            })
            .collect();
        format!(
            r#"{{"event": "modify", "lightCount": {}, "lights": [{}]}}"#,
            ids.len(),
            lights.join(",")
        )
    }

    #[test]
    fn batch_materializes_scaled_lights() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        send(&tx, TWO_LIGHTS);
        let report = engine.drain_and_apply();
        assert_eq!(report.payloads, 1);
        assert_eq!(report.applied, 1);
        assert_eq!(report.lights.created, 2);

        let lights = engine.host().lights_in_order();
        assert_eq!(lights[0].kind, LightKind::Point);
        assert_eq!(lights[0].intensity, 2000.0);
        assert_eq!(lights[0].location, Vec3::new(2.0, 1.0, 3.0));
        assert!((lights[0].color.b - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(lights[1].kind, LightKind::Directional);
        assert_eq!(lights[1].intensity, 30.0);
        assert!((lights[1].rotation.pitch + 90.0).abs() < 1e-4);
    }

    #[test]
    fn same_batch_twice_is_idempotent() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        send(&tx, TWO_LIGHTS);
        engine.drain_and_apply();
        let first: Vec<_> = engine.host().lights_in_order().into_iter().cloned().collect();

        send(&tx, TWO_LIGHTS);
        let report = engine.drain_and_apply();
        let second: Vec<_> = engine.host().lights_in_order().into_iter().cloned().collect();

        assert_eq!(report.lights.destroyed, 2);
        assert_eq!(report.lights.created, 2);
        assert_eq!(first, second);
        assert_eq!(engine.materialized().len(), 2);
    }

    #[test]
    fn count_mismatch_rejects_whole_batch() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        let text = r#"{"event": "add", "lightCount": 3, "lights": [
            {"type": "Point", "location": {"x": 1, "y": 1, "z": 1}, "intensity": 1,
             "color": {"r": 0, "g": 0, "b": 0}},
            {"type": "Point", "location": {"x": 2, "y": 2, "z": 2}, "intensity": 1,
             "color": {"r": 0, "g": 0, "b": 0}},
            {"type": "Point", "location": {"x": 3, "y": 3}, "intensity": 1,
             "color": {"r": 0, "g": 0, "b": 0}}
        ]}"#;
        send(&tx, text);
        let report = engine.drain_and_apply();
        assert_eq!(report.rejected, 1);
        assert_eq!(engine.host().light_count(), 0);
        assert!(engine.host().calls.is_empty());
    }

    #[test]
    fn rejected_batch_keeps_prior_scene() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        send(&tx, TWO_LIGHTS);
        send(&tx, "{not json");
        let report = engine.drain_and_apply();
        assert_eq!(report.payloads, 2);
        assert_eq!(report.applied, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(engine.host().light_count(), 2);
    }

    #[test]
    fn unknown_type_is_skipped_but_siblings_apply() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        let text = r#"{"event": "add", "lightCount": 2, "lights": [
            {"type": "Ambient", "location": {"x": 1, "y": 1, "z": 1}, "intensity": 1,
             "color": {"r": 0, "g": 0, "b": 0}},
            {"type": "Spot", "location": {"x": 2, "y": 2, "z": 2}, "intensity": 1,
             "color": {"r": 0, "g": 0, "b": 0},
             "spotLight": {"innerAngle": 10, "outerAngle": 30}}
        ]}"#;
        send(&tx, text);
        let report = engine.drain_and_apply();
        assert_eq!(report.applied, 1);
        assert_eq!(engine.host().light_count(), 1);
        assert_eq!(engine.host().lights_in_order()[0].cone, Some((10.0, 30.0)));
    }

    #[test]
    fn host_refusal_skips_only_that_light() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        engine.host_mut().refuse_spawns_of(LightKind::Point);
        send(&tx, TWO_LIGHTS);
        let report = engine.drain_and_apply();
        assert_eq!(report.lights.skipped, 1);
        assert_eq!(report.lights.created, 1);
        assert_eq!(engine.materialized()[0].record.kind, LightKind::Directional);
    }

    #[test]
    fn payloads_apply_in_enqueue_order() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        send(&tx, &keyed(&[("b", "Spot", 1.0)]));
        send(&tx, &keyed(&[("a", "Point", 2.0), ("c", "Point", 3.0)]));
        engine.drain_and_apply();
        // The later payload wins.
        assert_eq!(engine.materialized().len(), 2);
        assert_eq!(engine.materialized()[0].record.identity.as_deref(), Some("a"));
    }

    #[test]
    fn legacy_text_full_replaces_with_legacy_scale() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        send(&tx, TWO_LIGHTS);
        engine.drain_and_apply();

        let text = "# exported\n\
                    Spot (10,20,30) (0°,90°,0°) 2.5 RGB(255,255,255) 15° 45°\n\
                    \n\
                    Area (1,1,1) (0,0,0) 1 RGB(0,0,0)\n";
        let report = engine.apply_legacy_text(text);
        assert_eq!(report.lines, 2);
        assert_eq!(report.rejected_lines, 1);
        assert_eq!(report.lights.destroyed, 2);
        assert_eq!(report.lights.created, 1);

        let spot = engine.host().lights_in_order()[0].clone();
        assert_eq!(spot.kind, LightKind::Spot);
        assert_eq!(spot.intensity, 2500.0);
        assert_eq!(spot.cone, Some((15.0, 45.0)));
        assert_eq!(spot.location, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn unreadable_legacy_file_leaves_scene() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        send(&tx, TWO_LIGHTS);
        engine.drain_and_apply();
        let dir = tempfile::tempdir().unwrap();
        let err = engine
            .apply_legacy_file(&dir.path().join("missing.txt"))
            .unwrap_err();
        assert!(matches!(err, LegacyImportError::Read { .. }));
        assert_eq!(engine.host().light_count(), 2);
    }

    #[test]
    fn legacy_file_with_bom_and_crlf_imports() {
        let (mut engine, _tx) = engine(ReconcilePolicy::FullReplace);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lights.txt");
        std::fs::write(
            &path,
            b"\xEF\xBB\xBFPoint (10,0,0) (0,0,0) 1 RGB(255,0,0)\r\n\
              Directional (0,0,0) (-45,0,0) 3 RGB(255,255,255)\r\n",
        )
        .unwrap();

        let report = engine.apply_legacy_file(&path).unwrap();
        assert_eq!(report.lines, 2);
        assert_eq!(report.rejected_lines, 0);
        assert_eq!(report.lights.created, 2);
        assert_eq!(engine.materialized()[0].record.kind, LightKind::Point);
    }

    #[test]
    fn legacy_file_with_latin1_degrees_imports() {
        let (mut engine, _tx) = engine(ReconcilePolicy::FullReplace);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ansi.txt");
        let mut bytes = b"Point (1,2,3) (0\xB0,90\xB0,0\xB0) 1 RGB(0,0,0)\n".to_vec();
        bytes.extend_from_slice(b"Spot (10,20,30) (0,0,0) 2 RGB(1,1,1) 15\xB0 45\xB0\n");
        bytes.extend_from_slice(b"Directional (0,0,0) (-45\xB0,0,0) 3 RGB(9,9,9)\n");
        std::fs::write(&path, bytes).unwrap();

        let report = engine.apply_legacy_file(&path).unwrap();
        assert_eq!(report.lines, 3);
        assert_eq!(report.rejected_lines, 0);
        assert_eq!(report.lights.created, 3);
        let lights = engine.host().lights_in_order();
        assert!((lights[0].rotation.yaw - 90.0).abs() < 1e-4);
        assert_eq!(lights[1].cone, Some((15.0, 45.0)));
    }

    /// Host that enqueues another payload every time a light is spawned.
    struct RequeueingHost {
        inner: MockHost,
        requeue: PayloadSender,
    }

    impl LightHost for RequeueingHost {
        fn spawn_light(
            &mut self,
            kind: LightKind,
            location: Vec3,
            rotation: Rotator,
        ) -> Result<HostHandle, HostError> {
            send(&self.requeue, TWO_LIGHTS);
            self.inner.spawn_light(kind, location, rotation)
        }

        fn set_location(&mut self, handle: HostHandle, location: Vec3) -> Result<(), HostError> {
            self.inner.set_location(handle, location)
        }

        fn set_rotation(&mut self, handle: HostHandle, rotation: Rotator) -> Result<(), HostError> {
            self.inner.set_rotation(handle, rotation)
        }

        fn set_intensity(&mut self, handle: HostHandle, intensity: f32) -> Result<(), HostError> {
            self.inner.set_intensity(handle, intensity)
        }

        fn set_color(&mut self, handle: HostHandle, color: LinearColor) -> Result<(), HostError> {
            self.inner.set_color(handle, color)
        }

        fn set_mobility(
            &mut self,
            handle: HostHandle,
            mobility: Mobility,
        ) -> Result<(), HostError> {
            self.inner.set_mobility(handle, mobility)
        }

        fn set_cone_angles(
            &mut self,
            handle: HostHandle,
            inner_deg: f32,
            outer_deg: f32,
        ) -> Result<(), HostError> {
            self.inner.set_cone_angles(handle, inner_deg, outer_deg)
        }

        fn destroy_light(&mut self, handle: HostHandle) -> Result<(), HostError> {
            self.inner.destroy_light(handle)
        }
    }

    #[test]
    fn payloads_queued_during_drain_wait_for_next_tick() {
        let (tx, rx) = payload_queue();
        let host = RequeueingHost {
            inner: MockHost::new(),
            requeue: tx.clone(),
        };
        let mut engine = SyncEngine::new(
            host,
            rx,
            CoordinateProfile::WIRE_CENTIMETERS,
            ReconcilePolicy::FullReplace,
        );
        send(&tx, TWO_LIGHTS);
        send(&tx, TWO_LIGHTS);

        let first = engine.drain_and_apply();
        assert_eq!(first.payloads, 2);
        assert_eq!(first.applied, 2);
        assert_eq!(engine.inbox.len(), 4);

        let second = engine.drain_and_apply();
        assert_eq!(second.payloads, 4);
        assert_eq!(engine.host().inner.light_count(), 2);
    }

    #[test]
    fn keyed_diff_updates_survivors_in_place() {
        let (mut engine, tx) = engine(ReconcilePolicy::KeyedDiff);
        send(&tx, &keyed(&[("a", "Point", 1.0), ("b", "Spot", 2.0), ("c", "Point", 3.0)]));
        engine.drain_and_apply();
        let handle_a = engine.materialized()[0].handle;
        engine.host_mut().clear_calls();

        send(&tx, &keyed(&[("a", "Point", 9.0), ("b", "Point", 2.0), ("d", "Point", 4.0)]));
        let report = engine.drain_and_apply().lights;
        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 2);
        assert_eq!(report.destroyed, 2);
        assert_eq!(engine.materialized()[0].handle, handle_a);
        assert!(engine.host().calls.contains(&HostCall::SetLocation(handle_a)));

        let ids: Vec<_> = engine
            .materialized()
            .iter()
            .map(|m| m.record.identity.clone().unwrap())
            .collect();
        assert_eq!(ids, ["a", "b", "d"]);
        assert_eq!(engine.host().light_count(), 3);
    }

    #[test]
    fn keyed_diff_leaves_identical_lights_alone() {
        let (mut engine, tx) = engine(ReconcilePolicy::KeyedDiff);
        let text = keyed(&[("a", "Point", 1.0), ("b", "Spot", 2.0)]);
        send(&tx, &text);
        engine.drain_and_apply();
        engine.host_mut().clear_calls();

        send(&tx, &text);
        let report = engine.drain_and_apply().lights;
        assert_eq!(report.unchanged, 2);
        assert!(engine.host().calls.is_empty());
    }

    #[test]
    fn keyed_diff_matches_full_replace_end_state() {
        let first = keyed(&[("a", "Point", 1.0), ("b", "Spot", 2.0)]);
        let second = keyed(&[("b", "Spot", 5.0), ("e", "Directional", 6.0)]);

        let mut scenes = Vec::new();
        for policy in [ReconcilePolicy::FullReplace, ReconcilePolicy::KeyedDiff] {
            let (mut engine, tx) = engine(policy);
            send(&tx, &first);
            send(&tx, &second);
            engine.drain_and_apply();
            let scene: Vec<_> = engine
                .materialized()
                .iter()
                .map(|m| {
                    let light = engine.host().get_light(m.handle).unwrap().clone();
                    (m.record.clone(), light)
                })
                .collect();
            scenes.push(scene);
        }
        assert_eq!(scenes[0], scenes[1]);
    }

    #[test]
    fn keyed_diff_falls_back_without_unique_ids() {
        let (mut engine, tx) = engine(ReconcilePolicy::KeyedDiff);
        send(&tx, &keyed(&[("a", "Point", 1.0)]));
        send(&tx, &keyed(&[("a", "Point", 1.0), ("a", "Point", 2.0)]));
        let report = engine.drain_and_apply().lights;
        assert_eq!(report.created, 3);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.unchanged, 0);
        assert_eq!(engine.host().light_count(), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        send(&tx, TWO_LIGHTS);
        engine.drain_and_apply();
        assert_eq!(engine.clear(), 2);
        assert_eq!(engine.clear(), 0);
        assert!(engine.materialized().is_empty());
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let (mut engine, tx) = engine(ReconcilePolicy::FullReplace);
        assert_eq!(engine.drain_and_apply(), DrainReport::default());
        drop(tx);
        assert_eq!(engine.drain_and_apply(), DrainReport::default());
    }
}
