//! Tracks in-flight long-running operations and how far along they are
//! (spec §4.8), mirroring the standalone `progress` mgr module's job.

pub mod events;

use crate::transport::{OsdId, OsdMap, PgDump, PgId};
use events::{Event, PgRecoveryEvent, RemoteEvent};
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

enum TrackedEvent {
    PgRecovery(PgRecoveryEvent),
    Remote(RemoteEvent),
}

impl TrackedEvent {
    fn as_event(&self) -> &dyn Event {
        match self {
            TrackedEvent::PgRecovery(ev) => ev,
            TrackedEvent::Remote(ev) => ev,
        }
    }
}

/// Registry of events currently in progress.
#[derive(Default)]
pub struct ProgressTracker {
    events: Vec<(Uuid, TrackedEvent)>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a `RemoteEvent` (spec §4.8: `update(ev_id, message, progress)`).
    #[instrument(level = "debug", skip(self))]
    pub fn update(&mut self, ev_id: Uuid, message: String, progress: f64) {
        if let Some((_, TrackedEvent::Remote(ev))) =
            self.events.iter_mut().find(|(id, _)| *id == ev_id)
        {
            ev.set_message(message);
            ev.set_progress(progress);
            return;
        }

        info!(%ev_id, %message, "starting remote progress event");
        let mut ev = RemoteEvent::new(message);
        ev.set_progress(progress);
        self.events.push((ev_id, TrackedEvent::Remote(ev)));
    }

    pub fn register_pg_recovery(&mut self, ev: PgRecoveryEvent) {
        self.events.push((ev.uuid, TrackedEvent::PgRecovery(ev)));
    }

    #[instrument(level = "info", skip(self))]
    pub fn complete(&mut self, ev_id: Uuid) {
        let before = self.events.len();
        self.events.retain(|(id, _)| *id != ev_id);
        if self.events.len() == before {
            warn!(%ev_id, "complete: event does not exist");
        }
    }

    /// Re-scan every tracked `PgRecoveryEvent` against a fresh `pg_dump`.
    pub fn refresh_pg_recovery(&mut self, pg_dump: &PgDump) {
        for (_, ev) in &mut self.events {
            if let TrackedEvent::PgRecovery(ev) = ev {
                ev.update(pg_dump);
            }
        }
    }

    pub fn list(&self) -> Vec<(Uuid, String)> {
        self.events
            .iter()
            .map(|(id, ev)| (*id, ev.as_event().twoline_progress()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Detect OSDs newly marked `out` between two map snapshots and synthesize a
/// [`PgRecoveryEvent`] per affected OSD, covering every PG whose up/acting
/// set touched it (spec §4.8, original `_osd_out`/`_osdmap_changed`).
pub fn detect_osds_marked_out(old_map: &OsdMap, new_map: &OsdMap, pg_dump: &PgDump) -> Vec<PgRecoveryEvent> {
    let mut out_events = Vec::new();

    for new_osd in &new_map.osds {
        if new_osd.is_in() {
            continue;
        }
        let Some(old_osd) = old_map.get_osd(new_osd.id) else {
            continue;
        };
        if !old_osd.is_in() {
            continue;
        }

        let affected: BTreeSet<PgId> = pg_dump
            .pg_stats
            .iter()
            .filter(|pg| pg.up.contains(&new_osd.id) || pg.acting.contains(&new_osd.id))
            .map(|pg| pg.pgid)
            .collect();

        warn!(osd = %new_osd.id, affected = affected.len(), "osd marked out");
        if affected.is_empty() {
            continue;
        }

        let mut evacuate: BTreeSet<OsdId> = BTreeSet::new();
        evacuate.insert(new_osd.id);

        let mut ev = PgRecoveryEvent::new(
            format!("Rebalancing after OSD {} marked out", new_osd.id),
            affected,
            evacuate,
        );
        ev.update(pg_dump);
        out_events.push(ev);
    }

    out_events
}
