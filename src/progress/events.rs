//! The two kinds of tracked progress event (spec §4.8): one driven by
//! watching a set of PGs recover, one driven entirely by updates pushed from
//! elsewhere in the crate (the `AdjustmentDriver`).

use crate::transport::{OsdId, PgDump, PgId};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Shared behaviour of a tracked progress event.
pub trait Event: std::fmt::Debug + Send + Sync {
    fn message(&self) -> &str;
    fn progress(&self) -> f64;

    fn summary(&self) -> String {
        format!("{:.3} {}", self.progress(), self.message())
    }

    /// Render a `[===...]`-style bar `width` characters wide, clamped to
    /// sane bounds for `width < 2`.
    fn render_bar(&self, width: usize) -> String {
        let inner_width = width.saturating_sub(2);
        let done_chars = ((self.progress() * inner_width as f64) as usize).min(inner_width);
        let bar = "=".repeat(done_chars) + &".".repeat(inner_width - done_chars);
        format!("[{bar}]")
    }

    fn twoline_progress(&self) -> String {
        format!("- {}\n    {}", self.message(), self.render_bar(30))
    }
}

/// A progress event whose updates come from elsewhere (here: the
/// `AdjustmentDriver`), pushed verbatim through `update()`.
#[derive(Debug, Clone)]
pub struct RemoteEvent {
    message: String,
    progress: f64,
}

impl RemoteEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            progress: 0.0,
        }
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }
}

impl Event for RemoteEvent {
    fn message(&self) -> &str {
        &self.message
    }

    fn progress(&self) -> f64 {
        self.progress
    }
}

/// An event whose completion tracks the recovery of a fixed set of PGs back
/// to `active+clean`, away from a set of evacuated OSDs (spec §4.8).
#[derive(Debug, Clone)]
pub struct PgRecoveryEvent {
    pub uuid: Uuid,
    message: String,
    pgs: BTreeSet<PgId>,
    evacuate_osds: BTreeSet<OsdId>,
    original_pg_count: usize,
    original_bytes_recovered: HashMap<PgId, u64>,
    progress: f64,
}

impl PgRecoveryEvent {
    /// Call [`Self::update`] immediately after construction, as the original
    /// module's docstring insists.
    pub fn new(message: impl Into<String>, pgs: BTreeSet<PgId>, evacuate_osds: BTreeSet<OsdId>) -> Self {
        let original_pg_count = pgs.len();
        Self {
            uuid: Uuid::new_v4(),
            message: message.into(),
            pgs,
            evacuate_osds,
            original_pg_count,
            original_bytes_recovered: HashMap::new(),
            progress: 0.0,
        }
    }

    /// Re-scan `pg_dump` and recompute progress. PGs that are fully
    /// `active+clean` and no longer touch an evacuated OSD count as done;
    /// others contribute a byte-recovery-ratio fraction (spec §4.8).
    pub fn update(&mut self, pg_dump: &PgDump) {
        if self.original_bytes_recovered.is_empty() && !self.pgs.is_empty() {
            for &pg in &self.pgs {
                if let Some(stat) = pg_dump.pg_by_id(&pg) {
                    self.original_bytes_recovered
                        .insert(pg, stat.stat_sum.num_bytes_recovered);
                }
            }
        }

        let mut complete_accumulate = 0.0;
        let mut completed = BTreeSet::new();

        for &pg in &self.pgs {
            let Some(stat) = pg_dump.pg_by_id(&pg) else {
                continue;
            };

            let unmoved = stat
                .up
                .iter()
                .chain(stat.acting.iter())
                .any(|osd| self.evacuate_osds.contains(osd));

            if stat.state.is_active_clean() && !unmoved {
                completed.insert(pg);
                continue;
            }

            if stat.stat_sum.num_bytes == 0 {
                continue;
            }
            let original = self.original_bytes_recovered.get(&pg).copied().unwrap_or(0);
            let recovered = stat.stat_sum.num_bytes_recovered.saturating_sub(original);
            let ratio = recovered as f64 / stat.stat_sum.num_bytes as f64;
            complete_accumulate += ratio.clamp(0.0, 1.0);
        }

        self.pgs.retain(|pg| !completed.contains(pg));
        let completed_pgs = self.original_pg_count - self.pgs.len();
        self.progress = if self.original_pg_count == 0 {
            1.0
        } else {
            (completed_pgs as f64 + complete_accumulate) / self.original_pg_count as f64
        };
    }
}

impl Event for PgRecoveryEvent {
    fn message(&self) -> &str {
        &self.message
    }

    fn progress(&self) -> f64 {
        self.progress
    }
}
