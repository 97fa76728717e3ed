use super::ids::{OsdId, PgId, PoolId};
use std::collections::HashMap;

/// Accumulated byte counters for a single PG, as carried in `pg_dump.pg_stats[*].stat_sum`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PgStatSum {
    pub num_bytes: u64,
    pub num_bytes_recovered: u64,
}

/// One entry of `pg_dump.pg_stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct PgStat {
    pub pgid: PgId,
    pub state: PgState,
    pub up: Vec<OsdId>,
    pub acting: Vec<OsdId>,
    pub stat_sum: PgStatSum,
}

/// A PG's `+`-joined state string (e.g. `"active+clean"`), queried by substring
/// the way the original module does (`'unknown' in k`, `"active" in states`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PgState(pub String);

impl PgState {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('+')
    }

    pub fn has(&self, component: &str) -> bool {
        self.components().any(|c| c == component)
    }

    pub fn contains_substr(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }

    pub fn is_active_clean(&self) -> bool {
        self.has("active") && self.has("clean")
    }
}

/// One entry of `pg_dump.osd_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsdStat {
    pub osd: OsdId,
    /// Raw kibibytes of physical capacity, unreweighted.
    pub kb: u64,
}

/// A full `pg_dump` snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PgDump {
    pub pg_stats: Vec<PgStat>,
    pub osd_stats: Vec<OsdStat>,
}

impl PgDump {
    pub fn pg_by_id(&self, id: &PgId) -> Option<&PgStat> {
        self.pg_stats.iter().find(|pg| &pg.pgid == id)
    }
}

/// A `pg_summary` snapshot: per-pool counts of PGs in each state string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PgSummary {
    pub by_pool: HashMap<PoolId, HashMap<String, u64>>,
}

impl PgSummary {
    /// Total number of PGs reported for a pool, across all states.
    pub fn total_for_pool(&self, pool_id: PoolId) -> u64 {
        self.by_pool
            .get(&pool_id)
            .map(|states| states.values().sum())
            .unwrap_or(0)
    }

    /// Count of PGs in states the driver treats as transient (`unknown`/`creating`).
    pub fn creating_or_unknown(&self, pool_id: PoolId) -> u64 {
        self.by_pool
            .get(&pool_id)
            .map(|states| {
                states
                    .iter()
                    .filter(|(state, _)| state.contains("unknown") || state.contains("creating"))
                    .map(|(_, count)| count)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// True if any PG of the pool reports a state the driver treats as
    /// unhealthy and grounds for aborting an adjustment.
    pub fn has_abort_state(&self, pool_id: PoolId) -> bool {
        const ABORT_STATES: [&str; 2] = ["repair", "recovery_toofull"];
        self.by_pool
            .get(&pool_id)
            .map(|states| states.keys().any(|s| ABORT_STATES.contains(&s.as_str())))
            .unwrap_or(false)
    }
}
