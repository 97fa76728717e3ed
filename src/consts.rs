//! Tunables fixed by spec §3. None of these are exposed as runtime config:
//! the spec treats them as constants, not knobs.

use std::time::Duration;

/// We aim to have this many PGs per OSD.
pub const TARGET_PGS_PER_OSD: u64 = 100;

/// We will (if we have to) go up to this many PGs per OSD to satisfy
/// poolset creations.
pub const MAX_PGS_PER_OSD: u64 = 150;

/// Floor below which no pool's pg_num is allowed to shrink.
pub const MIN_PG_NUM: u32 = 8;

/// Default replication size assumed when a pool doesn't say otherwise.
pub const REPLICATION_SIZE: u32 = 3;

/// Tick period of the core loop.
pub const INTERVAL: Duration = Duration::from_secs(5);

/// Default `pg_num` step per `advance()` call.
pub const DEFAULT_CHUNK_SIZE: u32 = 10;

/// Growth/shrink threshold factor used by the intent planner.
pub const THRESHOLD_FACTOR: f64 = 2.0;
