//! Typed snapshot structures standing in for the manager's dynamic
//! JSON-shaped maps (osdmap, pg_dump, fs_map, ...), parsed once per refresh.
//!
//! REDESIGN FLAG (spec §9): dynamic JSON-shaped maps become typed accessor
//! structs instead of dicts poked at by string key.

pub mod commands;
pub mod fs_map;
pub mod ids;
pub mod osd_map;
pub mod pg;
pub mod pool;

pub use commands::{MonCommand, PgVar};
pub use fs_map::{Filesystem, FsMap};
pub use ids::{CrushRoot, CrushRuleName, FilesystemName, OsdId, PgId, PlacementSeed, PoolId, PoolSetName};
pub use osd_map::{CrushMap, OsdInfo, OsdMap};
pub use pg::{OsdStat, PgDump, PgStat, PgStatSum, PgState, PgSummary};
pub use pool::{app_tag, CrushRule, PoolRef, PoolStats};

/// `df`-style per-pool usage stats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DfStats {
    pub pools: std::collections::HashMap<PoolId, PoolStats>,
}
