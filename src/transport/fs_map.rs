use super::ids::PoolId;

/// A single CephFS filesystem as it appears in the FS map.
#[derive(Debug, Clone, PartialEq)]
pub struct Filesystem {
    pub fs_name: String,
    pub metadata_pool: PoolId,
    /// Ordered the way the map reports them; only the first is adopted into
    /// the filesystem's poolset (spec §4.4 step 3).
    pub data_pools: Vec<PoolId>,
}

/// Snapshot of the manager's FS map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FsMap {
    pub filesystems: Vec<Filesystem>,
}
