//! Cached, queryable snapshot of the cluster's maps for a single tick
//! (spec §4.1). Values are internally consistent within one refresh; callers
//! must not assume consistency *across* refreshes.

use crate::{
    cluster_manager::ClusterManager,
    errors::Result,
    transport::{
        CrushRule, DfStats, FsMap, OsdId, OsdMap, PgDump, PgId, PgSummary, PoolId, PoolRef,
    },
};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ClusterView {
    osd_map: OsdMap,
    fs_map: FsMap,
    pg_dump: PgDump,
    pg_summary: PgSummary,
    df: DfStats,
}

impl ClusterView {
    /// Pull a fresh set of named blobs from the manager (spec §4.1).
    pub async fn refresh(manager: &Arc<dyn ClusterManager>) -> Result<Self> {
        Ok(Self {
            osd_map: manager.fetch_osd_map().await?,
            fs_map: manager.fetch_fs_map().await?,
            pg_dump: manager.fetch_pg_dump().await?,
            pg_summary: manager.fetch_pg_summary().await?,
            df: manager.fetch_df().await?,
        })
    }

    pub fn osd_map(&self) -> &OsdMap {
        &self.osd_map
    }

    pub fn fs_map(&self) -> &FsMap {
        &self.fs_map
    }

    pub fn pg_dump(&self) -> &PgDump {
        &self.pg_dump
    }

    pub fn pg_summary(&self) -> &PgSummary {
        &self.pg_summary
    }

    pub fn df(&self) -> &DfStats {
        &self.df
    }

    pub fn get_pool_by_id(&self, pool_id: PoolId) -> Option<&PoolRef> {
        self.osd_map.get_pool_by_id(pool_id)
    }

    pub fn pool_raw_used_rate(&self, pool_id: PoolId) -> Option<f64> {
        self.osd_map.pool_raw_used_rate(pool_id)
    }

    pub fn get_rule_by_id(&self, rule_id: u32) -> Option<&CrushRule> {
        self.osd_map.crush.rule_by_id(rule_id)
    }

    pub fn get_rule_root(&self, rule_name: &crate::transport::CrushRuleName) -> Option<&str> {
        self.osd_map.crush.rule_root(rule_name)
    }

    pub fn get_osds_under(&self, root: &str) -> std::collections::BTreeSet<OsdId> {
        self.osd_map.crush.osds_under(root)
    }

    pub fn device_class_counts(&self) -> std::collections::HashMap<String, u64> {
        self.osd_map.crush.device_class_counts()
    }

    /// Up/acting OSD sets for a PG, read straight out of the pg_dump snapshot
    /// (the actual CRUSH placement computation is an external collaborator's
    /// concern, spec §1).
    pub fn pg_to_up_acting_osds(&self, id: PgId) -> Option<(Vec<OsdId>, Vec<OsdId>)> {
        self.pg_dump
            .pg_by_id(&id)
            .map(|pg| (pg.up.clone(), pg.acting.clone()))
    }
}
