//! In-memory fake `ClusterManager`, shared by the integration tests.
//! Mirrors the role `deployer-cluster` plays for the teacher's agent tests:
//! a small stand-in collaborator good enough to drive real code paths.

use async_trait::async_trait;
use autoscaler_agent::{
    cluster_manager::{ClusterManager, CommandAck, CommandHandle, HealthCheck},
    errors::Result,
    transport::{
        CrushMap, CrushRule, CrushRuleName, DfStats, Filesystem, FsMap, MonCommand, OsdId,
        OsdInfo, OsdMap, PgDump, PgId, PgStat, PgStatSum, PgState, PgSummary, PgVar, PoolId,
        PoolRef, PoolStats,
    },
};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

pub struct FakeClusterManager {
    state: Mutex<State>,
}

struct State {
    osd_map: OsdMap,
    fs_map: FsMap,
    pg_dump: PgDump,
    pg_summary: PgSummary,
    df: DfStats,
    kv: HashMap<String, String>,
    health_checks: HashMap<String, HealthCheck>,
    progress: HashMap<Uuid, (String, f64)>,
    completed: Vec<Uuid>,
    next_pool_id: u64,
}

impl Default for FakeClusterManager {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                osd_map: OsdMap::default(),
                fs_map: FsMap::default(),
                pg_dump: PgDump::default(),
                pg_summary: PgSummary::default(),
                df: DfStats::default(),
                kv: HashMap::new(),
                health_checks: HashMap::new(),
                progress: HashMap::new(),
                completed: Vec::new(),
                next_pool_id: 1,
            }),
        }
    }
}

impl FakeClusterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_osd_map(&self, osd_map: OsdMap) {
        self.state.lock().osd_map = osd_map;
    }

    pub fn set_fs_map(&self, fs_map: FsMap) {
        self.state.lock().fs_map = fs_map;
    }

    pub fn set_pg_dump(&self, pg_dump: PgDump) {
        self.state.lock().pg_dump = pg_dump;
    }

    pub fn set_pg_summary(&self, pg_summary: PgSummary) {
        self.state.lock().pg_summary = pg_summary;
    }

    pub fn set_df(&self, df: DfStats) {
        self.state.lock().df = df;
    }

    pub fn osd_map(&self) -> OsdMap {
        self.state.lock().osd_map.clone()
    }

    pub fn health_checks(&self) -> HashMap<String, HealthCheck> {
        self.state.lock().health_checks.clone()
    }

    pub fn progress_of(&self, ev_id: Uuid) -> Option<(String, f64)> {
        self.state.lock().progress.get(&ev_id).cloned()
    }

    pub fn is_completed(&self, ev_id: Uuid) -> bool {
        self.state.lock().completed.contains(&ev_id)
    }

    pub fn kv(&self, key: &str) -> Option<String> {
        self.state.lock().kv.get(key).cloned()
    }

    /// Synchronize `pg_summary`'s total-for-pool count with a pool's current
    /// `pg_num`, all in state `active+clean`, the way a cluster that has
    /// finished splitting/merging would report it.
    pub fn settle_pg_summary(&self, pool_id: PoolId) {
        let mut state = self.state.lock();
        let pg_num = state
            .osd_map
            .get_pool_by_id(pool_id)
            .map(|p| p.pg_num)
            .unwrap_or(0);
        let mut states = HashMap::new();
        states.insert("active+clean".to_string(), pg_num as u64);
        state.pg_summary.by_pool.insert(pool_id, states);
    }
}

#[async_trait]
impl ClusterManager for FakeClusterManager {
    async fn fetch_osd_map(&self) -> Result<OsdMap> {
        Ok(self.state.lock().osd_map.clone())
    }

    async fn fetch_fs_map(&self) -> Result<FsMap> {
        Ok(self.state.lock().fs_map.clone())
    }

    async fn fetch_pg_dump(&self) -> Result<PgDump> {
        Ok(self.state.lock().pg_dump.clone())
    }

    async fn fetch_pg_summary(&self) -> Result<PgSummary> {
        Ok(self.state.lock().pg_summary.clone())
    }

    async fn fetch_df(&self) -> Result<DfStats> {
        Ok(self.state.lock().df.clone())
    }

    async fn send_command(&self, cmd: MonCommand) -> CommandHandle {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let ack = {
            let mut state = self.state.lock();
            match cmd {
                MonCommand::OsdPoolCreate {
                    pool,
                    pg_num,
                    pgp_num,
                    rule,
                    ..
                } => {
                    let crush_rule_id = state
                        .osd_map
                        .crush
                        .rule_by_name(&CrushRuleName::from(rule.as_str()))
                        .map(|r| r.rule_id)
                        .unwrap_or(0);
                    let pool_id = PoolId(state.next_pool_id);
                    state.next_pool_id += 1;
                    state.osd_map.pools.push(PoolRef {
                        pool_id,
                        pool_name: pool,
                        pg_num,
                        pgp_num,
                        crush_rule_id,
                        replication_size: 3,
                        application_metadata: BTreeSet::new(),
                    });
                    CommandAck {
                        result: 0,
                        outb: String::new(),
                        outs: String::new(),
                    }
                }
                MonCommand::OsdPoolSet { pool, var, val } => {
                    if let Some(p) = state
                        .osd_map
                        .pools
                        .iter_mut()
                        .find(|p| p.pool_name == pool)
                    {
                        match var {
                            PgVar::PgNum => p.pg_num = val,
                            PgVar::PgpNum => p.pgp_num = val,
                        }
                        CommandAck {
                            result: 0,
                            outb: String::new(),
                            outs: String::new(),
                        }
                    } else {
                        CommandAck {
                            result: -2,
                            outb: String::new(),
                            outs: format!("no such pool '{pool}'"),
                        }
                    }
                }
                MonCommand::OsdCrushRuleCreateReplicated { name, root, class, .. } => {
                    let rule_id = state.osd_map.crush.rules.len() as u32 + 1;
                    state.osd_map.crush.rules.push(CrushRule {
                        rule_id,
                        rule_name: CrushRuleName::from(name.as_str()),
                        root: root.clone(),
                    });
                    let _ = class;
                    CommandAck {
                        result: 0,
                        outb: String::new(),
                        outs: String::new(),
                    }
                }
            }
        };
        let _ = tx.send(ack);
        CommandHandle::new(rx)
    }

    async fn kv_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.lock().kv.get(key).cloned())
    }

    async fn kv_put(&self, key: &str, value: String) -> Result<()> {
        self.state.lock().kv.insert(key.to_string(), value);
        Ok(())
    }

    fn set_health_checks(&self, checks: HashMap<String, HealthCheck>) {
        self.state.lock().health_checks = checks;
    }

    async fn progress_update(&self, ev_id: Uuid, message: String, progress: f64) {
        self.state.lock().progress.insert(ev_id, (message, progress));
    }

    async fn progress_complete(&self, ev_id: Uuid) {
        let mut state = self.state.lock();
        state.progress.remove(&ev_id);
        state.completed.push(ev_id);
    }
}

/// A handful of OSDs all under CRUSH root `"default"`, split across
/// `hdd`/`ssd` device classes as requested.
pub fn make_osds(hdd: u64, ssd: u64) -> (Vec<OsdInfo>, HashMap<String, BTreeSet<OsdId>>, HashMap<OsdId, String>) {
    let mut osds = Vec::new();
    let mut under_root = BTreeSet::new();
    let mut classes = HashMap::new();

    let mut id = 0u64;
    for _ in 0..hdd {
        let osd_id = OsdId(id);
        osds.push(OsdInfo { id: osd_id, in_weight: 1.0 });
        under_root.insert(osd_id);
        classes.insert(osd_id, "hdd".to_string());
        id += 1;
    }
    for _ in 0..ssd {
        let osd_id = OsdId(id);
        osds.push(OsdInfo { id: osd_id, in_weight: 1.0 });
        under_root.insert(osd_id);
        classes.insert(osd_id, "ssd".to_string());
        id += 1;
    }

    let mut osds_under_root = HashMap::new();
    osds_under_root.insert("default".to_string(), under_root);
    (osds, osds_under_root, classes)
}

pub fn make_crush(rule_name: &str, root: &str, rule_id: u32) -> CrushRule {
    CrushRule {
        rule_id,
        rule_name: CrushRuleName::from(rule_name),
        root: root.to_string(),
    }
}

pub fn make_pool(
    pool_id: u64,
    name: &str,
    pg_num: u32,
    crush_rule_id: u32,
    applications: &[&str],
) -> PoolRef {
    PoolRef {
        pool_id: PoolId(pool_id),
        pool_name: name.to_string(),
        pg_num,
        pgp_num: pg_num,
        crush_rule_id,
        replication_size: 3,
        application_metadata: applications.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn make_pg_stat(pool_id: u64, ps: u32, up: &[u64], acting: &[u64], state: &str, bytes: u64, recovered: u64) -> PgStat {
    PgStat {
        pgid: PgId::new(PoolId(pool_id), ps),
        state: PgState::new(state),
        up: up.iter().map(|&o| OsdId(o)).collect(),
        acting: acting.iter().map(|&o| OsdId(o)).collect(),
        stat_sum: PgStatSum {
            num_bytes: bytes,
            num_bytes_recovered: recovered,
        },
    }
}

pub fn all_active_clean_summary(pool_id: u64, count: u64) -> PgSummary {
    let mut by_pool = HashMap::new();
    let mut states = HashMap::new();
    states.insert("active+clean".to_string(), count);
    by_pool.insert(PoolId(pool_id), states);
    PgSummary { by_pool }
}

pub fn pool_stats(bytes_used: u64) -> PoolStats {
    PoolStats { bytes_used }
}
