use super::{
    ids::{CrushRuleName, OsdId, PoolId},
    pool::{CrushRule, PoolRef},
};
use std::collections::{BTreeSet, HashMap};

/// An OSD's entry in the map, only the fields the accountant/tracker need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsdInfo {
    pub id: OsdId,
    /// CRUSH `in` weight; `0.0` once marked out.
    pub in_weight: f64,
}

impl OsdInfo {
    pub fn is_in(&self) -> bool {
        self.in_weight > 0.0
    }
}

/// Snapshot of the CRUSH hierarchy: rules, their roots, and which OSDs
/// (and device classes) fall under each root.
///
/// A full CRUSH placement algorithm is out of scope (spec §1); this is
/// the subset of derived facts the rest of the module queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrushMap {
    pub rules: Vec<CrushRule>,
    /// root name -> OSDs physically under it.
    pub osds_under_root: HashMap<String, BTreeSet<OsdId>>,
    /// OSD -> device class (`"ssd"`, `"hdd"`, ...), when known.
    pub device_classes: HashMap<OsdId, String>,
}

impl CrushMap {
    pub fn rule_by_id(&self, rule_id: u32) -> Option<&CrushRule> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn rule_by_name(&self, name: &CrushRuleName) -> Option<&CrushRule> {
        self.rules.iter().find(|r| &r.rule_name == name)
    }

    pub fn rule_root(&self, rule_name: &CrushRuleName) -> Option<&str> {
        self.rule_by_name(rule_name).map(|r| r.root.as_str())
    }

    pub fn osds_under(&self, root: &str) -> BTreeSet<OsdId> {
        self.osds_under_root.get(root).cloned().unwrap_or_default()
    }

    pub fn device_class_counts(&self) -> HashMap<String, u64> {
        let mut counts = HashMap::new();
        for class in self.device_classes.values() {
            *counts.entry(class.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// A full OSD-map snapshot: pools, OSDs, and the CRUSH hierarchy they sit in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsdMap {
    pub epoch: u64,
    pub pools: Vec<PoolRef>,
    pub osds: Vec<OsdInfo>,
    pub crush: CrushMap,
}

impl OsdMap {
    pub fn get_pool_by_id(&self, pool_id: PoolId) -> Option<&PoolRef> {
        self.pools.iter().find(|p| p.pool_id == pool_id)
    }

    pub fn get_pool_by_name(&self, name: &str) -> Option<&PoolRef> {
        self.pools.iter().find(|p| p.pool_name == name)
    }

    pub fn pool_raw_used_rate(&self, pool_id: PoolId) -> Option<f64> {
        self.get_pool_by_id(pool_id).map(PoolRef::raw_used_rate)
    }

    pub fn get_osd(&self, id: OsdId) -> Option<&OsdInfo> {
        self.osds.iter().find(|o| o.id == id)
    }

    pub fn pool_names(&self) -> BTreeSet<String> {
        self.pools.iter().map(|p| p.pool_name.clone()).collect()
    }
}
