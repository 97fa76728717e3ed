//! Per-CRUSH-subtree resource status (spec §4.2): how many OSDs, how much
//! capacity, and how many PGs, are in play under each rule's root.

use crate::{
    cluster_view::ClusterView,
    consts::TARGET_PGS_PER_OSD,
    poolset::registry::PoolsetRegistry,
    transport::{CrushRuleName, OsdId},
};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Resource status of one CRUSH subtree (spec §3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrushSubtreeResourceStatus {
    pub root: String,
    pub osds: BTreeSet<OsdId>,
    pub osd_count: u64,
    pub capacity: u64,
    pub pg_current: u64,
    pub pg_target: u64,
}

pub struct ResourceAccountant;

impl ResourceAccountant {
    /// Union of CRUSH rules referenced by any pool inside any poolset —
    /// the default `rules` set used when a caller doesn't supply one.
    pub fn rules_for_poolsets(
        view: &ClusterView,
        registry: &PoolsetRegistry,
    ) -> BTreeSet<CrushRuleName> {
        let mut rules = BTreeSet::new();
        for poolset in registry.poolsets() {
            for pool_id in poolset.pool_properties.keys() {
                let Some(pool) = view.get_pool_by_id(*pool_id) else {
                    warn!(%pool_id, "pool missing in osdmap while deriving crush rules");
                    continue;
                };
                if let Some(rule) = view.get_rule_by_id(pool.crush_rule_id) {
                    rules.insert(rule.rule_name.clone());
                }
            }
        }
        rules
    }

    /// Compute status for each of `rules`. If the rules' root sets overlap
    /// (the non-overlap assumption from spec §3 is violated), degrade to a
    /// single global pot over the union of all OSDs and log a warning
    /// (spec §7: "Inconsistency").
    pub fn compute(
        view: &ClusterView,
        rules: &BTreeSet<CrushRuleName>,
    ) -> HashMap<CrushRuleName, CrushSubtreeResourceStatus> {
        let mut per_rule: HashMap<CrushRuleName, (String, BTreeSet<OsdId>)> = HashMap::new();
        for rule_name in rules {
            let Some(root) = view.get_rule_root(rule_name) else {
                warn!(%rule_name, "crush rule has no resolvable root, skipping");
                continue;
            };
            let osds = view.get_osds_under(root);
            per_rule.insert(rule_name.clone(), (root.to_string(), osds));
        }

        if Self::subtrees_overlap(per_rule.values().map(|(_, osds)| osds)) {
            warn!("crush subtrees overlap; falling back to a single global resource pot");
            return Self::compute_global_pot(view, per_rule);
        }

        per_rule
            .into_iter()
            .map(|(rule_name, (root, osds))| {
                let status = Self::status_for(view, root, osds);
                (rule_name, status)
            })
            .collect()
    }

    fn subtrees_overlap<'a>(sets: impl Iterator<Item = &'a BTreeSet<OsdId>>) -> bool {
        let mut seen = BTreeSet::new();
        for set in sets {
            if set.iter().any(|osd| seen.contains(osd)) {
                return true;
            }
            seen.extend(set.iter().copied());
        }
        false
    }

    fn compute_global_pot(
        view: &ClusterView,
        per_rule: HashMap<CrushRuleName, (String, BTreeSet<OsdId>)>,
    ) -> HashMap<CrushRuleName, CrushSubtreeResourceStatus> {
        let all_osds: BTreeSet<OsdId> = per_rule
            .values()
            .flat_map(|(_, osds)| osds.iter().copied())
            .collect();
        let global = Self::status_for(view, "<global>".to_string(), all_osds);
        per_rule
            .into_keys()
            .map(|rule_name| (rule_name, global.clone()))
            .collect()
    }

    fn status_for(
        view: &ClusterView,
        root: String,
        osds: BTreeSet<OsdId>,
    ) -> CrushSubtreeResourceStatus {
        let osd_count = osds.len() as u64;
        let pg_current = Self::count_pgs_on_osds(view, &osds);
        let capacity = view
            .pg_dump()
            .osd_stats
            .iter()
            .filter(|stat| osds.contains(&stat.osd))
            .map(|stat| stat.kb * 1024)
            .sum();

        CrushSubtreeResourceStatus {
            root,
            osds,
            osd_count,
            capacity,
            pg_current,
            pg_target: osd_count * TARGET_PGS_PER_OSD,
        }
    }

    /// A PG is counted as present under the subtree when *any* OSD in its
    /// `acting` set lies under the root, de-duplicated per PG (spec §4.2).
    fn count_pgs_on_osds(view: &ClusterView, osds: &BTreeSet<OsdId>) -> u64 {
        view.pg_dump()
            .pg_stats
            .iter()
            .filter(|pg| pg.acting.iter().any(|osd| osds.contains(osd)))
            .count() as u64
    }
}
