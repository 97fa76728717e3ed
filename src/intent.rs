//! Desired pg_num adjustments, derived once per tick from the resource
//! accountant's view of each CRUSH subtree (spec §4.5).

use crate::{
    cluster_view::ClusterView,
    consts::{MIN_PG_NUM, THRESHOLD_FACTOR},
    poolset::{registry::PoolsetRegistry, Policy},
    resource_accountant::CrushSubtreeResourceStatus,
    transport::{CrushRuleName, PoolId},
};
use std::collections::HashMap;
use tracing::{info, warn};

/// A desired change to one pool's `pg_num` (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentIntent {
    pub pool_id: PoolId,
    pub pool_name: String,
    pub poolset_name: String,
    pub policy: Policy,
    pub rule_name: CrushRuleName,
    pub current_pg_num: u32,
    pub new_pg_num: u32,
    /// `pool_pg_target / current_pg_num`; `< 1` is a shrink, `> 1` is a growth.
    pub undersize_fraction: f64,
    pub raw_used_rate: f64,
}

impl AdjustmentIntent {
    pub fn is_growth(&self) -> bool {
        self.undersize_fraction > 1.0
    }

    pub fn pg_delta(&self) -> u32 {
        self.new_pg_num.abs_diff(self.current_pg_num)
    }

    /// `(new_pg_num - current_pg_num) * raw_used_rate` (spec §4.6).
    pub fn raw_pg_delta(&self) -> f64 {
        self.pg_delta() as f64 * self.raw_used_rate
    }
}

pub struct IntentPlanner;

impl IntentPlanner {
    /// Compute this tick's intents for every pool belonging to a poolset
    /// (spec §4.5).
    pub fn plan(
        view: &ClusterView,
        registry: &PoolsetRegistry,
        resource_status: &HashMap<CrushRuleName, CrushSubtreeResourceStatus>,
    ) -> Vec<AdjustmentIntent> {
        let mut intents = Vec::new();

        for poolset in registry.poolsets() {
            for &pool_id in poolset.pool_properties.keys() {
                let Some(pool) = view.get_pool_by_id(pool_id) else {
                    warn!(%pool_id, "pool missing from osdmap");
                    continue;
                };
                let Some(raw_used_rate) = view.pool_raw_used_rate(pool_id) else {
                    continue;
                };
                let Some(rule) = view.get_rule_by_id(pool.crush_rule_id) else {
                    warn!(pool = %pool.pool_name, "pool's crush rule not found");
                    continue;
                };
                let Some(status) = resource_status.get(&rule.rule_name) else {
                    continue;
                };
                if status.capacity == 0 {
                    continue;
                }

                let pool_logical_used = view
                    .df()
                    .pools
                    .get(&pool_id)
                    .map(|s| s.bytes_used)
                    .unwrap_or(0);
                let pool_raw_used = pool_logical_used as f64 * raw_used_rate;
                let capacity_ratio = pool_raw_used / status.capacity as f64;
                let pool_pg_target =
                    (capacity_ratio * status.pg_target as f64) / raw_used_rate;
                let pool_pg_target = pool_pg_target.max(MIN_PG_NUM as f64);

                info!(
                    pool = %pool.pool_name,
                    capacity_ratio,
                    pool_pg_target,
                    current = pool.pg_num,
                    "computed pg target"
                );

                let current = pool.pg_num as f64;
                if pool_pg_target > current * THRESHOLD_FACTOR {
                    let new_pg_num = pool.pg_num * 2;
                    intents.push(AdjustmentIntent {
                        pool_id,
                        pool_name: pool.pool_name.clone(),
                        poolset_name: poolset.name.clone(),
                        policy: poolset.policy,
                        rule_name: rule.rule_name.clone(),
                        current_pg_num: pool.pg_num,
                        new_pg_num,
                        undersize_fraction: pool_pg_target / current,
                        raw_used_rate,
                    });
                } else if pool_pg_target < current / THRESHOLD_FACTOR {
                    let new_pg_num = (pool.pg_num / 2).max(MIN_PG_NUM);
                    intents.push(AdjustmentIntent {
                        pool_id,
                        pool_name: pool.pool_name.clone(),
                        poolset_name: poolset.name.clone(),
                        policy: poolset.policy,
                        rule_name: rule.rule_name.clone(),
                        current_pg_num: pool.pg_num,
                        new_pg_num,
                        undersize_fraction: pool_pg_target / current,
                        raw_used_rate,
                    });
                }
            }
        }

        intents
    }
}
