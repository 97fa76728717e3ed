//! Turns this tick's [`AdjustmentIntent`]s into health checks and, at most,
//! one newly-started [`crate::driver::AdjustmentInProgress`] (spec §4.6).

use crate::{
    cluster_manager::{ClusterManager, HealthCheck, HealthSeverity},
    consts::DEFAULT_CHUNK_SIZE,
    driver::AdjustmentInProgress,
    intent::AdjustmentIntent,
    poolset::Policy,
    resource_accountant::CrushSubtreeResourceStatus,
    transport::CrushRuleName,
};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::{info, warn};

const HEALTH_CHECK_KEY: &str = "MGR_POOLSETS_TOO_FEW_PGS";

pub struct AdjustmentScheduler;

impl AdjustmentScheduler {
    /// Publish (or clear) the "pools need more PGs" health check for every
    /// `warn`-policy growth intent (spec §4.6 step 1).
    pub fn update_health(manager: &dyn ClusterManager, intents: &[AdjustmentIntent]) {
        let warn_growths: Vec<&AdjustmentIntent> = intents
            .iter()
            .filter(|i| i.is_growth() && i.policy == Policy::Warn)
            .collect();

        if warn_growths.is_empty() {
            manager.set_health_checks(HashMap::new());
            return;
        }

        let names: Vec<String> = warn_growths.iter().map(|i| i.pool_name.clone()).collect();
        info!(pools = %names.join(" "), "pools requiring growth");

        let summary = if names.len() == 1 {
            format!("Pool {} has too few placement groups", names[0])
        } else {
            format!("{} pools have too few placement groups", names.len())
        };

        let mut checks = HashMap::new();
        checks.insert(
            HEALTH_CHECK_KEY.to_string(),
            HealthCheck {
                severity: HealthSeverity::Warning,
                summary,
                detail: names,
            },
        );
        manager.set_health_checks(checks);
    }

    /// Decide whether to start a new adjustment this tick: gate on an
    /// in-flight adjustment, then try each subtree root in turn until one
    /// yields a growth (or donor shrink) to start (spec §4.6 steps 2-3).
    pub fn maybe_start(
        active: Option<&AdjustmentInProgress>,
        intents: &[AdjustmentIntent],
        resource_status: &HashMap<CrushRuleName, CrushSubtreeResourceStatus>,
    ) -> Option<AdjustmentInProgress> {
        if active.is_some() {
            return None;
        }

        let mut sorted = intents.to_vec();
        sorted.sort_by(|a, b| a.rule_name.cmp(&b.rule_name));

        for (rule_name, group) in &sorted.iter().chunk_by(|i| i.rule_name.clone()) {
            let group: Vec<&AdjustmentIntent> = group.collect();
            let Some(status) = resource_status.get(&rule_name) else {
                continue;
            };
            if let Some(started) = Self::maybe_grow(&group, status) {
                return Some(started);
            }
        }
        None
    }

    fn maybe_grow(
        group: &[&AdjustmentIntent],
        status: &CrushSubtreeResourceStatus,
    ) -> Option<AdjustmentInProgress> {
        let mut growths: Vec<&AdjustmentIntent> = group
            .iter()
            .filter(|i| i.policy == Policy::Autoscale && i.is_growth())
            .copied()
            .collect();
        if growths.is_empty() {
            return None;
        }

        growths.sort_by(|a, b| {
            a.undersize_fraction
                .partial_cmp(&b.undersize_fraction)
                .unwrap()
                .then_with(|| a.pool_id.cmp(&b.pool_id))
        });
        let attempt = *growths.last().expect("non-empty");

        let available = status.pg_target.saturating_sub(status.pg_current) as f64;
        let needed = attempt.raw_pg_delta();

        if available >= needed {
            info!(pool = %attempt.pool_name, "growing pool");
            return Some(AdjustmentInProgress::new(
                attempt.pool_name.clone(),
                attempt.current_pg_num,
                attempt.new_pg_num,
                DEFAULT_CHUNK_SIZE,
            ));
        }

        warn!(
            pool = %attempt.pool_name,
            "insufficient resources to grow, looking for a donor to shrink"
        );
        let deficit = (needed - available).max(0.0) as u32;
        Self::pick_donor(group, deficit).map(|donor| {
            info!(pool = %donor.pool_name, "shrinking donor pool to make room");
            AdjustmentInProgress::new(
                donor.pool_name.clone(),
                donor.current_pg_num,
                donor.new_pg_num,
                DEFAULT_CHUNK_SIZE,
            )
        })
    }

    /// Pick a donor to shrink when `attempt`'s growth can't be satisfied from
    /// free PG allowance alone (spec §4.6 step 3, "Else, find a donor").
    fn pick_donor<'a>(group: &[&'a AdjustmentIntent], deficit: u32) -> Option<&'a AdjustmentIntent> {
        let mut shrinks: Vec<&AdjustmentIntent> = group
            .iter()
            .filter(|i| i.policy == Policy::Autoscale && !i.is_growth())
            .copied()
            .collect();
        if shrinks.is_empty() {
            warn!("no shrink adjustments available to make room");
            return None;
        }
        shrinks.sort_by_key(|s| s.pg_delta());

        shrinks
            .iter()
            .find(|s| s.pg_delta() >= deficit)
            .copied()
            .or_else(|| shrinks.last().copied())
    }
}
