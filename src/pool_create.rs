//! Implements `poolset create` (spec §6.1): decides a pool recipe for an
//! application, sizes each pool's initial `pg_num`, and issues the monitor
//! commands to actually create them.

use crate::{
    cluster_manager::ClusterManager,
    cluster_view::ClusterView,
    consts::{MAX_PGS_PER_OSD, MIN_PG_NUM, REPLICATION_SIZE, TARGET_PGS_PER_OSD},
    errors::{Error, Result, UnknownApplication},
    poolset::{registry::PoolsetRegistry, PoolProperties, PoolSet, Policy},
    resource_accountant::{CrushSubtreeResourceStatus, ResourceAccountant},
    shutdown::Shutdown,
    transport::{CrushRuleName, MonCommand},
};
use snafu::ensure;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};

const HDD_RULE: &str = "replicated_rule";
const SSD_RULE: &str = "replicated_rule_ssd";
const SSD_RULE_NEW_NAME: &str = "ssd-replicated";

/// Target fraction (bytes or percent-of-cluster) and a pool's share of it.
#[derive(Debug, Clone, Copy)]
enum SizeSpec {
    Bytes(u64),
    Ratio(f64),
}

/// A single pool an application recipe wants created (spec §6.1).
struct PoolIntent {
    suffix: &'static str,
    weight: f64,
    crush_rule: CrushRuleName,
    initial_pg_num: u32,
    target_size: Option<u64>,
    target_ratio: Option<f64>,
    name: String,
    pool_id: Option<crate::transport::PoolId>,
}

/// Round `n` to the nearest power of two, rounding to whichever of the
/// enclosing high/low bound powers is numerically closer (spec §6.1).
pub fn nearest_power_of_two(n: f64) -> u32 {
    let n_i = n as i64;
    if n_i <= 1 {
        return 1;
    }
    let mut v = n_i - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v += 1;
    let low = v >> 1;
    let result = if (v - n_i) > (n_i - low) { low } else { v };
    result.max(1) as u32
}

fn recipe(application: &str) -> Result<Vec<(&'static str, bool, f64)>> {
    Ok(match application {
        "rados" | "rbd" => vec![("", false, 1.0)],
        "cephfs" => vec![("meta", true, 0.1), ("data", false, 1.0)],
        "rgw" => vec![
            ("rgw.control", true, 0.001),
            ("rgw.log", true, 0.001),
            ("rgw.meta", true, 0.001),
            ("rgw.buckets.data", false, 1.0),
        ],
        other => {
            return UnknownApplication {
                application: other.to_string(),
            }
            .fail()
        }
    })
}

#[instrument(level = "info", skip(view, registry, manager, shutdown), err)]
pub async fn create_poolset(
    view: &ClusterView,
    registry: &mut PoolsetRegistry,
    manager: &Arc<dyn ClusterManager>,
    shutdown: &Shutdown,
    pool_set_name: &str,
    application: &str,
    size: &str,
) -> Result<(i32, String, String)> {
    if let Some(existing) = registry.get(pool_set_name) {
        return if existing.has_application(application) {
            Ok((0, String::new(), format!("Poolset '{pool_set_name}' already exists")))
        } else {
            Ok((-17, String::new(), format!("Poolset '{pool_set_name}' already exists")))
        };
    }

    let size_spec = match parse_raw_size(size) {
        Some(s) => s,
        None => return Ok((-22, String::new(), format!("Could not parse size '{size}'"))),
    };

    let recipe = match recipe(application) {
        Ok(r) => r,
        Err(Error::UnknownApplication { application }) => {
            return Ok((-22, String::new(), format!("Invalid application '{application}'")))
        }
        Err(e) => return Err(e),
    };

    let ssd_count = *view.device_class_counts().get("ssd").unwrap_or(&0);
    let use_ssds = ssd_count >= (REPLICATION_SIZE as u64 + 1);
    info!(use_ssds, ssd_count, "device class preference decided");

    let mut any_ssds_used = false;
    let mut intents: Vec<PoolIntent> = recipe
        .into_iter()
        .map(|(suffix, is_metadata, weight)| {
            let use_ssd = is_metadata && use_ssds;
            any_ssds_used |= use_ssd;
            PoolIntent {
                suffix,
                weight,
                crush_rule: CrushRuleName::from(if use_ssd { SSD_RULE } else { HDD_RULE }),
                initial_pg_num: 0,
                target_size: None,
                target_ratio: None,
                name: String::new(),
                pool_id: None,
            }
        })
        .collect();

    if any_ssds_used {
        ensure_ssd_rule_exists(view, manager, shutdown).await?;
    }

    clamp_weights(&mut intents, &CrushRuleName::from(HDD_RULE));
    clamp_weights(&mut intents, &CrushRuleName::from(SSD_RULE));

    let rules: std::collections::BTreeSet<CrushRuleName> = intents
        .iter()
        .map(|i| i.crush_rule.clone())
        .collect();
    let resource_status = ResourceAccountant::compute(view, &rules);

    size_and_name_intents(&mut intents, size_spec, &resource_status, pool_set_name);
    check_budget(&intents, &resource_status);

    do_create(manager, shutdown, &mut intents).await?;

    let mut poolset = PoolSet::new(pool_set_name, Policy::Autoscale);
    poolset.application.entry(application.to_string()).or_default();
    for intent in &intents {
        let pool_id = intent.pool_id.expect("do_create populates every intent");
        let mut props = PoolProperties::default();
        if let Some(bytes) = intent.target_size {
            props = PoolProperties::with_target_size(bytes);
        } else if let Some(ratio) = intent.target_ratio {
            props = PoolProperties::with_target_ratio(ratio);
        }
        poolset.pool_properties.insert(pool_id, props);
    }
    registry.insert(poolset);

    Ok((0, String::new(), format!("Created poolset {pool_set_name}")))
}

fn parse_raw_size(raw: &str) -> Option<SizeSpec> {
    if let Some(pct) = raw.strip_suffix('%') {
        let pct: f64 = pct.parse().ok()?;
        Some(SizeSpec::Ratio(pct / 100.0))
    } else {
        let bytes: u64 = raw.parse().ok()?;
        Some(SizeSpec::Bytes(bytes))
    }
}

fn clamp_weights(intents: &mut [PoolIntent], rule: &CrushRuleName) {
    let total: f64 = intents
        .iter()
        .filter(|i| &i.crush_rule == rule)
        .map(|i| i.weight)
        .sum();
    if total > 1.0 {
        for intent in intents.iter_mut().filter(|i| &i.crush_rule == rule) {
            intent.weight /= total;
        }
    }
}

async fn ensure_ssd_rule_exists(
    view: &ClusterView,
    manager: &Arc<dyn ClusterManager>,
    shutdown: &Shutdown,
) -> Result<()> {
    if view
        .osd_map()
        .crush
        .rule_by_name(&CrushRuleName::from(SSD_RULE))
        .is_some()
    {
        return Ok(());
    }

    let handle = manager
        .send_command(MonCommand::OsdCrushRuleCreateReplicated {
            name: SSD_RULE_NEW_NAME.to_string(),
            root: "default".to_string(),
            bucket_type: "host".to_string(),
            class: "ssd".to_string(),
        })
        .await;
    let ack = handle.wait(shutdown).await?;
    ensure!(
        ack.is_ok(),
        crate::errors::CommandFailed {
            pool: SSD_RULE_NEW_NAME,
            reason: ack.outs,
        }
    );
    Ok(())
}

fn size_and_name_intents(
    intents: &mut [PoolIntent],
    size_spec: SizeSpec,
    resource_status: &HashMap<CrushRuleName, CrushSubtreeResourceStatus>,
    pool_set_name: &str,
) {
    for intent in intents.iter_mut() {
        let Some(status) = resource_status.get(&intent.crush_rule) else {
            continue;
        };

        let ratio = match size_spec {
            SizeSpec::Bytes(total) => {
                let adjusted = total as f64 * intent.weight;
                intent.target_size = Some(adjusted as u64);
                adjusted / status.capacity.max(1) as f64
            }
            SizeSpec::Ratio(total_ratio) => {
                let ratio = total_ratio * intent.weight;
                intent.target_ratio = Some(ratio);
                ratio
            }
        };

        let raw_pg_num = (ratio * status.pg_target as f64) / REPLICATION_SIZE as f64;
        intent.initial_pg_num = nearest_power_of_two(raw_pg_num).max(MIN_PG_NUM);

        intent.name = if intent.suffix.is_empty() {
            pool_set_name.to_string()
        } else {
            format!("{pool_set_name}.{}", intent.suffix)
        };

        info!(
            pool = %intent.name,
            pg_num = intent.initial_pg_num,
            ratio,
            pg_target = status.pg_target,
            "sized pool"
        );
    }
}

/// Warn (never block) if creating these pools would push a subtree over its
/// PG budget. Resolves Open Question #2: the check compares
/// *existing-plus-proposed* PGs against `pg_target`, reading `pg_current`
/// straight off the already-computed resource status rather than the
/// original's accidental `pg_current = pg_target` overwrite.
fn check_budget(
    intents: &[PoolIntent],
    resource_status: &HashMap<CrushRuleName, CrushSubtreeResourceStatus>,
) {
    for (rule_name, status) in resource_status {
        let proposed: u64 = intents
            .iter()
            .filter(|i| &i.crush_rule == rule_name)
            .map(|i| i.initial_pg_num as u64)
            .sum();
        let new_pg_count = status.pg_current + proposed * REPLICATION_SIZE as u64;

        if new_pg_count > status.pg_target {
            let severe = new_pg_count
                > (status.pg_target * MAX_PGS_PER_OSD) / TARGET_PGS_PER_OSD;
            warn!(
                %rule_name,
                new_pg_count,
                pg_target = status.pg_target,
                severe,
                "poolset create would exceed the crush subtree's pg budget"
            );
        }
    }
}

async fn do_create(
    manager: &Arc<dyn ClusterManager>,
    shutdown: &Shutdown,
    intents: &mut [PoolIntent],
) -> Result<()> {
    for intent in intents.iter_mut() {
        let handle = manager
            .send_command(MonCommand::OsdPoolCreate {
                pool: intent.name.clone(),
                pg_num: intent.initial_pg_num,
                pgp_num: intent.initial_pg_num,
                pool_type: "replicated".to_string(),
                rule: intent.crush_rule.to_string(),
            })
            .await;
        let ack = handle.wait(shutdown).await?;
        ensure!(
            ack.is_ok(),
            crate::errors::CommandFailed {
                pool: intent.name.clone(),
                reason: ack.outs,
            }
        );

        // Re-fetch: the ack only guarantees the monitors accepted the
        // command, not that our cached view already reflects the new pool.
        let fresh = manager.fetch_osd_map().await?;
        let pool_id = fresh
            .get_pool_by_name(&intent.name)
            .map(|p| p.pool_id)
            .ok_or_else(|| Error::AdjustmentPoolGone {
                pool: intent.name.clone(),
            })?;
        intent.pool_id = Some(pool_id);
    }
    Ok(())
}
