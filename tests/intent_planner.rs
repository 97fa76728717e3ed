//! Covers the capacity-ratio -> pg target formula and its growth/shrink
//! threshold gate (spec §4.5).

mod support;

use autoscaler_agent::{
    cluster_view::ClusterView,
    intent::IntentPlanner,
    poolset::{registry::PoolsetRegistry, PoolProperties, PoolSet, Policy},
    resource_accountant::ResourceAccountant,
    transport::{CrushMap, OsdMap, OsdStat, PgDump, PoolId},
};
use std::sync::Arc;

fn base_osd_map(pools: Vec<autoscaler_agent::transport::PoolRef>) -> (OsdMap, PgDump) {
    let (osds, osds_under_root, device_classes) = support::make_osds(10, 0);
    let osd_stats = osds.iter().map(|o| OsdStat { osd: o.id, kb: 1 }).collect();
    let osd_map = OsdMap {
        epoch: 1,
        pools,
        osds,
        crush: CrushMap {
            rules: vec![support::make_crush("replicated_rule", "default", 0)],
            osds_under_root,
            device_classes,
        },
    };
    let pg_dump = PgDump {
        pg_stats: Vec::new(),
        osd_stats,
    };
    (osd_map, pg_dump)
}

async fn view_with(pool: autoscaler_agent::transport::PoolRef, bytes_used: u64) -> (ClusterView, PoolId) {
    let pool_id = pool.pool_id;
    let fake = support::FakeClusterManager::new();
    let (osd_map, pg_dump) = base_osd_map(vec![pool]);
    fake.set_osd_map(osd_map);
    fake.set_pg_dump(pg_dump);
    fake.set_df(autoscaler_agent::transport::DfStats {
        pools: [(pool_id, support::pool_stats(bytes_used))].into_iter().collect(),
    });
    let manager: Arc<dyn autoscaler_agent::cluster_manager::ClusterManager> = Arc::new(fake);
    let view = ClusterView::refresh(&manager).await.unwrap();
    (view, pool_id)
}

fn registry_with(name: &str, pool_id: PoolId) -> PoolsetRegistry {
    let mut registry = PoolsetRegistry::new();
    let mut ps = PoolSet::new(name, Policy::Autoscale);
    ps.pool_properties.insert(pool_id, PoolProperties::default());
    registry.insert(ps);
    registry
}

#[tokio::test]
async fn pool_using_full_capacity_triggers_growth() {
    let pool = support::make_pool(1, "rbd", 8, 0, &[]);
    let (view, pool_id) = view_with(pool, 10240).await;
    let registry = registry_with("ps", pool_id);

    let rules = ResourceAccountant::rules_for_poolsets(&view, &registry);
    let resource_status = ResourceAccountant::compute(&view, &rules);
    let intents = IntentPlanner::plan(&view, &registry, &resource_status);

    assert_eq!(intents.len(), 1);
    assert!(intents[0].is_growth());
    assert_eq!(intents[0].new_pg_num, 16);
}

#[tokio::test]
async fn idle_pool_triggers_shrink_but_never_below_min_pg_num() {
    let pool = support::make_pool(1, "rbd", 32, 0, &[]);
    let (view, pool_id) = view_with(pool, 0).await;
    let registry = registry_with("ps", pool_id);

    let rules = ResourceAccountant::rules_for_poolsets(&view, &registry);
    let resource_status = ResourceAccountant::compute(&view, &rules);
    let intents = IntentPlanner::plan(&view, &registry, &resource_status);

    assert_eq!(intents.len(), 1);
    assert!(!intents[0].is_growth());
    assert_eq!(intents[0].new_pg_num, 16);
}

#[tokio::test]
async fn pool_near_its_target_is_left_alone() {
    // bytes_used chosen so capacity_ratio * pg_target / raw_used_rate lands
    // well inside the [current/2, current*2] band.
    let pool = support::make_pool(1, "rbd", 32, 0, &[]);
    // capacity = 10 * 1 * 1024 = 10240; want pool_pg_target ~= 40.
    // pool_pg_target = (bytes_used*3/10240) * 1000 / 3 = bytes_used * 1000/10240
    // => bytes_used ~= 40 * 10240 / 1000 = 409.6
    let (view, pool_id) = view_with(pool, 410).await;
    let registry = registry_with("ps", pool_id);

    let rules = ResourceAccountant::rules_for_poolsets(&view, &registry);
    let resource_status = ResourceAccountant::compute(&view, &rules);
    let intents = IntentPlanner::plan(&view, &registry, &resource_status);

    assert!(intents.is_empty(), "pg target within threshold band should not move: {intents:?}");
}

#[test]
fn empty_pg_dump_is_the_default() {
    // Sanity check the helper used elsewhere in this file compiles the way
    // the rest of the crate expects an empty snapshot to look.
    let dump = PgDump::default();
    assert!(dump.pg_stats.is_empty());
}
