//! Automatic poolset membership maintenance, run against every OSD-map and
//! FS-map notification while no `poolset create` is in flight (spec §4.4).

use crate::{
    cluster_view::ClusterView,
    poolset::{registry::PoolsetRegistry, PoolProperties, PoolSet, Policy},
    transport::{app_tag, PoolId},
};
use tracing::info;

pub struct PoolsetAutoDiscovery;

impl PoolsetAutoDiscovery {
    /// Drop pools that vanished from the map, pruning any poolset this
    /// leaves empty (spec §4.4 step 1).
    pub fn purge(view: &ClusterView, registry: &mut PoolsetRegistry) {
        let live_pools: Vec<PoolId> = registry
            .poolsets()
            .flat_map(|ps| ps.pool_properties.keys().copied())
            .filter(|pool_id| view.get_pool_by_id(*pool_id).is_none())
            .collect();

        for pool_id in live_pools {
            info!(%pool_id, "pool gone from osdmap, removing from poolset");
            registry.drop_pool(pool_id);
        }
    }

    /// Adopt ownerless pools into single-pool poolsets, except `cephfs`
    /// (handled by [`Self::reconcile_fs_map`]) and `rgw` (a future extension,
    /// left untouched) (spec §4.4 step 2).
    pub fn adopt(view: &ClusterView, registry: &mut PoolsetRegistry) {
        for pool in &view.osd_map().pools {
            if registry.find_by_pool(pool.pool_id).is_some() {
                continue;
            }
            if pool.has_application(app_tag::CEPHFS) || pool.has_application(app_tag::RGW) {
                continue;
            }

            let name = registry.unique_name(&pool.pool_name);
            let mut ps = PoolSet::new(name.clone(), Policy::Warn);
            ps.pool_properties
                .insert(pool.pool_id, PoolProperties::default());
            for tag in &pool.application_metadata {
                ps.application.entry(tag.clone()).or_default();
            }
            registry.insert(ps);
            info!(poolset = %name, pool_id = %pool.pool_id, "auto-created poolset");
        }
    }

    /// Ensure every filesystem has a poolset covering its metadata pool and
    /// first data pool (spec §4.4 step 3).
    pub fn reconcile_fs_map(view: &ClusterView, registry: &mut PoolsetRegistry) {
        for fs in &view.fs_map().filesystems {
            let Some(&data_pool_id) = fs.data_pools.first() else {
                continue;
            };

            let fs_poolset_name = match registry.find_by_pool(fs.metadata_pool) {
                Some(ps) => ps.name.clone(),
                None => {
                    let mut ps = PoolSet::new(fs.fs_name.clone(), Policy::Warn);
                    ps.pool_properties
                        .insert(fs.metadata_pool, PoolProperties::default());
                    ps.application.entry(app_tag::CEPHFS.to_string()).or_default();
                    let name = ps.name.clone();
                    registry.insert(ps);
                    info!(poolset = %name, fs = %fs.fs_name, "auto-created poolset for filesystem");
                    name
                }
            };

            let already_member = registry
                .get(&fs_poolset_name)
                .is_some_and(|ps| ps.pool_properties.contains_key(&data_pool_id));
            if already_member {
                continue;
            }

            match registry.find_by_pool(data_pool_id).map(|ps| ps.name.clone()) {
                None => {
                    if let Some(ps) = registry.get_mut(&fs_poolset_name) {
                        ps.pool_properties
                            .insert(data_pool_id, PoolProperties::default());
                    }
                    registry.mark_dirty();
                }
                Some(donor_name) if donor_name != fs_poolset_name => {
                    let solo = registry
                        .get(&donor_name)
                        .is_some_and(|ps| ps.pool_properties.len() == 1);
                    if solo {
                        let donor = registry.remove(&donor_name).expect("just checked");
                        if let Some(ps) = registry.get_mut(&fs_poolset_name) {
                            let (pool_id, props) = donor
                                .pool_properties
                                .into_iter()
                                .next()
                                .expect("solo poolset has exactly one entry");
                            ps.pool_properties.insert(pool_id, props);
                            ps.policy = Policy::Warn;
                        }
                        registry.mark_dirty();
                        info!(
                            fs = %fs.fs_name,
                            absorbed = %donor_name,
                            "merged single-pool poolset into filesystem poolset"
                        );
                    }
                    // else: data pool already lives in a multi-pool poolset, leave it alone.
                }
                Some(_) => {}
            }
        }
    }

    /// Run the full reconciliation pass (spec §4.4).
    pub fn run(view: &ClusterView, registry: &mut PoolsetRegistry) {
        Self::purge(view, registry);
        Self::adopt(view, registry);
        Self::reconcile_fs_map(view, registry);
    }
}
