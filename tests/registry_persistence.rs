//! Covers `PoolsetRegistry` persistence through the cluster manager's kv
//! store: dirty-tracking and a save/load round trip (spec §4.3).

mod support;

use autoscaler_agent::{
    poolset::{registry::PoolsetRegistry, PoolProperties, PoolSet, Policy},
    transport::PoolId,
};
use std::sync::Arc;

#[tokio::test]
async fn save_is_a_noop_until_something_changes() {
    let fake = Arc::new(support::FakeClusterManager::new());
    let manager: Arc<dyn autoscaler_agent::cluster_manager::ClusterManager> = fake.clone();
    let mut registry = PoolsetRegistry::new();

    assert!(!registry.is_dirty());
    registry.save(&manager).await.unwrap();
    assert!(fake.kv("state").is_none(), "nothing dirty, nothing persisted");
}

#[tokio::test]
async fn save_then_load_round_trips_every_poolset() {
    let fake = Arc::new(support::FakeClusterManager::new());
    let manager: Arc<dyn autoscaler_agent::cluster_manager::ClusterManager> = fake.clone();
    let mut registry = PoolsetRegistry::new();

    let mut rbd = PoolSet::new("rbd_pool", Policy::Autoscale);
    rbd.application.entry("rbd".to_string()).or_default();
    rbd.pool_properties.insert(PoolId(1), PoolProperties::with_target_ratio(0.5));
    registry.insert(rbd);

    let mut fs = PoolSet::new("myfs", Policy::Warn);
    fs.application.entry("cephfs".to_string()).or_default();
    fs.pool_properties.insert(PoolId(2), PoolProperties::with_target_size(1 << 30));
    fs.pool_properties.insert(PoolId(3), PoolProperties::default());
    registry.insert(fs);

    assert!(registry.is_dirty());
    registry.save(&manager).await.unwrap();
    assert!(!registry.is_dirty(), "save clears the dirty flag");
    assert!(fake.kv("state").is_some());

    let mut reloaded = PoolsetRegistry::new();
    reloaded.load(&manager).await.unwrap();

    assert_eq!(reloaded.poolsets().count(), 2);
    let rbd = reloaded.get("rbd_pool").expect("rbd_pool survives the round trip");
    assert_eq!(rbd.policy, Policy::Autoscale);
    assert_eq!(
        rbd.pool_properties.get(&PoolId(1)).unwrap().target_ratio,
        Some(0.5)
    );

    let fs = reloaded.get("myfs").expect("myfs survives the round trip");
    assert_eq!(fs.policy, Policy::Warn);
    assert_eq!(
        fs.pool_properties.get(&PoolId(2)).unwrap().target_size,
        Some(1 << 30)
    );
    assert!(fs.pool_properties.contains_key(&PoolId(3)));
}

#[tokio::test]
async fn loading_with_no_persisted_state_leaves_the_registry_empty() {
    let fake = Arc::new(support::FakeClusterManager::new());
    let manager: Arc<dyn autoscaler_agent::cluster_manager::ClusterManager> = fake;
    let mut registry = PoolsetRegistry::new();

    registry.load(&manager).await.unwrap();
    assert_eq!(registry.poolsets().count(), 0);
}

#[tokio::test]
async fn drop_pool_prunes_an_emptied_poolset_and_marks_dirty() {
    let fake = Arc::new(support::FakeClusterManager::new());
    let manager: Arc<dyn autoscaler_agent::cluster_manager::ClusterManager> = fake;
    let mut registry = PoolsetRegistry::new();

    let mut solo = PoolSet::new("solo", Policy::Warn);
    solo.pool_properties.insert(PoolId(1), PoolProperties::default());
    registry.insert(solo);
    registry.save(&manager).await.unwrap();
    assert!(!registry.is_dirty());

    let changed = registry.drop_pool(PoolId(1));
    assert!(changed);
    assert!(registry.is_dirty());
    assert!(registry.get("solo").is_none());
}
