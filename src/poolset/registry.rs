//! [`PoolsetRegistry`]: holds the set of poolsets and persists itself through
//! the cluster manager's key-value store (spec §4.3).

use crate::{
    cluster_manager::ClusterManager,
    errors::{Error, PersistedStateRead, PersistedStateWrite, Result},
    poolset::{PoolSet, PoolSetRecord, ENC_COMPAT_VERSION, ENC_VERSION},
    transport::PoolId,
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::{collections::BTreeMap, sync::Arc};
use tracing::instrument;

const STATE_KEY: &str = "state";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct PersistedState {
    version: u32,
    compat_version: u32,
    poolsets: Vec<PoolSetRecord>,
}

/// Owns every live [`PoolSet`], keyed by its (unique) name.
#[derive(Debug, Default)]
pub struct PoolsetRegistry {
    poolsets: BTreeMap<String, PoolSet>,
    dirty: bool,
}

impl PoolsetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poolsets(&self) -> impl Iterator<Item = &PoolSet> {
        self.poolsets.values()
    }

    pub fn get(&self, name: &str) -> Option<&PoolSet> {
        self.poolsets.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PoolSet> {
        self.poolsets.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.poolsets.contains_key(name)
    }

    pub fn insert(&mut self, poolset: PoolSet) {
        self.poolsets.insert(poolset.name.clone(), poolset);
        self.mark_dirty();
    }

    pub fn remove(&mut self, name: &str) -> Option<PoolSet> {
        let removed = self.poolsets.remove(name);
        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn find_by_pool(&self, pool_id: PoolId) -> Option<&PoolSet> {
        self.poolsets
            .values()
            .find(|ps| ps.pool_properties.contains_key(&pool_id))
    }

    pub fn find_by_pool_mut(&mut self, pool_id: PoolId) -> Option<&mut PoolSet> {
        self.poolsets
            .values_mut()
            .find(|ps| ps.pool_properties.contains_key(&pool_id))
    }

    pub fn find_by_application(&self, app: &str, key: &str, value: &str) -> Option<&PoolSet> {
        self.poolsets.values().find(|ps| {
            ps.application
                .get(app)
                .and_then(|data| data.get(key))
                .is_some_and(|v| v == value)
        })
    }

    /// Disambiguate a candidate poolset name against existing poolsets by
    /// appending `_2`, `_3`, ... (spec §4.3).
    pub fn unique_name(&self, candidate: &str) -> String {
        if !self.poolsets.contains_key(candidate) {
            return candidate.to_string();
        }
        let mut i = 1;
        loop {
            i += 1;
            let attempt = format!("{candidate}_{i}");
            if !self.poolsets.contains_key(&attempt) {
                return attempt;
            }
        }
    }

    /// Remove the poolset entry for `pool_id` from whichever poolset holds
    /// it, pruning the poolset entirely if it becomes empty. Returns true if
    /// anything changed.
    pub fn drop_pool(&mut self, pool_id: PoolId) -> bool {
        let Some(owner) = self
            .poolsets
            .iter()
            .find(|(_, ps)| ps.pool_properties.contains_key(&pool_id))
            .map(|(name, _)| name.clone())
        else {
            return false;
        };

        let ps = self.poolsets.get_mut(&owner).expect("just located above");
        ps.pool_properties.remove(&pool_id);
        if ps.is_empty() {
            self.poolsets.remove(&owner);
        }
        self.mark_dirty();
        true
    }

    #[instrument(level = "info", skip(self, manager), err)]
    pub async fn load(&mut self, manager: &Arc<dyn ClusterManager>) -> Result<()> {
        let Some(raw) = manager.kv_get(STATE_KEY).await? else {
            return Ok(());
        };
        let state: PersistedState = serde_json::from_str(&raw).context(PersistedStateRead)?;

        if state.compat_version > ENC_COMPAT_VERSION {
            return Err(Error::IncompatiblePersistedState {
                found: state.compat_version,
                max: ENC_COMPAT_VERSION,
            });
        }

        self.poolsets = state
            .poolsets
            .into_iter()
            .map(|rec| {
                let ps: PoolSet = rec.into();
                (ps.name.clone(), ps)
            })
            .collect();
        self.dirty = false;
        Ok(())
    }

    /// No-op unless [`PoolsetRegistry::mark_dirty`] has been called since the
    /// last save (spec §4.3, §5).
    #[instrument(level = "info", skip(self, manager), err)]
    pub async fn save(&mut self, manager: &Arc<dyn ClusterManager>) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let state = PersistedState {
            version: ENC_VERSION,
            compat_version: ENC_COMPAT_VERSION,
            poolsets: self.poolsets.values().map(PoolSetRecord::from).collect(),
        };
        let raw = serde_json::to_string(&state).context(PersistedStateWrite)?;
        manager.kv_put(STATE_KEY, raw).await?;
        self.dirty = false;
        Ok(())
    }
}
