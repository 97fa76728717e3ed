//! [`PoolSet`]: a group of pools managed as a unit (spec §3/§4.3).

pub mod discovery;
pub mod registry;

use crate::transport::PoolId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Simple struct versioning, imitating the original `::encode` conventions.
pub const ENC_VERSION: u32 = 1;
pub const ENC_COMPAT_VERSION: u32 = 1;

/// How aggressively a poolset's pg_num is managed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Do no pg-count management for this poolset.
    Silent,
    /// Emit a warning if the pg_num is too low.
    Warn,
    /// Automatically adjust pg_num up and down.
    Autoscale,
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Silent
    }
}

/// User hints for how much capacity a pool within a poolset expects to use.
/// Advisory only — never authoritative (spec §3).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolProperties {
    /// Absolute bytes.
    pub target_size: Option<u64>,
    /// Fraction of subtree capacity.
    pub target_ratio: Option<f64>,
}

impl PoolProperties {
    /// Spec §3 invariant: exactly one of `target_size`/`target_ratio` may be
    /// set. Constructing through these helpers keeps that true by
    /// construction.
    pub fn with_target_size(bytes: u64) -> Self {
        Self {
            target_size: Some(bytes),
            target_ratio: None,
        }
    }

    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_size: None,
            target_ratio: Some(ratio),
        }
    }
}

/// A set of pools with a shared purpose, such as a CephFS filesystem or an
/// RGW zone (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSet {
    pub name: String,
    pub policy: Policy,
    /// application tag -> zone/fs-specific metadata.
    pub application: BTreeMap<String, BTreeMap<String, String>>,
    pub pool_properties: BTreeMap<PoolId, PoolProperties>,
}

impl PoolSet {
    pub fn new(name: impl Into<String>, policy: Policy) -> Self {
        Self {
            name: name.into(),
            policy,
            application: BTreeMap::new(),
            pool_properties: BTreeMap::new(),
        }
    }

    pub fn pools(&self) -> impl Iterator<Item = PoolId> + '_ {
        self.pool_properties.keys().copied()
    }

    pub fn has_application(&self, app: &str) -> bool {
        self.application.contains_key(app)
    }

    pub fn is_empty(&self) -> bool {
        self.pool_properties.is_empty()
    }
}

/// On-disk representation of a [`PoolSet`] (spec §6.4), versioned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PoolSetRecord {
    pub version: u32,
    pub compat_version: u32,
    pub name: String,
    pub policy: Policy,
    pub application: BTreeMap<String, BTreeMap<String, String>>,
    pub pool_properties: BTreeMap<PoolId, PoolProperties>,
}

impl From<&PoolSet> for PoolSetRecord {
    fn from(ps: &PoolSet) -> Self {
        Self {
            version: ENC_VERSION,
            compat_version: ENC_COMPAT_VERSION,
            name: ps.name.clone(),
            policy: ps.policy,
            application: ps.application.clone(),
            pool_properties: ps.pool_properties.clone(),
        }
    }
}

impl From<PoolSetRecord> for PoolSet {
    fn from(rec: PoolSetRecord) -> Self {
        Self {
            name: rec.name,
            policy: rec.policy,
            application: rec.application,
            pool_properties: rec.pool_properties,
        }
    }
}
