use crate::transport::PoolId;
use snafu::Snafu;

/// Crate-wide error type, one variant family per component (spec §7).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
#[allow(missing_docs)]
pub enum Error {
    // -- ResourceAccountant --
    #[snafu(display("Pool {pool_id} referenced by a poolset is missing from the OSD map"))]
    PoolMissingFromOsdMap { pool_id: PoolId },

    #[snafu(display("CRUSH rule '{rule}' has no known root"))]
    UnknownRuleRoot { rule: String },

    // -- PoolsetRegistry --
    #[snafu(display(
        "Refusing to load persisted state with compat_version {found}, max supported is {max}"
    ))]
    IncompatiblePersistedState { found: u32, max: u32 },

    #[snafu(display("Failed to read persisted poolset state: {source}"))]
    PersistedStateRead { source: serde_json::Error },

    #[snafu(display("Failed to encode poolset state for persistence: {source}"))]
    PersistedStateWrite { source: serde_json::Error },

    // -- PoolsetAutoDiscovery / commands --
    #[snafu(display("Unknown application '{application}'"))]
    UnknownApplication { application: String },

    #[snafu(display("Could not parse size string '{value}'"))]
    InvalidSize { value: String },

    #[snafu(display("Poolset '{name}' already exists with a different application"))]
    PoolsetApplicationConflict { name: String },

    // -- AdjustmentDriver --
    #[snafu(display("Pool '{pool}' no longer exists"))]
    AdjustmentPoolGone { pool: String },

    #[snafu(display("Pool '{pool}' is unhealthy (pg state contains '{state}')"))]
    AdjustmentUnhealthy { pool: String, state: String },

    #[snafu(display("Monitor command for pool '{pool}' failed: {reason}"))]
    CommandFailed { pool: String, reason: String },

    // -- ClusterManager collaborator --
    #[snafu(display("Cluster manager request failed: {reason}"))]
    ClusterManager { reason: String },

    #[snafu(display("Shutdown requested before command completed"))]
    ShuttingDown,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
