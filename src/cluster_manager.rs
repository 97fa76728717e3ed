//! The external collaborator boundary (spec §1/§6): the cluster manager that
//! hands us map/pg snapshots, a command channel to the monitors, and a
//! key-value store for persistence.
//!
//! REDESIGN FLAG (spec §9): a global singleton plugin instance becomes this
//! trait, handed explicitly to every component that needs it (`ClusterView`,
//! `PoolsetRegistry`, `Core`) instead of being reached for as process-wide
//! state.

use crate::{
    errors::{Error, Result},
    shutdown::Shutdown,
    transport::{DfStats, FsMap, MonCommand, OsdMap, PgDump, PgSummary},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Outcome of a command issued to the monitors: `(result, stdout, stderr)`,
/// mirroring the original `CommandResult.wait()` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAck {
    pub result: i32,
    pub outb: String,
    pub outs: String,
}

impl CommandAck {
    pub fn is_ok(&self) -> bool {
        self.result == 0
    }
}

/// A future-backed handle to a command's completion (DESIGN NOTES: "a
/// future/promise handle holding (r, outb, outs) with a wait primitive that
/// cooperates with shutdown cancellation").
pub struct CommandHandle {
    rx: oneshot::Receiver<CommandAck>,
}

impl CommandHandle {
    pub fn new(rx: oneshot::Receiver<CommandAck>) -> Self {
        Self { rx }
    }

    /// Waits for the command to complete, or returns `Err(Error::ShuttingDown)`
    /// if shutdown is triggered first. Must not hold any lock the
    /// notification path needs (spec §5).
    pub async fn wait(self, shutdown: &Shutdown) -> Result<CommandAck> {
        tokio::select! {
            biased;
            _ = shutdown.wait() => Err(Error::ShuttingDown),
            ack = self.rx => ack.map_err(|_| Error::ClusterManager {
                reason: "command channel closed before completion".into(),
            }),
        }
    }
}

/// A health check entry, as surfaced through `set_health_checks` (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub severity: HealthSeverity,
    pub summary: String,
    pub detail: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthSeverity {
    Warning,
}

/// The narrow interface this module needs from its host cluster manager.
/// Command transport, the CRUSH implementation, persisted-state encoding,
/// and logging transport are all out of scope (spec §1) and live behind
/// this boundary.
#[async_trait]
pub trait ClusterManager: Send + Sync {
    async fn fetch_osd_map(&self) -> Result<OsdMap>;
    async fn fetch_fs_map(&self) -> Result<FsMap>;
    async fn fetch_pg_dump(&self) -> Result<PgDump>;
    async fn fetch_pg_summary(&self) -> Result<PgSummary>;
    async fn fetch_df(&self) -> Result<DfStats>;

    /// Submit a command to the monitors; the returned handle resolves once
    /// the monitors acknowledge it.
    async fn send_command(&self, cmd: MonCommand) -> CommandHandle;

    /// Persisted key-value store (spec §6.4); refuses nothing itself, the
    /// compat-version gate is the registry's job.
    async fn kv_get(&self, key: &str) -> Result<Option<String>>;
    async fn kv_put(&self, key: &str, value: String) -> Result<()>;

    /// Replace the module's published health checks wholesale.
    fn set_health_checks(&self, checks: HashMap<String, HealthCheck>);

    /// Forward progress for a [`crate::progress::RemoteEvent`]-shaped update
    /// (spec §4.8 / §9: "remote" progress module RPC).
    async fn progress_update(&self, ev_id: Uuid, message: String, progress: f64);
    async fn progress_complete(&self, ev_id: Uuid);
}
