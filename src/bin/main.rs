//! Binary entrypoint: parses CLI flags, wires up tracing, and runs the core
//! mailbox loop until shutdown (spec §1/§5).
//!
//! The real `ClusterManager` transport (monitor command channel, CRUSH
//! implementation, persisted-state store) is out of scope (spec §1) and is
//! supplied by whatever embeds this crate; this binary exists to exercise
//! the core loop standalone against that boundary.

use async_trait::async_trait;
use autoscaler_agent::{
    cluster_manager::{ClusterManager, CommandAck, CommandHandle, HealthCheck},
    config::CliArgs,
    core::Core,
    errors::{ClusterManager as ClusterManagerCtx, Result},
    shutdown::Shutdown,
    transport::{DfStats, FsMap, MonCommand, OsdMap, PgDump, PgSummary},
};
use clap::Parser;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;

/// Talks to a cluster manager reachable at a configured endpoint. Dialing
/// and the wire protocol for that endpoint are out of scope here; this
/// keeps an in-memory key-value store so the registry's load/save round
/// trips while the real transport is supplied by the embedding deployment.
struct RemoteClusterManager {
    endpoint: String,
    kv: Mutex<HashMap<String, String>>,
}

impl RemoteClusterManager {
    fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            kv: Mutex::new(HashMap::new()),
        }
    }

    fn unavailable(&self, op: &str) -> autoscaler_agent::errors::Error {
        ClusterManagerCtx {
            reason: format!("{op}: no transport configured for endpoint '{}'", self.endpoint),
        }
        .build()
    }
}

#[async_trait]
impl ClusterManager for RemoteClusterManager {
    async fn fetch_osd_map(&self) -> Result<OsdMap> {
        Err(self.unavailable("fetch_osd_map"))
    }

    async fn fetch_fs_map(&self) -> Result<FsMap> {
        Err(self.unavailable("fetch_fs_map"))
    }

    async fn fetch_pg_dump(&self) -> Result<PgDump> {
        Err(self.unavailable("fetch_pg_dump"))
    }

    async fn fetch_pg_summary(&self) -> Result<PgSummary> {
        Err(self.unavailable("fetch_pg_summary"))
    }

    async fn fetch_df(&self) -> Result<DfStats> {
        Err(self.unavailable("fetch_df"))
    }

    async fn send_command(&self, cmd: MonCommand) -> CommandHandle {
        let (tx, rx) = tokio::sync::oneshot::channel();
        warn!(?cmd, "no transport configured, failing command locally");
        let _ = tx.send(CommandAck {
            result: -5,
            outb: String::new(),
            outs: format!("no transport configured for endpoint '{}'", self.endpoint),
        });
        CommandHandle::new(rx)
    }

    async fn kv_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv.lock().get(key).cloned())
    }

    async fn kv_put(&self, key: &str, value: String) -> Result<()> {
        self.kv.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn set_health_checks(&self, checks: HashMap<String, HealthCheck>) {
        info!(count = checks.len(), "health checks updated");
    }

    async fn progress_update(&self, ev_id: Uuid, message: String, progress: f64) {
        info!(%ev_id, %message, progress, "progress update");
    }

    async fn progress_complete(&self, ev_id: Uuid) {
        info!(%ev_id, "progress complete");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_filter))
        .init();

    info!(endpoint = %args.cluster_manager_endpoint, "starting autoscaler agent");

    let manager: Arc<dyn ClusterManager> =
        Arc::new(RemoteClusterManager::new(args.cluster_manager_endpoint.clone()));
    let shutdown = Shutdown::new();

    let (core, _handle) = Core::new(manager, shutdown.clone()).await?;

    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            shutdown_signal.trigger();
        }
    });

    core.run().await?;
    Ok(())
}
