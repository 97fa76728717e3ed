//! The single-threaded cooperative core (spec §5): a mailbox loop that owns
//! every piece of mutable state and processes commands/notifications/ticks
//! strictly one at a time.
//!
//! REDESIGN FLAG (spec §9): the original's callback-shaped
//! `notify()`/`handle_command()` entry points become messages on a
//! `tokio::sync::mpsc` channel, drained by one owning task instead of being
//! invoked concurrently by the host.

use crate::{
    cluster_manager::ClusterManager,
    cluster_view::ClusterView,
    consts::INTERVAL,
    driver::AdjustmentInProgress,
    errors::Result,
    intent::IntentPlanner,
    pool_create,
    poolset::{discovery::PoolsetAutoDiscovery, registry::PoolsetRegistry, Policy},
    progress::{self, ProgressTracker},
    resource_accountant::ResourceAccountant,
    scheduler::AdjustmentScheduler,
    shutdown::Shutdown,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// A unit of work delivered to the core's mailbox. Every variant mirrors
/// something the original module received either as a notification or a
/// `handle_command` call (spec §6.1/§6.3).
pub enum CoreMessage {
    OsdMapChanged,
    FsMapChanged,
    PgSummaryChanged,
    PoolsetCreate {
        psname: String,
        app: String,
        size: String,
        reply: oneshot::Sender<Result<(i32, String, String)>>,
    },
    PoolsetSet {
        psname: String,
        value: String,
        reply: oneshot::Sender<(i32, String, String)>,
    },
    PoolsetDelete {
        reply: oneshot::Sender<(i32, String, String)>,
    },
    PoolsetLs {
        reply: oneshot::Sender<(i32, String, String)>,
    },
    ProgressLs {
        reply: oneshot::Sender<(i32, String, String)>,
    },
    ProgressClear {
        reply: oneshot::Sender<(i32, String, String)>,
    },
    ProgressUpdate {
        ev_id: Uuid,
        message: String,
        progress: f64,
    },
    ProgressComplete {
        ev_id: Uuid,
    },
}

/// Handle used by external callers (CLI command dispatch, the manager's
/// notification plumbing) to enqueue work onto the core task.
#[derive(Clone)]
pub struct CoreHandle {
    tx: mpsc::Sender<CoreMessage>,
}

impl CoreHandle {
    pub async fn send(&self, msg: CoreMessage) {
        if self.tx.send(msg).await.is_err() {
            warn!("core task gone, dropping message");
        }
    }
}

pub struct Core {
    manager: Arc<dyn ClusterManager>,
    shutdown: Shutdown,
    mailbox: mpsc::Receiver<CoreMessage>,
    registry: PoolsetRegistry,
    view: ClusterView,
    active: Option<AdjustmentInProgress>,
    progress: ProgressTracker,
    old_osd_map: Option<crate::transport::OsdMap>,
}

impl Core {
    pub async fn new(manager: Arc<dyn ClusterManager>, shutdown: Shutdown) -> Result<(Self, CoreHandle)> {
        let (tx, rx) = mpsc::channel(256);
        let mut registry = PoolsetRegistry::new();
        registry.load(&manager).await?;

        let core = Self {
            manager,
            shutdown,
            mailbox: rx,
            registry,
            view: ClusterView::default(),
            active: None,
            progress: ProgressTracker::new(),
            old_osd_map: None,
        };
        Ok((core, CoreHandle { tx }))
    }

    /// Run until shutdown is triggered (spec §5). Mirrors the original's
    /// `serve()` loop: an initial reconciliation pass, then tick/message
    /// processing until told to stop.
    pub async fn run(mut self) -> Result<()> {
        self.view = ClusterView::refresh(&self.manager).await?;
        self.old_osd_map = Some(self.view.osd_map().clone());
        PoolsetAutoDiscovery::run(&self.view, &mut self.registry);
        self.registry.save(&self.manager).await?;

        let mut ticker = tokio::time::interval(INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    info!("shutdown requested, exiting core loop");
                    return Ok(());
                }
                msg = self.mailbox.recv() => {
                    match msg {
                        Some(msg) => self.handle_message(msg).await,
                        None => {
                            info!("mailbox closed, exiting core loop");
                            return Ok(());
                        }
                    }
                    self.registry.save(&self.manager).await?;
                }
                _ = ticker.tick() => {
                    self.handle_message(CoreMessage::OsdMapChanged).await;
                    if let Some(active) = &self.active {
                        if active.is_done() {
                            self.active = None;
                        }
                    }
                    self.registry.save(&self.manager).await?;
                }
            }
        }
    }

    #[instrument(level = "debug", skip(self, msg))]
    async fn handle_message(&mut self, msg: CoreMessage) {
        match msg {
            CoreMessage::OsdMapChanged => self.on_osd_map().await,
            CoreMessage::FsMapChanged => self.on_fs_map().await,
            CoreMessage::PgSummaryChanged => self.on_pg_summary().await,
            CoreMessage::PoolsetCreate { psname, app, size, reply } => {
                let result = pool_create::create_poolset(
                    &self.view,
                    &mut self.registry,
                    &self.manager,
                    &self.shutdown,
                    &psname,
                    &app,
                    &size,
                )
                .await;
                let _ = reply.send(result);
            }
            CoreMessage::PoolsetSet { psname, value, reply } => {
                let result = self.command_poolset_set(&psname, &value);
                let _ = reply.send(result);
            }
            CoreMessage::PoolsetDelete { reply } => {
                let _ = reply.send((-38, String::new(), "Not implemented, use pool delete".to_string()));
            }
            CoreMessage::PoolsetLs { reply } => {
                let body = serde_json::to_string_pretty(
                    &self.registry.poolsets().map(crate::poolset::PoolSetRecord::from).collect::<Vec<_>>(),
                )
                .unwrap_or_default();
                let _ = reply.send((0, body, String::new()));
            }
            CoreMessage::ProgressLs { reply } => {
                if self.progress.is_empty() {
                    let _ = reply.send((0, String::new(), "Nothing in progress".to_string()));
                } else {
                    let body = self
                        .progress
                        .list()
                        .into_iter()
                        .map(|(_, rendered)| rendered)
                        .collect::<Vec<_>>()
                        .join("\n");
                    let _ = reply.send((0, body, String::new()));
                }
            }
            CoreMessage::ProgressClear { reply } => {
                self.progress.clear();
                let _ = reply.send((0, String::new(), String::new()));
            }
            CoreMessage::ProgressUpdate { ev_id, message, progress } => {
                self.progress.update(ev_id, message, progress);
            }
            CoreMessage::ProgressComplete { ev_id } => {
                self.progress.complete(ev_id);
            }
        }
    }

    fn command_poolset_set(&mut self, psname: &str, value: &str) -> (i32, String, String) {
        let Some(poolset) = self.registry.get_mut(psname) else {
            return (-2, String::new(), format!("No such poolset '{psname}'"));
        };
        let policy = match value {
            "true" | "autoscale" | "on" => Policy::Autoscale,
            "warn" => Policy::Warn,
            "false" | "silent" | "off" => Policy::Silent,
            other => return (-22, String::new(), format!("Invalid policy '{other}'")),
        };
        poolset.policy = policy;
        self.registry.mark_dirty();
        (0, String::new(), format!("Set {psname} policy to {value}"))
    }

    async fn on_osd_map(&mut self) {
        let fresh = match ClusterView::refresh(&self.manager).await {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "failed to refresh cluster view");
                return;
            }
        };

        if let Some(old_map) = &self.old_osd_map {
            for ev in progress::detect_osds_marked_out(old_map, fresh.osd_map(), fresh.pg_dump()) {
                self.progress.register_pg_recovery(ev);
            }
        }
        self.old_osd_map = Some(fresh.osd_map().clone());
        self.view = fresh;

        PoolsetAutoDiscovery::purge(&self.view, &mut self.registry);
        PoolsetAutoDiscovery::adopt(&self.view, &mut self.registry);

        self.advance_or_schedule().await;
    }

    async fn on_fs_map(&mut self) {
        PoolsetAutoDiscovery::reconcile_fs_map(&self.view, &mut self.registry);
    }

    async fn on_pg_summary(&mut self) {
        self.progress.refresh_pg_recovery(self.view.pg_dump());
        if self.active.is_some() {
            self.advance_active().await;
        }
    }

    async fn advance_or_schedule(&mut self) {
        // Health publication (step 1) and the in-flight gate (step 2) are
        // independent (spec §4.6): health checks must stay current for every
        // pool that needs growth even while another pool's adjustment is
        // still running over several ticks.
        let rules = ResourceAccountant::rules_for_poolsets(&self.view, &self.registry);
        let resource_status = ResourceAccountant::compute(&self.view, &rules);
        let intents = IntentPlanner::plan(&self.view, &self.registry, &resource_status);

        AdjustmentScheduler::update_health(self.manager.as_ref(), &intents);

        if self.active.is_some() {
            self.advance_active().await;
            return;
        }

        if let Some(started) =
            AdjustmentScheduler::maybe_start(self.active.as_ref(), &intents, &resource_status)
        {
            self.manager
                .progress_update(started.uuid, started.message(), 0.0)
                .await;
            self.active = Some(started);
        }
    }

    async fn advance_active(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        match active.advance(&self.view, &self.manager, &self.shutdown).await {
            Ok(true) => {
                info!(pool = %active.pool_name, "adjustment complete");
                self.manager.progress_complete(active.uuid).await;
            }
            Ok(false) => {
                let progress = active.progress(&self.view).unwrap_or(0.0);
                self.manager
                    .progress_update(active.uuid, active.message(), progress)
                    .await;
                self.active = Some(active);
            }
            Err(e) => {
                warn!(pool = %active.pool_name, error = %e, "aborting adjustment");
                self.manager.progress_complete(active.uuid).await;
            }
        }
    }
}
