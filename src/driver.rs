//! Single live `pg_num`/`pgp_num` adjustment, advanced once per relevant
//! notification (spec §4.7). Growth and shrink share this state machine; the
//! direction is implied by comparing `old_pg_num` and `new_pg_num`.

use crate::{
    cluster_manager::ClusterManager,
    cluster_view::ClusterView,
    errors::{Error, Result},
    shutdown::Shutdown,
    transport::{MonCommand, PgVar},
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// The one adjustment the scheduler may have in flight at a time.
#[derive(Debug, Clone)]
pub struct AdjustmentInProgress {
    pub pool_name: String,
    pub old_pg_num: u32,
    pub new_pg_num: u32,
    pub chunk_size: u32,
    pub uuid: Uuid,
    done: bool,
}

impl AdjustmentInProgress {
    pub fn new(pool_name: String, old_pg_num: u32, new_pg_num: u32, chunk_size: u32) -> Self {
        assert_ne!(old_pg_num, new_pg_num);
        assert!(chunk_size >= 1, "chunk_size must be at least 1");
        Self {
            pool_name,
            old_pg_num,
            new_pg_num,
            chunk_size,
            uuid: Uuid::new_v4(),
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Human-facing progress message, resolved per spec to report the actual
    /// `old -> new` transition rather than their sum.
    pub fn message(&self) -> String {
        format!(
            "{} pg_num from {} to {}",
            self.pool_name, self.old_pg_num, self.new_pg_num
        )
    }

    /// `|pg_num - old_pg_num| / |new_pg_num - old_pg_num|`, clamped to [0,1].
    pub fn progress(&self, view: &ClusterView) -> Result<f64> {
        let pool = view
            .osd_map()
            .get_pool_by_name(&self.pool_name)
            .ok_or_else(|| Error::AdjustmentPoolGone {
                pool: self.pool_name.clone(),
            })?;
        let span = (self.new_pg_num as i64 - self.old_pg_num as i64).unsigned_abs() as f64;
        let done = (pool.pg_num as i64 - self.old_pg_num as i64).unsigned_abs() as f64;
        Ok((done / span).clamp(0.0, 1.0))
    }

    /// Drive the state machine forward one step (spec §4.7). Returns `Ok(true)`
    /// once `done`, `Ok(false)` if still in progress (including while blocked
    /// on a monitor command ack), or `Err` if the adjustment must be aborted.
    pub async fn advance(
        &mut self,
        view: &ClusterView,
        manager: &Arc<dyn ClusterManager>,
        shutdown: &Shutdown,
    ) -> Result<bool> {
        if self.done {
            return Ok(true);
        }
        self.advance_wait_pgs(view, manager, shutdown).await
    }

    async fn advance_wait_pgs(
        &mut self,
        view: &ClusterView,
        manager: &Arc<dyn ClusterManager>,
        shutdown: &Shutdown,
    ) -> Result<bool> {
        let pool = view
            .osd_map()
            .get_pool_by_name(&self.pool_name)
            .ok_or_else(|| Error::AdjustmentPoolGone {
                pool: self.pool_name.clone(),
            })?;
        let pool_id = pool.pool_id;
        let pg_num = pool.pg_num;
        let pgp_num = pool.pgp_num;

        if view.pg_summary().has_abort_state(pool_id) {
            return Err(Error::AdjustmentUnhealthy {
                pool: self.pool_name.clone(),
                state: "repair or recovery_toofull".to_string(),
            });
        }

        if view.pg_summary().total_for_pool(pool_id) != pg_num as u64 {
            // pg_dump/pg_summary still lagging the osdmap's pg_num.
            return Ok(false);
        }
        if view.pg_summary().creating_or_unknown(pool_id) > 0 {
            return Ok(false);
        }

        let next_chunk_pg_num = if self.old_pg_num < self.new_pg_num {
            (pg_num < self.new_pg_num)
                .then(|| pg_num + self.chunk_size.min(self.new_pg_num - pg_num))
        } else {
            (pg_num > self.new_pg_num)
                .then(|| pg_num - self.chunk_size.min(pg_num - self.new_pg_num))
        };

        if let Some(next) = next_chunk_pg_num {
            info!(pool = %self.pool_name, from = pg_num, to = next, "stepping pg_num");
            self.send_and_wait(manager, shutdown, PgVar::PgNum, next).await?;
            return Ok(false);
        }

        if pgp_num != pg_num {
            info!(pool = %self.pool_name, pgp_num = pg_num, "catching up pgp_num");
            self.send_and_wait(manager, shutdown, PgVar::PgpNum, pg_num).await?;
        }

        self.done = true;
        Ok(true)
    }

    async fn send_and_wait(
        &self,
        manager: &Arc<dyn ClusterManager>,
        shutdown: &Shutdown,
        var: PgVar,
        val: u32,
    ) -> Result<()> {
        let handle = manager
            .send_command(MonCommand::OsdPoolSet {
                pool: self.pool_name.clone(),
                var,
                val,
            })
            .await;
        let ack = handle.wait(shutdown).await?;
        if !ack.is_ok() {
            return Err(Error::CommandFailed {
                pool: self.pool_name.clone(),
                reason: ack.outs,
            });
        }
        Ok(())
    }
}
