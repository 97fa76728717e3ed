//! Command-line configuration for the agent binary.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "autoscaler-agent", about = "Autosizes placement-group counts across pools")]
pub struct CliArgs {
    /// `tracing_subscriber::EnvFilter` directive string.
    #[arg(long, env = "RUST_LOG", default_value = "autoscaler_agent=info,warn")]
    pub log_filter: String,

    /// Endpoint of the cluster manager collaborator (spec §1/§6: command
    /// transport and map snapshots are handed to us across this boundary).
    #[arg(long, env = "AUTOSCALER_CLUSTER_MANAGER_ENDPOINT", default_value = "unix:///run/ceph/mgr.sock")]
    pub cluster_manager_endpoint: String,
}
