use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pctl", about = "Seed-driven HPC cluster provisioning", version)]
pub struct Cli {
    /// Directory holding local state and rendered orchestrator configs.
    /// Defaults to `~/.pctl`.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Cloud region; defaults to the seed file's own `cluster.region`.
    #[arg(long, global = true)]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a seed file without provisioning anything.
    Validate {
        /// Path to the seed YAML file.
        seed: PathBuf,
    },

    /// Provision a cluster from a seed file and wait for it to come up.
    Create {
        /// Path to the seed YAML file.
        seed: PathBuf,

        /// EC2 key pair name to launch the head/compute nodes with.
        #[arg(long)]
        key_name: String,

        /// Use an existing subnet instead of letting pctl create a VPC.
        #[arg(long)]
        subnet_id: Option<String>,

        /// Initiate creation and print the cluster's local state without
        /// waiting for it to finish coming up.
        #[arg(long)]
        no_wait: bool,
    },

    /// Tear down a cluster's cloud stack and local state.
    Delete {
        /// Cluster name.
        cluster_name: String,
    },

    /// List every cluster with local state.
    List,

    /// Show a cluster's current local state.
    Status {
        /// Cluster name.
        cluster_name: String,
    },
}
