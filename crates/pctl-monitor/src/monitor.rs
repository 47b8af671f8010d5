use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pctl_cloud::{AwsClient, OrchestratorCli, StackEventsClient};

use crate::error::MonitorError;
use crate::phase1::{self, Phase1Outcome};
use crate::phase2;
use crate::rollback;

const GLOBAL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct MonitorOutcome {
    pub head_node_ip: Option<String>,
}

/// Drives both phases of §4.I to a verdict for one `create` call. Never
/// mutates `ClusterState` itself — the caller (the Provisioner, via
/// `finalize_ready`/`finalize_failed`) owns that.
pub struct Monitor {
    stack_events: StackEventsClient,
    orchestrator: OrchestratorCli,
    region: String,
}

impl Monitor {
    pub fn new(client: Arc<AwsClient>, orchestrator: OrchestratorCli, region: impl Into<String>) -> Self {
        Self { stack_events: StackEventsClient::new(client), orchestrator, region: region.into() }
    }

    pub async fn watch(&self, cluster_name: &str, cancel: &CancellationToken) -> Result<MonitorOutcome, MonitorError> {
        match tokio::time::timeout(GLOBAL_TIMEOUT, self.watch_inner(cluster_name, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(cluster_name, "monitoring timed out; creation continues in the cloud");
                Err(MonitorError::TimedOut)
            }
        }
    }

    async fn watch_inner(&self, cluster_name: &str, cancel: &CancellationToken) -> Result<MonitorOutcome, MonitorError> {
        phase1::wait_for_exist(&self.orchestrator, cluster_name, &self.region, cancel).await?;
        info!(cluster_name, "stack visible, beginning infrastructure monitoring");

        match phase1::run(&self.stack_events, cluster_name, &self.region, cancel).await? {
            Phase1Outcome::Complete => {}
            Phase1Outcome::NeedsRollbackMonitoring => {
                warn!(cluster_name, "stack entered rollback, switching to rollback monitoring");
                let terminal_error = rollback::run(&self.stack_events, cluster_name, &self.region, cancel).await?;
                return Err(terminal_error);
            }
        }

        info!(cluster_name, "infrastructure complete, beginning configuration monitoring");
        let outcome = phase2::run(&self.orchestrator, cluster_name, &self.region, cancel).await?;
        Ok(MonitorOutcome { head_node_ip: outcome.head_node_ip })
    }
}
