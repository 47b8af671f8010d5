use pctl_cloud::OrchestratorCli;
use pctl_store::StateStore;

use crate::error::ProvisionError;

/// §4.H pre-flight: refuse a `create` whose cluster name already has a
/// stack stuck in a terminal failure state, and catch orphaned local state
/// (a state file with no matching cloud stack) before it's overwritten.
///
/// The orchestrator CLI is a black box: it has no dedicated "not found"
/// exit code, so any `describe-cluster` failure here is read as "no stack
/// exists", consistent with how `delete`'s own `CREATE_FAILED`/
/// `DELETE_FAILED` check treats a clean describe response as authoritative.
pub async fn check(
    cluster_name: &str,
    orchestrator: &OrchestratorCli,
    store: &dyn StateStore,
    region: &str,
) -> Result<(), ProvisionError> {
    let local_state_exists = store.exists(cluster_name).await?;

    match orchestrator.describe_cluster(cluster_name, region).await {
        Ok(resp) => {
            let status = resp.cluster.cluster_status.as_str();
            if status == "CREATE_FAILED" || status == "DELETE_FAILED" {
                return Err(ProvisionError::Preflight(format!(
                    "cluster '{cluster_name}' already exists in cloud status {status}; run `pctl delete {cluster_name}` first"
                )));
            }
            Ok(())
        }
        Err(_) if local_state_exists => Err(ProvisionError::Preflight(format!(
            "local state exists for '{cluster_name}' but no matching cloud stack was found; remove the orphaned state file before retrying"
        ))),
        Err(_) => Ok(()),
    }
}
