use tracing::{info, warn};

use pctl_cloud::{NetworkManager, S3Uploader};

use crate::create::Provisioner;
use crate::error::ProvisionError;

/// §4.H delete flow: the exact inverse of `create` — orchestrator
/// `delete-cluster` first, then network teardown (only when this system
/// owns the network), then the bootstrap object, then the local state file.
/// Each later step runs even if an earlier optional one logged a failure;
/// only the orchestrator call itself is allowed to abort the sequence,
/// since leaving the cloud stack in place while discarding local state
/// would orphan it beyond recovery.
pub async fn delete_cluster(provisioner: &Provisioner, cluster_name: &str) -> Result<(), ProvisionError> {
    let state = provisioner
        .store()
        .load(cluster_name)
        .await
        .map_err(|err| match err {
            pctl_store::StoreError::NotFound(name) => ProvisionError::NotFound(name),
            other => other.into(),
        })?;

    provisioner.orchestrator().delete_cluster(cluster_name, &state.region).await?;
    info!(cluster_name, "orchestrator delete-cluster initiated");

    if state.network_managed_by_system {
        if let Some(resources) = &state.network_resources {
            let network_manager = NetworkManager::new(provisioner.client().clone());
            network_manager.delete_network(resources).await;
        }
    }

    if state.bootstrap_script_uri.is_some() {
        match provisioner.client().account_id().await {
            Ok(account_id) => {
                let uploader = S3Uploader::new(provisioner.client().clone());
                if let Err(err) = uploader.remove(cluster_name, &account_id).await {
                    warn!(cluster_name, error = %err, "failed to remove bootstrap object, continuing delete");
                }
            }
            Err(err) => warn!(cluster_name, error = %err, "failed to resolve account id, skipping bootstrap object removal"),
        }
    }

    provisioner.store().delete(cluster_name).await?;
    info!(cluster_name, "local state removed");
    Ok(())
}
