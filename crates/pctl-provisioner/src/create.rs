use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use pctl_cloud::{AwsClient, ImageCache, NetworkManager, OrchestratorCli, S3Uploader};
use pctl_seed::Os;
use pctl_store::{ClusterState, ClusterStatus, StateStore};

use crate::error::ProvisionError;
use crate::preflight;
use crate::request::CreateRequest;

fn admin_user_for(os: Os) -> &'static str {
    match os {
        Os::Ubuntu2404 | Os::Ubuntu2204 => "ubuntu",
        _ => "ec2-user",
    }
}

/// Drives the state machine in §4.H: composes the Seed/Config/Fingerprint/
/// Bootstrap/OrchestratorConfig pipeline (A–D) with the Network Manager,
/// Object-Store Uploader, Artifact Cache and orchestrator CLI wrapper
/// (E/G/J + §6) to take a cluster from a seed file to an initiated stack.
///
/// Owns `ClusterState` exclusively: every transition in the diagram is
/// persisted here before the corresponding cloud call is made, so a crash
/// mid-call leaves a state file that accurately names the last attempted
/// stage.
pub struct Provisioner {
    client: Arc<AwsClient>,
    orchestrator: OrchestratorCli,
    store: Arc<dyn StateStore>,
    /// Directory the rendered orchestrator config YAML is written to before
    /// being handed to the `--cluster-configuration` flag.
    config_dir: PathBuf,
}

impl Provisioner {
    pub fn new(
        client: Arc<AwsClient>,
        orchestrator: OrchestratorCli,
        store: Arc<dyn StateStore>,
        config_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { client, orchestrator, store, config_dir: config_dir.into() }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn client(&self) -> &Arc<AwsClient> {
        &self.client
    }

    pub fn orchestrator(&self) -> &OrchestratorCli {
        &self.orchestrator
    }

    /// Drives IDLE through MONITORING: validates the seed, provisions
    /// networking, uploads the bootstrap script, and asks the orchestrator
    /// to initiate stack creation. Returns once creation has been
    /// initiated — it does not wait for `CREATE_COMPLETE`, since watching
    /// the stack is the Progress Monitor's job (component I), and the
    /// Provisioner never blocks on it so the two stay independently
    /// testable. Call [`Provisioner::finalize_ready`] or
    /// [`Provisioner::finalize_failed`] once the monitor has a verdict.
    pub async fn create(&self, request: CreateRequest) -> Result<ClusterState, ProvisionError> {
        let seed = pctl_fingerprint::resolve(&request.seed_path)?;
        let (errors, warnings) = pctl_config::validate(&seed);
        for warning in &warnings {
            warn!(path = %warning.path, message = %warning.message, "seed validation warning");
        }
        if !errors.is_empty() {
            return Err(pctl_config::ValidationErrors(errors).into());
        }

        let cluster_name = seed.cluster.name.clone();
        let region = seed.cluster.region.clone();

        preflight::check(&cluster_name, &self.orchestrator, self.store.as_ref(), &region).await?;

        let mut state = ClusterState::new(
            &cluster_name,
            &region,
            request.seed_path.display().to_string(),
            &request.key_name,
        );
        state.transition(ClusterStatus::Validating);
        self.store.save(&state).await?;
        let custom_image_id = self.lookup_custom_image(&request.seed_path).await?;
        state.custom_image_id = custom_image_id.clone();
        info!(%cluster_name, cache_hit = custom_image_id.is_some(), "seed validated");

        state.transition(ClusterStatus::Networking);
        self.store.save(&state).await?;

        let subnet_id = match &request.subnet_id {
            Some(id) => id.clone(),
            None => match self.provision_network(&cluster_name, &mut state).await {
                Ok(subnet_id) => subnet_id,
                Err(err) => {
                    state.transition(ClusterStatus::CleanupNet);
                    self.store.save(&state).await.ok();
                    self.teardown_network(&state).await;
                    return Err(err);
                }
            },
        };
        info!(%cluster_name, %subnet_id, "network ready");

        state.transition(ClusterStatus::Uploading);
        self.store.save(&state).await?;

        if let Err(err) = self.upload_bootstrap(&seed, custom_image_id.is_some(), &mut state).await {
            state.transition(ClusterStatus::CleanupNet);
            self.store.save(&state).await.ok();
            self.teardown_network(&state).await;
            return Err(err);
        }

        state.transition(ClusterStatus::Launching);
        self.store.save(&state).await?;

        let params = pctl_orchestrator_config::ProjectionParams {
            key_name: request.key_name.clone(),
            subnet_id,
            custom_image_id,
            bootstrap_script_uri: state.bootstrap_script_uri.clone(),
            snapshot_id: None,
        };

        let config = pctl_orchestrator_config::project(&seed, &params);
        let yaml = pctl_orchestrator_config::to_yaml(&config)
            .map_err(|e| ProvisionError::Internal(format!("render orchestrator config: {e}")))?;

        std::fs::create_dir_all(&self.config_dir)
            .map_err(|e| ProvisionError::Internal(format!("create config dir: {e}")))?;
        let config_path = self.config_dir.join(format!("{cluster_name}.yaml"));
        std::fs::write(&config_path, &yaml)
            .map_err(|e| ProvisionError::Internal(format!("write orchestrator config: {e}")))?;

        if let Err(err) = self.orchestrator.create_cluster(&cluster_name, &config_path, &region).await {
            state.transition(ClusterStatus::CleanupAll);
            self.store.save(&state).await.ok();
            self.cleanup_all(&cluster_name, &state).await;
            return Err(err.into());
        }

        state.transition(ClusterStatus::Monitoring);
        self.store.save(&state).await?;
        info!(%cluster_name, "stack creation initiated");

        Ok(state)
    }

    async fn provision_network(
        &self,
        cluster_name: &str,
        state: &mut ClusterState,
    ) -> Result<String, ProvisionError> {
        let network_manager = NetworkManager::new(self.client.clone());
        match network_manager.create_network(cluster_name).await {
            Ok(resources) => {
                let subnet_id = resources
                    .public_subnet_id
                    .clone()
                    .ok_or_else(|| ProvisionError::Internal("network created without a public subnet".into()))?;
                state.network_resources = Some(resources);
                state.network_managed_by_system = true;
                Ok(subnet_id)
            }
            Err((partial, err)) => {
                state.network_resources = Some(partial);
                state.network_managed_by_system = true;
                Err(err.into())
            }
        }
    }

    async fn upload_bootstrap(
        &self,
        seed: &pctl_seed::Seed,
        prebuilt_image: bool,
        state: &mut ClusterState,
    ) -> Result<(), ProvisionError> {
        let opts = pctl_bootstrap::BootstrapOptions {
            shared_storage: false,
            prebuilt_image,
            admin_user: admin_user_for(seed.cluster.os).to_string(),
        };
        let Some(script) = pctl_bootstrap::synthesize(seed, &opts) else {
            return Ok(());
        };

        let account_id = self.client.account_id().await?;
        let uploader = S3Uploader::new(self.client.clone());
        let uri = uploader.upload(&seed.cluster.name, &account_id, &script).await?;
        state.bootstrap_script_uri = Some(uri);
        Ok(())
    }

    async fn lookup_custom_image(&self, seed_path: &std::path::Path) -> Result<Option<String>, ProvisionError> {
        let fingerprint = pctl_fingerprint::fingerprint(seed_path)?;
        let cache = ImageCache::new(self.client.clone());
        Ok(cache.lookup(&fingerprint).await?)
    }

    async fn teardown_network(&self, state: &ClusterState) {
        if let Some(resources) = &state.network_resources {
            let network_manager = NetworkManager::new(self.client.clone());
            network_manager.delete_network(resources).await;
        }
    }

    async fn cleanup_all(&self, cluster_name: &str, state: &ClusterState) {
        self.teardown_network(state).await;
        if state.bootstrap_script_uri.is_some() {
            match self.client.account_id().await {
                Ok(account_id) => {
                    let uploader = S3Uploader::new(self.client.clone());
                    if let Err(err) = uploader.remove(cluster_name, &account_id).await {
                        warn!(cluster_name, error = %err, "failed to remove bootstrap object during cleanup");
                    }
                }
                Err(err) => warn!(cluster_name, error = %err, "failed to resolve account id during cleanup"),
            }
        }
    }

    /// §4.H post-flight: stack reached `CREATE_COMPLETE`. The Progress
    /// Monitor only reports this; finalizing the persisted record is the
    /// Provisioner's job.
    pub async fn finalize_ready(
        &self,
        state: &mut ClusterState,
        head_node_ip: String,
    ) -> Result<(), ProvisionError> {
        state.head_node_ip = Some(head_node_ip);
        state.transition(ClusterStatus::Ready);
        self.store.save(state).await?;
        Ok(())
    }

    /// §7 CloudOrchestratorFailure policy: the stack reached `CREATE_FAILED`
    /// or a rollback state. Records `FAILED` and tears down network
    /// resources if this system created them; the cloud stack itself is
    /// left for the orchestrator's own rollback to resolve.
    pub async fn finalize_failed(&self, state: &mut ClusterState) -> Result<(), ProvisionError> {
        state.transition(ClusterStatus::Failed);
        self.store.save(state).await?;
        if state.network_managed_by_system {
            self.teardown_network(state).await;
        }
        Ok(())
    }
}
