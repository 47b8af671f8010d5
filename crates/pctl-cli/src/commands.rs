use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use pctl_cloud::{AwsClient, CredentialsProvider, ImdsCredentialsProvider, OrchestratorCli, StaticCredentialsProvider};
use pctl_monitor::Monitor;
use pctl_provisioner::{CreateRequest, Provisioner};
use pctl_store::{JsonFileStore, StateStore};

use crate::output;

fn default_config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".pctl")
}

pub fn resolve_config_dir(config_dir: Option<PathBuf>) -> PathBuf {
    config_dir.unwrap_or_else(default_config_dir)
}

/// Static-then-IMDS credential resolution (§6 environment inputs), wired to
/// the dynamic [`CredentialsProvider`] `AwsClient` expects rather than a
/// one-shot snapshot.
fn build_credentials_provider() -> Arc<dyn CredentialsProvider> {
    if let (Ok(key), Ok(secret)) = (std::env::var("AWS_ACCESS_KEY_ID"), std::env::var("AWS_SECRET_ACCESS_KEY")) {
        return Arc::new(StaticCredentialsProvider {
            access_key_id: key,
            secret_access_key: secret,
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
        });
    }
    Arc::new(ImdsCredentialsProvider::new(reqwest::Client::new()))
}

fn build_provisioner(config_dir: &Path, region: &str) -> Result<Provisioner> {
    let client = Arc::new(AwsClient::new(build_credentials_provider(), region));
    let orchestrator = OrchestratorCli::default();
    let store: Arc<dyn StateStore> = Arc::new(
        JsonFileStore::new(config_dir.join("state")).context("opening local state directory")?,
    );
    Ok(Provisioner::new(client, orchestrator, store, config_dir.join("configs")))
}

pub fn validate(seed_path: PathBuf) -> Result<i32> {
    let seed = pctl_fingerprint::resolve(&seed_path).context("resolving seed file")?;
    let (errors, warnings) = pctl_config::validate(&seed);
    println!("{}", output::render_validation(&errors, &warnings));
    Ok(if errors.is_empty() { 0 } else { 1 })
}

pub async fn create(
    config_dir: PathBuf,
    seed_path: PathBuf,
    key_name: String,
    subnet_id: Option<String>,
    no_wait: bool,
) -> Result<i32> {
    let seed = pctl_fingerprint::resolve(&seed_path).context("resolving seed file")?;
    let region = seed.cluster.region.clone();
    let cluster_name = seed.cluster.name.clone();
    let provisioner = build_provisioner(&config_dir, &region)?;

    let request = CreateRequest { seed_path, key_name, subnet_id };
    let mut state = match provisioner.create(request).await {
        Ok(state) => state,
        Err(err) => {
            eprintln!("error: {err}");
            return Ok(err.exit_code());
        }
    };

    println!("{}", output::render_cluster_state(&state));

    if no_wait {
        println!("not waiting for cluster readiness; run `pctl status {cluster_name}` to check on it");
        return Ok(0);
    }

    let monitor = Monitor::new(provisioner.client().clone(), provisioner.orchestrator().clone(), region);
    let cancel = CancellationToken::new();
    match monitor.watch(&cluster_name, &cancel).await {
        Ok(outcome) => {
            let head_node_ip = outcome.head_node_ip.unwrap_or_else(|| "unknown".to_string());
            provisioner.finalize_ready(&mut state, head_node_ip).await?;
            println!("cluster '{cluster_name}' is ready");
            println!("{}", output::render_cluster_state(&state));
            Ok(0)
        }
        Err(pctl_monitor::MonitorError::TimedOut) => {
            println!("monitoring timed out after 30 minutes; creation continues in the cloud");
            println!("check status later with `pctl status {cluster_name}`");
            Ok(0)
        }
        Err(err) => {
            let exit_code = err.exit_code();
            eprintln!("error: {err}");
            if matches!(
                err,
                pctl_monitor::MonitorError::StackFailed(_) | pctl_monitor::MonitorError::RolledBack(_)
            ) {
                provisioner.finalize_failed(&mut state).await?;
            }
            Ok(exit_code)
        }
    }
}

pub async fn delete(config_dir: PathBuf, region_hint: Option<String>, cluster_name: String) -> Result<i32> {
    // The cluster's region lives in its own state file; `--region` is only
    // ever a fallback for the (unsupported) case of deleting a cluster this
    // machine has no local state for.
    let region = match region_hint {
        Some(region) => region,
        None => {
            let store = JsonFileStore::new(config_dir.join("state")).context("opening local state directory")?;
            match store.load(&cluster_name).await {
                Ok(state) => state.region,
                Err(pctl_store::StoreError::NotFound(name)) => {
                    eprintln!("error: no local state for cluster '{name}'; pass --region explicitly");
                    return Ok(1);
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    return Ok(1);
                }
            }
        }
    };
    let provisioner = build_provisioner(&config_dir, &region)?;
    match pctl_provisioner::delete_cluster(&provisioner, &cluster_name).await {
        Ok(()) => {
            println!("cluster '{cluster_name}' deleted");
            Ok(0)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(err.exit_code())
        }
    }
}

pub async fn list(config_dir: PathBuf) -> Result<i32> {
    let store = JsonFileStore::new(config_dir.join("state")).context("opening local state directory")?;
    let names = store.list().await.context("listing clusters")?;
    println!("{}", output::render_cluster_list(&names));
    Ok(0)
}

pub async fn status(config_dir: PathBuf, cluster_name: String) -> Result<i32> {
    let store = JsonFileStore::new(config_dir.join("state")).context("opening local state directory")?;
    match store.load(&cluster_name).await {
        Ok(state) => {
            println!("{}", output::render_cluster_state(&state));
            Ok(0)
        }
        Err(pctl_store::StoreError::NotFound(name)) => {
            eprintln!("error: no local state for cluster '{name}'");
            Ok(1)
        }
        Err(err @ pctl_store::StoreError::StateCorrupt { .. }) => {
            eprintln!("error: {err}");
            Ok(3)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(1)
        }
    }
}
