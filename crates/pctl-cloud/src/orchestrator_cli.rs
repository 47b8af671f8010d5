use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::CloudError;

const COMMAND_TIMEOUT_SECS: u64 = 1800;

/// Thin wrapper around the external cloud-orchestrator CLI binary. It is a
/// black box: this module only spawns it, captures its combined output, and
/// parses the one JSON shape it emits for `describe-cluster`.
#[derive(Clone)]
pub struct OrchestratorCli {
    binary: String,
}

impl Default for OrchestratorCli {
    fn default() -> Self {
        Self { binary: "pcluster".to_string() }
    }
}

impl OrchestratorCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// `create-cluster`. Async on the orchestrator side: this call returns
    /// once stack creation is *initiated*, not once it completes.
    pub async fn create_cluster(
        &self,
        cluster_name: &str,
        config_path: &Path,
        region: &str,
    ) -> Result<(), CloudError> {
        self.run(&[
            "create-cluster",
            "--cluster-name",
            cluster_name,
            "--cluster-configuration",
            &config_path.display().to_string(),
            "--region",
            region,
        ])
        .await?;
        Ok(())
    }

    pub async fn delete_cluster(&self, cluster_name: &str, region: &str) -> Result<(), CloudError> {
        self.run(&["delete-cluster", "--cluster-name", cluster_name, "--region", region])
            .await?;
        Ok(())
    }

    pub async fn describe_cluster(
        &self,
        cluster_name: &str,
        region: &str,
    ) -> Result<DescribeClusterResponse, CloudError> {
        let (_exit, output) = self
            .run(&["describe-cluster", "--cluster-name", cluster_name, "--region", region])
            .await?;
        serde_json::from_str(&output).map_err(CloudError::from)
    }

    /// Runs the CLI to completion, merging stdout/stderr into one log the
    /// way a human watching the terminal would see it. Never retried:
    /// orchestrator CLI failures are not transient.
    async fn run(&self, args: &[&str]) -> Result<(i32, String), CloudError> {
        info!(binary = %self.binary, ?args, "running orchestrator CLI command");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| CloudError::Internal(format!("spawn {}: {e}", self.binary)))?;

        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");

        let mut log = String::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

        let tx1 = tx.clone();
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx1.send(line);
            }
        });

        let tx2 = tx.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = tx2.send(line);
            }
        });
        drop(tx);

        let collect = async {
            while let Some(line) = rx.recv().await {
                debug!(target: "pctl::cloud", "{}", line);
                log.push_str(&line);
                log.push('\n');
            }
        };
        let timed_out =
            tokio::time::timeout(Duration::from_secs(COMMAND_TIMEOUT_SECS), collect).await.is_err();

        stdout_task.await.ok();
        stderr_task.await.ok();

        if timed_out {
            let _ = child.kill().await;
            return Err(CloudError::Timeout(args.join(" ")));
        }

        let status = child
            .wait()
            .await
            .map_err(|e| CloudError::Internal(format!("wait {}: {e}", self.binary)))?;

        if !status.success() {
            return Err(CloudError::SubprocessFailed {
                command: format!("{} {}", self.binary, args.join(" ")),
                status: status.code().unwrap_or(-1),
                stderr: log,
            });
        }

        Ok((status.code().unwrap_or(0), log))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescribeClusterResponse {
    pub cluster: ClusterDescription,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterDescription {
    #[serde(rename = "clusterStatus")]
    pub cluster_status: String,
    #[serde(rename = "cloudFormationStackStatus")]
    pub cloud_formation_stack_status: Option<String>,
    #[serde(rename = "computeFleetStatus")]
    pub compute_fleet_status: Option<String>,
    #[serde(rename = "headNode")]
    pub head_node: Option<HeadNodeDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadNodeDescription {
    #[serde(rename = "publicIpAddress")]
    pub public_ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_cluster_response_parses_documented_shape() {
        let json = r#"{
            "cluster": {
                "clusterStatus": "CREATE_COMPLETE",
                "cloudFormationStackStatus": "CREATE_COMPLETE",
                "computeFleetStatus": "RUNNING",
                "headNode": { "publicIpAddress": "203.0.113.10" }
            }
        }"#;
        let parsed: DescribeClusterResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.cluster.cluster_status, "CREATE_COMPLETE");
        assert_eq!(parsed.cluster.head_node.unwrap().public_ip_address.unwrap(), "203.0.113.10");
    }

    #[test]
    fn describe_cluster_response_tolerates_missing_head_node() {
        let json = r#"{"cluster": {"clusterStatus": "CREATE_IN_PROGRESS"}}"#;
        let parsed: DescribeClusterResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.cluster.head_node.is_none());
    }
}
