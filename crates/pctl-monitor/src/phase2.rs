use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use pctl_cloud::OrchestratorCli;

use crate::error::MonitorError;

const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPhaseState {
    Pending,
    Running,
    Ready,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSubPhases {
    pub head_node: SubPhaseState,
    pub scheduler_controller: SubPhaseState,
    pub compute_fleet: SubPhaseState,
}

/// §4.I Phase 2 step 2: `(cluster_status, compute_fleet_status)` mapping.
/// Returns `None` for any combination not in the table (the caller keeps
/// polling rather than guessing a percentage).
pub fn progress_pct(cluster_status: &str, compute_fleet_status: Option<&str>) -> Option<u8> {
    match cluster_status {
        "CREATE_COMPLETE" => Some(100),
        "CREATE_FAILED" => Some(70),
        "CREATE_IN_PROGRESS" => Some(match compute_fleet_status {
            Some("STARTING") => 80,
            Some("RUNNING") => 85,
            Some("ENABLED") | Some("PROTECTED") => 90,
            _ => 75,
        }),
        _ => None,
    }
}

/// §4.I Phase 2 step 3: tri-state icons for the three sub-phases.
pub fn sub_phases(cluster_status: &str, compute_fleet_status: Option<&str>) -> ConfigSubPhases {
    use SubPhaseState::*;
    let head_node = if cluster_status == "CREATE_COMPLETE" { Ready } else { Running };
    let scheduler_controller = match cluster_status {
        "CREATE_COMPLETE" => Ready,
        "CREATE_IN_PROGRESS" => Running,
        _ => Pending,
    };
    let compute_fleet = match compute_fleet_status {
        Some("RUNNING") | Some("ENABLED") | Some("PROTECTED") => Ready,
        Some("STARTING") => Running,
        _ => Pending,
    };
    ConfigSubPhases { head_node, scheduler_controller, compute_fleet }
}

pub struct Phase2Outcome {
    pub head_node_ip: Option<String>,
}

/// §4.I Phase 2: configuration, 70-100%, driven off cluster-level status
/// rather than stack events.
pub async fn run(
    orchestrator: &OrchestratorCli,
    cluster_name: &str,
    region: &str,
    cancel: &CancellationToken,
) -> Result<Phase2Outcome, MonitorError> {
    loop {
        if cancel.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }

        let description = orchestrator.describe_cluster(cluster_name, region).await?;
        let cluster_status = description.cluster.cluster_status.as_str();
        let compute_fleet_status = description.cluster.compute_fleet_status.as_deref();

        if let Some(pct) = progress_pct(cluster_status, compute_fleet_status) {
            let phases = sub_phases(cluster_status, compute_fleet_status);
            info!(
                cluster_name,
                pct,
                head_node = ?phases.head_node,
                scheduler_controller = ?phases.scheduler_controller,
                compute_fleet = ?phases.compute_fleet,
                "configuration progress"
            );
        }

        match cluster_status {
            "CREATE_COMPLETE" => {
                let head_node_ip = description.cluster.head_node.and_then(|h| h.public_ip_address);
                return Ok(Phase2Outcome { head_node_ip });
            }
            "CREATE_FAILED" => return Err(MonitorError::ConfigurationFailed(cluster_status.to_string())),
            _ => {}
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_the_documented_cluster_status_table() {
        assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("STARTING")), Some(80));
        assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("RUNNING")), Some(85));
        assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("ENABLED")), Some(90));
        assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("PROTECTED")), Some(90));
        assert_eq!(progress_pct("CREATE_IN_PROGRESS", None), Some(75));
        assert_eq!(progress_pct("CREATE_COMPLETE", None), Some(100));
        assert_eq!(progress_pct("CREATE_FAILED", None), Some(70));
        assert_eq!(progress_pct("ROLLBACK_IN_PROGRESS", None), None);
    }

    #[test]
    fn sub_phases_reach_ready_only_on_terminal_statuses() {
        let phases = sub_phases("CREATE_COMPLETE", Some("RUNNING"));
        assert_eq!(phases.head_node, SubPhaseState::Ready);
        assert_eq!(phases.scheduler_controller, SubPhaseState::Ready);
        assert_eq!(phases.compute_fleet, SubPhaseState::Ready);

        let phases = sub_phases("CREATE_IN_PROGRESS", Some("STARTING"));
        assert_eq!(phases.head_node, SubPhaseState::Running);
        assert_eq!(phases.compute_fleet, SubPhaseState::Running);
    }
}
