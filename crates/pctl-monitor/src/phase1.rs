use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pctl_cloud::{OrchestratorCli, StackEventsClient};

use crate::diagnosis;
use crate::display::{detect_stuck, eta_remaining_secs, format_eta, format_remaining, infra_progress_pct};
use crate::error::MonitorError;
use crate::types::EventTracker;

const WAIT_FOR_EXIST_INTERVAL: Duration = Duration::from_secs(5);
const WAIT_FOR_EXIST_MAX_ATTEMPTS: u32 = 20;
const EVENT_LOOP_INTERVAL: Duration = Duration::from_secs(15);

pub enum Phase1Outcome {
    Complete,
    NeedsRollbackMonitoring,
}

/// §4.I step 1: poll `describe-cluster` every 5s, up to 20 attempts, until
/// the stack becomes visible to the orchestrator.
pub async fn wait_for_exist(
    orchestrator: &OrchestratorCli,
    cluster_name: &str,
    region: &str,
    cancel: &CancellationToken,
) -> Result<(), MonitorError> {
    for attempt in 1..=WAIT_FOR_EXIST_MAX_ATTEMPTS {
        if cancel.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }
        if orchestrator.describe_cluster(cluster_name, region).await.is_ok() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(WAIT_FOR_EXIST_INTERVAL) => {}
            _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
        }
        if attempt % 5 == 0 {
            info!(cluster_name, attempt, "still waiting for stack to appear");
        }
    }
    Err(MonitorError::StackNotFound(cluster_name.to_string(), WAIT_FOR_EXIST_MAX_ATTEMPTS))
}

/// §4.I Phase 1: the infrastructure event loop, 0-70%.
pub async fn run(
    stack_events: &StackEventsClient,
    cluster_name: &str,
    region: &str,
    cancel: &CancellationToken,
) -> Result<Phase1Outcome, MonitorError> {
    let mut tracker = EventTracker::new();
    let mut floor_pct = 0.0_f64;

    loop {
        if cancel.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }

        let raw_events = stack_events.describe_stack_events(cluster_name).await?;
        let newly_seen = tracker.ingest(&raw_events);
        for event in &newly_seen {
            info!(
                cluster_name,
                logical_id = %event.logical_resource_id,
                resource_type = %event.resource_type,
                status = %event.resource_status,
                "stack event"
            );
        }

        let now = chrono::Utc::now();
        floor_pct = infra_progress_pct(&tracker.resources, floor_pct);
        let remaining = eta_remaining_secs(&tracker.resources, now);
        info!(
            cluster_name,
            pct = floor_pct,
            eta = %format_eta(remaining),
            remaining = %format_remaining(remaining),
            "infrastructure progress"
        );

        for stuck in detect_stuck(&tracker.resources, now) {
            if !tracker.mark_stuck_warned(&stuck.logical_resource_id) {
                continue;
            }
            warn!(
                cluster_name,
                logical_id = %stuck.logical_resource_id,
                resource_type = %stuck.resource_type,
                elapsed_secs = stuck.elapsed_secs,
                expected_secs = stuck.expected_secs,
                hint = stuck.hint,
                "resource appears stuck"
            );
        }

        let overall_status = latest_stack_status(&tracker);
        match overall_status.as_deref() {
            Some("CREATE_COMPLETE") => return Ok(Phase1Outcome::Complete),
            Some("CREATE_FAILED") => {
                let diagnosis = diagnosis::diagnose(cluster_name, region, &tracker.chronological);
                return Err(match diagnosis {
                    Some(d) => MonitorError::StackFailed(d),
                    None => MonitorError::ConfigurationFailed("CREATE_FAILED with no diagnosable event".to_string()),
                });
            }
            Some("ROLLBACK_IN_PROGRESS") => return Ok(Phase1Outcome::NeedsRollbackMonitoring),
            Some("ROLLBACK_COMPLETE") | Some("DELETE_COMPLETE") => {
                let diagnosis = diagnosis::diagnose(cluster_name, region, &tracker.chronological);
                return Err(match diagnosis {
                    Some(d) => MonitorError::RolledBack(d),
                    None => MonitorError::ConfigurationFailed("rollback completed with no diagnosable event".to_string()),
                });
            }
            _ => {}
        }

        tokio::select! {
            _ = tokio::time::sleep(EVENT_LOOP_INTERVAL) => {}
            _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
        }
    }
}

/// The stack's own status isn't one of the per-resource events; it's
/// inferred from well-known CloudFormation::Stack resource events when the
/// orchestrator surfaces them, falling back to treating "everything tracked
/// so far is CREATE_COMPLETE" as completion.
fn latest_stack_status(tracker: &EventTracker) -> Option<String> {
    if let Some(stack_event) = tracker
        .chronological
        .iter()
        .rev()
        .find(|e| e.resource_type == "AWS::CloudFormation::Stack")
    {
        return Some(stack_event.resource_status.clone());
    }
    if !tracker.resources.is_empty() && tracker.resources.values().all(|r| r.status == "CREATE_COMPLETE") {
        return Some("CREATE_COMPLETE".to_string());
    }
    if tracker.resources.values().any(|r| r.status == "CREATE_FAILED") {
        return Some("CREATE_FAILED".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pctl_cloud::StackEvent;

    #[test]
    fn all_resources_complete_infers_stack_complete() {
        let mut tracker = EventTracker::new();
        tracker.ingest(&[StackEvent {
            logical_resource_id: "Vpc".into(),
            resource_type: "AWS::EC2::VPC".into(),
            resource_status: "CREATE_COMPLETE".into(),
            resource_status_reason: None,
            timestamp: "2026-01-01T00:00:00Z".into(),
        }]);
        assert_eq!(latest_stack_status(&tracker).as_deref(), Some("CREATE_COMPLETE"));
    }

    #[test]
    fn no_events_yields_no_status() {
        let tracker = EventTracker::new();
        assert_eq!(latest_stack_status(&tracker), None);
    }
}
