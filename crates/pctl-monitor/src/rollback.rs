use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use pctl_cloud::StackEventsClient;

use crate::diagnosis;
use crate::error::MonitorError;
use crate::types::EventTracker;

const ROLLBACK_EVENT_LOOP_INTERVAL: Duration = Duration::from_secs(15);

/// Rollback Monitoring (§4.I): same cadence as Phase 1 but only `*DELETE*`
/// events count toward `deleted / total`; always ends in an error once the
/// rollback settles, since a rollback means the original `create` failed.
pub async fn run(
    stack_events: &StackEventsClient,
    cluster_name: &str,
    region: &str,
    cancel: &CancellationToken,
) -> Result<MonitorError, MonitorError> {
    let mut tracker = EventTracker::new();

    loop {
        if cancel.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }

        let raw_events = stack_events.describe_stack_events(cluster_name).await?;
        tracker.ingest(&raw_events);

        let delete_events: Vec<_> = tracker.resources.values().filter(|r| r.status.contains("DELETE")).collect();
        let deleted = delete_events.iter().filter(|r| r.status == "DELETE_COMPLETE").count();
        let total = delete_events.len().max(1);
        info!(cluster_name, deleted, total, "rollback progress");

        let terminal = tracker
            .chronological
            .iter()
            .rev()
            .find(|e| e.resource_type == "AWS::CloudFormation::Stack")
            .map(|e| e.resource_status.clone());

        match terminal.as_deref() {
            Some("ROLLBACK_COMPLETE") | Some("DELETE_COMPLETE") => {
                let diagnosis = diagnosis::diagnose(cluster_name, region, &tracker.chronological);
                return Ok(match diagnosis {
                    Some(d) => MonitorError::RolledBack(d),
                    None => MonitorError::ConfigurationFailed("rollback completed with no diagnosable event".to_string()),
                });
            }
            _ if !tracker.resources.is_empty() && tracker.resources.values().all(|r| r.status == "DELETE_COMPLETE") => {
                let diagnosis = diagnosis::diagnose(cluster_name, region, &tracker.chronological);
                return Ok(match diagnosis {
                    Some(d) => MonitorError::RolledBack(d),
                    None => MonitorError::ConfigurationFailed("rollback completed with no diagnosable event".to_string()),
                });
            }
            _ => {}
        }

        tokio::select! {
            _ = tokio::time::sleep(ROLLBACK_EVENT_LOOP_INTERVAL) => {}
            _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
        }
    }
}
