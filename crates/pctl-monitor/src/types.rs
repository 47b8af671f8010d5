use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use pctl_cloud::StackEvent;

/// Per-type expected durations (seconds) from the §4.I excerpt table.
/// Ranges in the table (e.g. "45-60") resolve to their upper bound so ETA
/// estimates err on the side of not flickering as a resource finishes early.
pub fn expected_duration_secs(resource_type: &str) -> u64 {
    match resource_type {
        "AWS::IAM::InstanceProfile" => 15,
        "AWS::EC2::VPC" => 30,
        "AWS::EC2::Subnet" | "AWS::EC2::RouteTable" => 60,
        "AWS::EC2::SecurityGroup" => 30,
        "AWS::IAM::Role" | "AWS::IAM::Policy" => 60,
        "AWS::Lambda::Function" => 90,
        "AWS::EC2::Instance" => 180,
        "AWS::EC2::Volume" => 120,
        "AWS::CloudFormation::WaitCondition" => 300,
        _ => 60,
    }
}

/// The curated "critical" set from §4.I's display policy: completed
/// resources of these types are listed individually rather than folded into
/// the non-critical summary count.
pub fn is_critical_resource_type(resource_type: &str) -> bool {
    matches!(
        resource_type,
        "AWS::EC2::VPC"
            | "AWS::EC2::InternetGateway"
            | "AWS::EC2::Subnet"
            | "AWS::EC2::SecurityGroup"
            | "AWS::EC2::RouteTable"
            | "AWS::IAM::Role"
            | "AWS::IAM::Policy"
            | "AWS::EC2::Instance"
            | "AWS::EC2::Volume"
            | "AWS::Logs::LogGroup"
            | "AWS::Lambda::Function"
    )
}

#[derive(Debug, Clone)]
pub struct ResourceState {
    pub resource_type: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// First time this resource was seen in an `*_IN_PROGRESS` status; the
    /// ETA calculation measures elapsed time against this, not against
    /// `timestamp` (which tracks the latest status change).
    pub first_in_progress_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Accumulates stack events across polling ticks: maintains `seen_events`
/// (keyed by `logical_id + status + timestamp`) to dedupe events already
/// displayed, and `resources`, the latest-known state per logical id.
#[derive(Debug, Default)]
pub struct EventTracker {
    pub resources: HashMap<String, ResourceState>,
    pub chronological: Vec<StackEvent>,
    seen: HashSet<(String, String, String)>,
    warned_stuck: HashSet<String>,
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a logical id as having already produced a stuck warning, so the
    /// per-tick event loop emits it once rather than on every remaining poll
    /// until the resource resolves. Returns `true` the first time it is
    /// called for a given id, `false` on every call after.
    pub fn mark_stuck_warned(&mut self, logical_resource_id: &str) -> bool {
        self.warned_stuck.insert(logical_resource_id.to_string())
    }

    /// Ingests one poll's worth of events, `raw` as returned by CloudFormation
    /// (newest first); reverses to chronological order, dedupes against
    /// `seen_events`, and updates `resources`. Returns the events newly seen
    /// this tick, in chronological order, for display.
    pub fn ingest(&mut self, raw_newest_first: &[StackEvent]) -> Vec<StackEvent> {
        let mut chronological = raw_newest_first.to_vec();
        chronological.reverse();

        let mut newly_seen = Vec::new();
        for event in chronological {
            let key = (event.logical_resource_id.clone(), event.resource_status.clone(), event.timestamp.clone());
            if !self.seen.insert(key) {
                continue;
            }

            let timestamp = parse_timestamp(&event.timestamp);
            let entry = self.resources.entry(event.logical_resource_id.clone()).or_insert_with(|| ResourceState {
                resource_type: event.resource_type.clone(),
                status: event.resource_status.clone(),
                timestamp,
                first_in_progress_at: None,
                reason: event.resource_status_reason.clone(),
            });
            entry.resource_type = event.resource_type.clone();
            entry.status = event.resource_status.clone();
            entry.timestamp = timestamp;
            entry.reason = event.resource_status_reason.clone();
            if event.resource_status.ends_with("_IN_PROGRESS") && entry.first_in_progress_at.is_none() {
                entry.first_in_progress_at = Some(timestamp);
            }

            self.chronological.push(event.clone());
            newly_seen.push(event);
        }
        newly_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, ty: &str, status: &str, ts: &str) -> StackEvent {
        StackEvent {
            logical_resource_id: id.to_string(),
            resource_type: ty.to_string(),
            resource_status: status.to_string(),
            resource_status_reason: None,
            timestamp: ts.to_string(),
        }
    }

    #[test]
    fn ingest_dedupes_events_already_seen() {
        let mut tracker = EventTracker::new();
        let batch = vec![event("Vpc", "AWS::EC2::VPC", "CREATE_IN_PROGRESS", "2026-01-01T00:00:00Z")];
        assert_eq!(tracker.ingest(&batch).len(), 1);
        assert_eq!(tracker.ingest(&batch).len(), 0);
    }

    #[test]
    fn ingest_records_first_in_progress_timestamp_once() {
        let mut tracker = EventTracker::new();
        tracker.ingest(&[event("Vpc", "AWS::EC2::VPC", "CREATE_IN_PROGRESS", "2026-01-01T00:00:00Z")]);
        let first = tracker.resources["Vpc"].first_in_progress_at;
        tracker.ingest(&[event("Vpc", "AWS::EC2::VPC", "CREATE_IN_PROGRESS", "2026-01-01T00:00:05Z")]);
        assert_eq!(tracker.resources["Vpc"].first_in_progress_at, first);
        assert_eq!(tracker.resources["Vpc"].status, "CREATE_IN_PROGRESS");
    }

    #[test]
    fn empty_stream_leaves_no_resources() {
        let tracker = EventTracker::new();
        assert!(tracker.resources.is_empty());
    }
}
