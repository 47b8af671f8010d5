use pctl_cloud::StackEvent;
use pctl_monitor::display::{detect_stuck, display_plan};
use pctl_monitor::phase2::progress_pct;
use pctl_monitor::types::EventTracker;
use pctl_monitor::{diagnosis, MonitorError};

fn load_fixture(name: &str) -> Vec<StackEvent> {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let raw = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("parsing {path}: {e}"))
}

#[test]
fn empty_event_stream_yields_no_resources_or_diagnosis() {
    let events = load_fixture("empty_event_stream.json");
    let mut tracker = EventTracker::new();
    let newly_seen = tracker.ingest(&events);
    assert!(newly_seen.is_empty());
    assert!(tracker.resources.is_empty());
    assert!(diagnosis::diagnose("demo", "us-west-2", &tracker.chronological).is_none());
}

#[test]
fn critical_resource_only_display_folds_non_critical_completions() {
    let events = load_fixture("critical_resource_display.json");
    let mut tracker = EventTracker::new();
    tracker.ingest(&events);

    let plan = display_plan(&tracker.resources);
    // ClusterVPC (critical, complete) and HeadNode (in progress) are visible;
    // NatGateway (non-critical, complete) is folded into the summary count.
    assert_eq!(plan.visible.len(), 2);
    assert_eq!(plan.summarized_complete_count, 1);
    assert!(plan.visible.iter().any(|(id, _)| *id == "ClusterVPC"));
    assert!(plan.visible.iter().any(|(id, _)| *id == "HeadNode"));
}

#[test]
fn stuck_resource_detection_fires_past_three_times_its_expected_duration() {
    let events = load_fixture("stuck_resource.json");
    let mut tracker = EventTracker::new();
    tracker.ingest(&events);

    // AWS::EC2::Instance expects 180s; backdate first-seen well past 3x that.
    for resource in tracker.resources.values_mut() {
        resource.first_in_progress_at = Some(chrono::Utc::now() - chrono::Duration::seconds(700));
    }

    let stuck = detect_stuck(&tracker.resources, chrono::Utc::now());
    assert_eq!(stuck.len(), 1);
    assert_eq!(stuck[0].logical_resource_id, "HeadNode");
    assert!(stuck[0].elapsed_secs > stuck[0].expected_secs * 3);
}

#[test]
fn stuck_resource_warns_once_across_repeated_ticks() {
    let events = load_fixture("stuck_resource.json");
    let mut tracker = EventTracker::new();
    tracker.ingest(&events);

    for resource in tracker.resources.values_mut() {
        resource.first_in_progress_at = Some(chrono::Utc::now() - chrono::Duration::seconds(700));
    }

    // Simulate the 15s event-loop tick firing many times while the resource
    // stays stuck: the same logical id must only ever clear `mark_stuck_warned`
    // once, the way `phase1::run` consults it before emitting its warning.
    let mut emitted = 0;
    for _ in 0..40 {
        let now = chrono::Utc::now();
        for stuck in detect_stuck(&tracker.resources, now) {
            if tracker.mark_stuck_warned(&stuck.logical_resource_id) {
                emitted += 1;
            }
        }
    }
    assert_eq!(emitted, 1);
}

#[test]
fn rollback_transition_is_diagnosed_to_its_root_cause() {
    let events = load_fixture("rollback_transition.json");
    let mut tracker = EventTracker::new();
    tracker.ingest(&events);

    let terminal = tracker
        .chronological
        .iter()
        .rev()
        .find(|e| e.resource_type == "AWS::CloudFormation::Stack")
        .map(|e| e.resource_status.clone());
    assert_eq!(terminal.as_deref(), Some("ROLLBACK_COMPLETE"));

    let diagnosis = diagnosis::diagnose("demo", "us-west-2", &tracker.chronological).unwrap();
    assert_eq!(diagnosis.logical_resource_id, "HeadNode");
    assert!(diagnosis.reason.contains("insufficient capacity"));

    let err = MonitorError::RolledBack(diagnosis);
    assert!(matches!(err, MonitorError::RolledBack(_)));
}

#[test]
fn two_phase_progress_mapping_table() {
    assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("STARTING")), Some(80));
    assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("RUNNING")), Some(85));
    assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("ENABLED")), Some(90));
    assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("PROTECTED")), Some(90));
    assert_eq!(progress_pct("CREATE_IN_PROGRESS", Some("UNKNOWN")), Some(75));
    assert_eq!(progress_pct("CREATE_COMPLETE", None), Some(100));
    assert_eq!(progress_pct("CREATE_FAILED", None), Some(70));
}
