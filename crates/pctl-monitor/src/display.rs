use chrono::{DateTime, Utc};

use crate::types::{expected_duration_secs, is_critical_resource_type, ResourceState};

/// §4.I step 3: resources shown individually vs. folded into a summary.
pub struct DisplayPlan<'a> {
    pub visible: Vec<(&'a str, &'a ResourceState)>,
    pub summarized_complete_count: usize,
}

pub fn display_plan(resources: &std::collections::HashMap<String, ResourceState>) -> DisplayPlan<'_> {
    let mut visible = Vec::new();
    let mut summarized = 0;
    for (id, state) in resources {
        let in_progress_or_failed = state.status.ends_with("_IN_PROGRESS") || state.status.ends_with("_FAILED");
        let critical_and_complete = state.status.ends_with("_COMPLETE") && is_critical_resource_type(&state.resource_type);
        if in_progress_or_failed || critical_and_complete {
            visible.push((id.as_str(), state));
        } else if state.status.ends_with("_COMPLETE") {
            summarized += 1;
        }
    }
    DisplayPlan { visible, summarized_complete_count: summarized }
}

/// §4.I step 4: `pct = completed / total * 70`, monotonic non-decreasing.
/// `floor_pct` is the caller-tracked high-water mark from earlier ticks.
pub fn infra_progress_pct(resources: &std::collections::HashMap<String, ResourceState>, floor_pct: f64) -> f64 {
    let total = resources.len();
    if total == 0 {
        return floor_pct;
    }
    let completed = resources.values().filter(|r| r.status == "CREATE_COMPLETE").count();
    let raw = (completed as f64 / total as f64) * 70.0;
    raw.max(floor_pct)
}

/// §4.I step 5: sum of per-resource remaining time. For an in-progress
/// resource, elapsed since its first-seen `*_IN_PROGRESS` timestamp is
/// subtracted from its expected duration; the remainder never drops below
/// 30s so the estimate doesn't flicker to zero while still waiting on a
/// CloudFormation completion event.
pub fn eta_remaining_secs(resources: &std::collections::HashMap<String, ResourceState>, now: DateTime<Utc>) -> u64 {
    resources
        .values()
        .filter(|r| r.status != "CREATE_COMPLETE")
        .map(|r| {
            let expected = expected_duration_secs(&r.resource_type);
            if r.status == "CREATE_IN_PROGRESS" {
                match r.first_in_progress_at {
                    Some(first_seen) => {
                        let elapsed = (now - first_seen).num_seconds().max(0) as u64;
                        expected.saturating_sub(elapsed).max(30)
                    }
                    None => expected,
                }
            } else {
                expected
            }
        })
        .sum()
}

pub fn format_eta(remaining_secs: u64) -> String {
    let h = remaining_secs / 3600;
    let m = (remaining_secs % 3600) / 60;
    let s = remaining_secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

pub fn format_remaining(remaining_secs: u64) -> String {
    let m = remaining_secs / 60;
    let s = remaining_secs % 60;
    format!("{m}m {s}s")
}

#[derive(Debug, Clone)]
pub struct StuckWarning {
    pub logical_resource_id: String,
    pub resource_type: String,
    pub elapsed_secs: u64,
    pub expected_secs: u64,
    pub hint: &'static str,
}

/// §4.I step 6: an `IN_PROGRESS` resource stuck at more than 3x its expected
/// duration. Not fatal — the caller keeps polling.
pub fn detect_stuck(resources: &std::collections::HashMap<String, ResourceState>, now: DateTime<Utc>) -> Vec<StuckWarning> {
    resources
        .iter()
        .filter(|(_, r)| r.status == "CREATE_IN_PROGRESS")
        .filter_map(|(id, r)| {
            let first_seen = r.first_in_progress_at?;
            let elapsed = (now - first_seen).num_seconds().max(0) as u64;
            let expected = expected_duration_secs(&r.resource_type);
            if elapsed > expected * 3 {
                Some(StuckWarning {
                    logical_resource_id: id.clone(),
                    resource_type: r.resource_type.clone(),
                    elapsed_secs: elapsed,
                    expected_secs: expected,
                    hint: crate::diagnosis::type_hint(&r.resource_type),
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resource(ty: &str, status: &str, first_in_progress_at: Option<DateTime<Utc>>) -> ResourceState {
        ResourceState {
            resource_type: ty.to_string(),
            status: status.to_string(),
            timestamp: Utc::now(),
            first_in_progress_at,
            reason: None,
        }
    }

    #[test]
    fn progress_is_monotonic_against_floor() {
        let mut resources = HashMap::new();
        resources.insert("a".to_string(), resource("AWS::EC2::VPC", "CREATE_COMPLETE", None));
        resources.insert("b".to_string(), resource("AWS::EC2::Instance", "CREATE_IN_PROGRESS", None));
        let pct = infra_progress_pct(&resources, 40.0);
        assert!(pct >= 40.0);
    }

    #[test]
    fn eta_floors_remaining_at_30_seconds() {
        let mut resources = HashMap::new();
        let now = Utc::now();
        resources.insert(
            "a".to_string(),
            resource("AWS::EC2::SecurityGroup", "CREATE_IN_PROGRESS", Some(now - chrono::Duration::seconds(1000))),
        );
        let remaining = eta_remaining_secs(&resources, now);
        assert_eq!(remaining, 30);
    }

    #[test]
    fn stuck_detection_fires_past_three_times_expected() {
        let mut resources = HashMap::new();
        let now = Utc::now();
        resources.insert(
            "Vpc".to_string(),
            resource("AWS::EC2::VPC", "CREATE_IN_PROGRESS", Some(now - chrono::Duration::seconds(200))),
        );
        let stuck = detect_stuck(&resources, now);
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].expected_secs, 30);
    }

    #[test]
    fn non_stuck_resource_is_not_flagged() {
        let mut resources = HashMap::new();
        let now = Utc::now();
        resources.insert(
            "Vpc".to_string(),
            resource("AWS::EC2::VPC", "CREATE_IN_PROGRESS", Some(now - chrono::Duration::seconds(10))),
        );
        assert!(detect_stuck(&resources, now).is_empty());
    }

    #[test]
    fn display_plan_folds_non_critical_completions() {
        let mut resources = HashMap::new();
        resources.insert("a".to_string(), resource("AWS::EC2::VPC", "CREATE_COMPLETE", None));
        resources.insert("b".to_string(), resource("AWS::EC2::NatGateway", "CREATE_COMPLETE", None));
        let plan = display_plan(&resources);
        assert_eq!(plan.visible.len(), 1);
        assert_eq!(plan.summarized_complete_count, 1);
    }
}
