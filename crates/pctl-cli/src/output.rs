use pctl_config::{ValidationError, Warning};
use pctl_store::ClusterState;

/// Render validation results as human-readable text, one finding per line
/// with its dotted field path.
pub fn render_validation(errors: &[ValidationError], warnings: &[Warning]) -> String {
    if errors.is_empty() && warnings.is_empty() {
        return "Seed is valid.".to_string();
    }
    let mut out = String::new();
    for error in errors {
        out.push_str(&format!("error: {}\n", error));
    }
    for warning in warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }
    out
}

pub fn render_cluster_state(state: &ClusterState) -> String {
    let mut out = String::new();
    out.push_str(&format!("cluster:     {}\n", state.name));
    out.push_str(&format!("region:      {}\n", state.region));
    out.push_str(&format!("status:      {}\n", state.status));
    out.push_str(&format!("seed:        {}\n", state.seed_path));
    out.push_str(&format!("key name:    {}\n", state.key_name));
    if let Some(ip) = &state.head_node_ip {
        out.push_str(&format!("head node:   {}\n", ip));
    }
    if let Some(uri) = &state.bootstrap_script_uri {
        out.push_str(&format!("bootstrap:   {}\n", uri));
    }
    out.push_str(&format!("updated at:  {}\n", state.updated_at));
    out
}

pub fn render_cluster_list(names: &[String]) -> String {
    if names.is_empty() {
        return "No clusters.".to_string();
    }
    let mut sorted = names.to_vec();
    sorted.sort();
    sorted.join("\n")
}
