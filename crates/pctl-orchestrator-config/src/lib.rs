pub mod project;
pub mod types;

pub use project::{project, ProjectionParams};
pub use types::OrchestratorConfig;

/// Render a projected config as the YAML document the orchestrator CLI's
/// `--cluster-configuration` flag expects.
pub fn to_yaml(config: &OrchestratorConfig) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(config)
}
