use serde::Deserialize;

use pctl_seed::{DataConfig, Os, Queue, SoftwareConfig, User};

/// A seed document as it appears on disk one `extends` link at a time: every
/// section the leaf seed doesn't declare is simply absent, to be supplied by
/// an ancestor during `merge`. Never handed to a caller directly — `resolve`
/// always folds a chain of these down to a complete `pctl_seed::Seed`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialSeed {
    #[serde(default)]
    pub cluster: PartialCluster,
    #[serde(default)]
    pub compute: PartialCompute,
    #[serde(default)]
    pub software: SoftwareConfig,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub extends: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialCluster {
    pub name: Option<String>,
    pub region: Option<String>,
    pub os: Option<Os>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialCompute {
    pub head_node: Option<String>,
    #[serde(default)]
    pub queues: Vec<Queue>,
}
