use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrchestratorConfig {
    pub region: String,
    pub image: ImageConfig,
    pub head_node: HeadNodeConfig,
    pub scheduling: SchedulingConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shared_storage: Vec<SharedStorageEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageConfig {
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_ami: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeadNodeConfig {
    pub instance_type: String,
    pub networking: HeadNodeNetworking,
    pub ssh: SshConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_actions: Option<CustomActionsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam: Option<IamConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeadNodeNetworking {
    pub subnet_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SshConfig {
    pub key_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomActionsConfig {
    pub on_node_configured: OnNodeConfigured,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OnNodeConfigured {
    pub script: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamConfig {
    pub s3_access: Vec<S3Access>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Access {
    pub bucket_name: String,
    pub enable_write_access: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchedulingConfig {
    pub scheduler: String,
    pub slurm_queues: Vec<SlurmQueue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SlurmQueue {
    pub name: String,
    pub compute_resources: Vec<ComputeResource>,
    pub networking: QueueNetworking,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputeResource {
    pub name: String,
    pub instance_type: String,
    pub min_count: u32,
    pub max_count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueNetworking {
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SharedStorageEntry {
    pub name: String,
    pub storage_type: String,
    pub ebs_settings: EbsSettings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EbsSettings {
    pub snapshot_id: String,
}
