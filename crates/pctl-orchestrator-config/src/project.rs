use pctl_seed::Seed;

use crate::types::{
    ComputeResource, CustomActionsConfig, EbsSettings, HeadNodeConfig, HeadNodeNetworking,
    IamConfig, ImageConfig, OnNodeConfigured, OrchestratorConfig, QueueNetworking, S3Access,
    SchedulingConfig, SharedStorageEntry, SlurmQueue, SshConfig,
};

/// Runtime parameters the projection needs beyond what's in the seed: values
/// the Provisioner only learns by actually creating things (subnet, bootstrap
/// script URI) or that are operator-supplied (key name).
#[derive(Debug, Clone, Default)]
pub struct ProjectionParams {
    pub key_name: String,
    pub subnet_id: String,
    pub custom_image_id: Option<String>,
    pub bootstrap_script_uri: Option<String>,
    /// Set when the custom-image pathway is snapshot-based; adds a
    /// `SharedStorage` entry backed by the snapshot. `None` for an AMI-based
    /// custom image or no custom image at all.
    pub snapshot_id: Option<String>,
}

/// An instance type as it appears in an AWS resource name: dots aren't legal
/// there, so `c5.xlarge` becomes `c5-xlarge`.
fn sanitize_name(instance_type: &str) -> String {
    instance_type.replace('.', "-")
}

/// Project `seed` plus `params` onto the orchestrator's native config shape.
///
/// A queue with a single instance type is still emitted as a one-element
/// `ComputeResources` list — there is no special-cased scalar form. Empty
/// `software`/`users`/`data` sections simply produce no downstream fields
/// (no `CustomActions`, no `Iam.S3Access`).
pub fn project(seed: &Seed, params: &ProjectionParams) -> OrchestratorConfig {
    let image = ImageConfig {
        os: seed.cluster.os.orchestrator_name().to_string(),
        custom_ami: params.custom_image_id.clone(),
    };

    let custom_actions = params.bootstrap_script_uri.as_ref().map(|uri| CustomActionsConfig {
        on_node_configured: OnNodeConfigured { script: uri.clone() },
    });

    let bucket_names: Vec<String> =
        seed.data.s3_mounts.iter().map(|m| m.bucket.clone()).collect();
    let iam = if bucket_names.is_empty() {
        None
    } else {
        Some(IamConfig {
            s3_access: bucket_names
                .into_iter()
                .map(|bucket_name| S3Access { bucket_name, enable_write_access: true })
                .collect(),
        })
    };

    let head_node = HeadNodeConfig {
        instance_type: seed.compute.head_node.clone(),
        networking: HeadNodeNetworking { subnet_id: params.subnet_id.clone() },
        ssh: SshConfig { key_name: params.key_name.clone() },
        custom_actions,
        iam,
    };

    let slurm_queues = seed
        .compute
        .queues
        .iter()
        .map(|queue| SlurmQueue {
            name: queue.name.clone(),
            compute_resources: queue
                .instance_types
                .iter()
                .map(|instance_type| ComputeResource {
                    name: sanitize_name(instance_type),
                    instance_type: instance_type.clone(),
                    min_count: queue.min_count,
                    max_count: queue.max_count,
                })
                .collect(),
            networking: QueueNetworking { subnet_ids: vec![params.subnet_id.clone()] },
        })
        .collect();

    let shared_storage = match &params.snapshot_id {
        Some(snapshot_id) => vec![SharedStorageEntry {
            name: "shared".to_string(),
            storage_type: "Ebs".to_string(),
            ebs_settings: EbsSettings { snapshot_id: snapshot_id.clone() },
        }],
        None => Vec::new(),
    };

    OrchestratorConfig {
        region: seed.cluster.region.clone(),
        image,
        head_node,
        scheduling: SchedulingConfig { scheduler: "slurm".to_string(), slurm_queues },
        shared_storage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pctl_seed::{ClusterConfig, Compute, DataConfig, Os, Queue, S3Mount, SoftwareConfig};

    fn seed() -> Seed {
        Seed {
            cluster: ClusterConfig { name: "demo".into(), region: "us-west-2".into(), os: Os::Al2023 },
            compute: Compute {
                head_node: "c5.xlarge".into(),
                queues: vec![Queue {
                    name: "compute".into(),
                    instance_types: vec!["c5.large".into()],
                    min_count: 0,
                    max_count: 4,
                }],
            },
            software: SoftwareConfig::default(),
            users: vec![],
            data: DataConfig::default(),
            extends: None,
        }
    }

    fn params() -> ProjectionParams {
        ProjectionParams {
            key_name: "demo-key".into(),
            subnet_id: "subnet-abc123".into(),
            custom_image_id: None,
            bootstrap_script_uri: None,
            snapshot_id: None,
        }
    }

    #[test]
    fn os_maps_to_orchestrator_vocabulary() {
        let config = project(&seed(), &params());
        assert_eq!(config.image.os, "alinux2023");
    }

    #[test]
    fn single_instance_type_queue_is_still_a_list() {
        let config = project(&seed(), &params());
        assert_eq!(config.scheduling.slurm_queues[0].compute_resources.len(), 1);
    }

    #[test]
    fn no_bootstrap_script_means_no_custom_actions() {
        let config = project(&seed(), &params());
        assert!(config.head_node.custom_actions.is_none());
    }

    #[test]
    fn bootstrap_script_present_sets_custom_actions() {
        let mut p = params();
        p.bootstrap_script_uri = Some("s3://bucket/demo/install-software.sh".into());
        let config = project(&seed(), &p);
        assert_eq!(
            config.head_node.custom_actions.unwrap().on_node_configured.script,
            "s3://bucket/demo/install-software.sh"
        );
    }

    #[test]
    fn no_s3_mounts_means_no_iam_section() {
        let config = project(&seed(), &params());
        assert!(config.head_node.iam.is_none());
    }

    #[test]
    fn s3_mounts_produce_iam_policy_per_bucket() {
        let mut s = seed();
        s.data.s3_mounts.push(S3Mount { bucket: "my-bucket".into(), mount_point: "/shared".into() });
        let config = project(&s, &params());
        let iam = config.head_node.iam.unwrap();
        assert_eq!(iam.s3_access.len(), 1);
        assert_eq!(iam.s3_access[0].bucket_name, "my-bucket");
    }

    #[test]
    fn no_snapshot_means_no_shared_storage() {
        let config = project(&seed(), &params());
        assert!(config.shared_storage.is_empty());
    }

    #[test]
    fn snapshot_backed_image_adds_shared_storage() {
        let mut p = params();
        p.snapshot_id = Some("snap-0123456789abcdef0".into());
        let config = project(&seed(), &p);
        assert_eq!(config.shared_storage.len(), 1);
        assert_eq!(config.shared_storage[0].ebs_settings.snapshot_id, "snap-0123456789abcdef0");
    }

    #[test]
    fn instance_type_dots_are_sanitized_in_resource_name() {
        let config = project(&seed(), &params());
        assert_eq!(config.scheduling.slurm_queues[0].compute_resources[0].name, "c5-large");
    }
}
