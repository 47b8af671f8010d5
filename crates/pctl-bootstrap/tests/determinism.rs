use pctl_bootstrap::{synthesize, BootstrapOptions};
use pctl_seed::{ClusterConfig, Compute, DataConfig, Os, Queue, Seed, SoftwareConfig, User};

fn seed() -> Seed {
    Seed {
        cluster: ClusterConfig { name: "integ".into(), region: "us-east-1".into(), os: Os::Ubuntu2204 },
        compute: Compute {
            head_node: "c6i.xlarge".into(),
            queues: vec![Queue {
                name: "gpu".into(),
                instance_types: vec!["p3.2xlarge".into()],
                min_count: 0,
                max_count: 2,
            }],
        },
        software: SoftwareConfig { spack_packages: vec!["gcc@12.2.0".into(), "fftw@3.3.10".into()] },
        users: vec![User { name: "alice".into(), uid: 2001, gid: 2001 }],
        data: DataConfig::default(),
        extends: None,
    }
}

#[test]
fn identical_seed_produces_byte_identical_script_across_separate_calls() {
    let opts = BootstrapOptions::default();
    let first = synthesize(&seed(), &opts).unwrap();
    let second = synthesize(&seed(), &opts).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn changing_admin_user_changes_ownership_lines_only() {
    let mut opts_a = BootstrapOptions::default();
    opts_a.admin_user = "ec2-user".to_string();
    let mut opts_b = BootstrapOptions::default();
    opts_b.admin_user = "ubuntu".to_string();

    let a = synthesize(&seed(), &opts_a).unwrap();
    let b = synthesize(&seed(), &opts_b).unwrap();
    assert_ne!(a, b);
    assert!(a.contains("chown -R ec2-user:ec2-user"));
    assert!(b.contains("chown -R ubuntu:ubuntu"));
}
