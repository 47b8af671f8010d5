use std::collections::HashSet;
use std::sync::OnceLock;

use pctl_seed::{regions, Seed};
use regex::Regex;

use crate::error::{ValidationError, Warning};

fn cluster_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap())
}

fn bucket_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").unwrap())
}

/// `name[@version][%compiler][+variant][+variant]…`, validated syntactically
/// only — semantic resolution (does the version/compiler/variant actually
/// exist) happens on the VM at install time, not here.
fn package_spec_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-z][a-z0-9_-]*(@[0-9][0-9a-zA-Z_.\-]*)?(%[a-z][a-z0-9_-]*(@[0-9][0-9a-zA-Z_.\-]*)?)?(\+[a-z][a-z0-9_-]*)*$",
        )
        .unwrap()
    })
}

/// Run every independent check over `seed` and return all problems found.
/// Never short-circuits: a failure in one section does not prevent the
/// others from running.
pub fn validate(seed: &Seed) -> (Vec<ValidationError>, Vec<Warning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_cluster(seed, &mut errors, &mut warnings);
    validate_compute(seed, &mut errors);
    validate_software(seed, &mut errors);
    validate_users(seed, &mut errors, &mut warnings);
    validate_data(seed, &mut errors);

    (errors, warnings)
}

fn validate_cluster(seed: &Seed, errors: &mut Vec<ValidationError>, warnings: &mut Vec<Warning>) {
    let name = &seed.cluster.name;
    if !cluster_name_re().is_match(name) || name.len() > 60 {
        errors.push(ValidationError::new(
            "cluster.name",
            format!(
                "'{}' must match ^[a-z][a-z0-9-]*$ and be at most 60 characters",
                name
            ),
        ));
    }

    if !regions::is_known_region(&seed.cluster.region) {
        errors.push(ValidationError::new(
            "cluster.region",
            format!("'{}' is not a recognized region", seed.cluster.region),
        ));
    }

    if seed.cluster.os.is_legacy() {
        warnings.push(Warning::new(
            "cluster.os",
            format!("'{}' is a legacy OS; prefer al2023 or a current ubuntu/rhel/rocky release", seed.cluster.os),
        ));
    }
}

fn validate_compute(seed: &Seed, errors: &mut Vec<ValidationError>) {
    let mut seen_names = HashSet::new();
    for (i, queue) in seed.compute.queues.iter().enumerate() {
        let path = format!("compute.queues[{}]", i);

        if !seen_names.insert(queue.name.clone()) {
            errors.push(ValidationError::new(
                format!("{}.name", path),
                format!("duplicate queue name '{}'", queue.name),
            ));
        }

        if queue.instance_types.is_empty() {
            errors.push(ValidationError::new(
                format!("{}.instance_types", path),
                "queue must declare at least one instance type".to_string(),
            ));
        }

        if queue.max_count < queue.min_count {
            errors.push(ValidationError::new(
                format!("{}.max_count", path),
                format!(
                    "max_count ({}) must be >= min_count ({})",
                    queue.max_count, queue.min_count
                ),
            ));
        }
    }
}

fn validate_software(seed: &Seed, errors: &mut Vec<ValidationError>) {
    for (i, spec) in seed.software.spack_packages.iter().enumerate() {
        if !package_spec_re().is_match(spec) {
            errors.push(ValidationError::new(
                format!("software.spack_packages[{}]", i),
                format!("'{}' is not a valid package spec", spec),
            ));
        }
    }
}

fn validate_users(seed: &Seed, errors: &mut Vec<ValidationError>, warnings: &mut Vec<Warning>) {
    let mut seen_names = HashSet::new();
    let mut seen_uids = HashSet::new();

    for (i, user) in seed.users.iter().enumerate() {
        let path = format!("users[{}]", i);

        if !seen_names.insert(user.name.clone()) {
            errors.push(ValidationError::new(
                format!("{}.name", path),
                format!("duplicate user name '{}'", user.name),
            ));
        }
        if !seen_uids.insert(user.uid) {
            errors.push(ValidationError::new(
                format!("{}.uid", path),
                format!("duplicate uid {}", user.uid),
            ));
        }

        if user.uid == 0 || user.uid > 65534 {
            errors.push(ValidationError::new(
                format!("{}.uid", path),
                format!("uid {} must be in [1, 65534]", user.uid),
            ));
        } else if user.uid < 1000 {
            warnings.push(Warning::new(
                format!("{}.uid", path),
                format!("uid {} is below 1000, which may collide with system accounts", user.uid),
            ));
        }

        if user.gid == 0 || user.gid > 65533 {
            errors.push(ValidationError::new(
                format!("{}.gid", path),
                format!("gid {} must be in [1, 65533]", user.gid),
            ));
        }
    }
}

fn validate_data(seed: &Seed, errors: &mut Vec<ValidationError>) {
    for (i, mount) in seed.data.s3_mounts.iter().enumerate() {
        let path = format!("data.s3_mounts[{}]", i);

        if !bucket_name_re().is_match(&mount.bucket) {
            errors.push(ValidationError::new(
                format!("{}.bucket", path),
                format!("'{}' is not a valid bucket name", mount.bucket),
            ));
        }

        if !mount.mount_point.starts_with('/') {
            errors.push(ValidationError::new(
                format!("{}.mount_point", path),
                format!("'{}' must be an absolute path", mount.mount_point),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pctl_seed::{ClusterConfig, Compute, DataConfig, Os, Queue, SoftwareConfig, User};

    fn base_seed() -> Seed {
        Seed {
            cluster: ClusterConfig { name: "mini".into(), region: "us-west-2".into(), os: Os::Al2023 },
            compute: Compute {
                head_node: "t3.medium".into(),
                queues: vec![Queue {
                    name: "compute".into(),
                    instance_types: vec!["t3.small".into()],
                    min_count: 0,
                    max_count: 2,
                }],
            },
            software: SoftwareConfig::default(),
            users: vec![],
            data: DataConfig::default(),
            extends: None,
        }
    }

    #[test]
    fn minimal_seed_has_no_errors() {
        let (errors, warnings) = validate(&base_seed());
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty());
    }

    #[test]
    fn uid_zero_is_an_error() {
        let mut seed = base_seed();
        seed.users.push(User { name: "alice".into(), uid: 0, gid: 1000 });
        let (errors, _) = validate(&seed);
        assert!(errors.iter().any(|e| e.path == "users[0].uid"));
    }

    #[test]
    fn uid_under_1000_is_a_warning_not_an_error() {
        let mut seed = base_seed();
        seed.users.push(User { name: "alice".into(), uid: 999, gid: 1000 });
        let (errors, warnings) = validate(&seed);
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.iter().any(|w| w.path == "users[0].uid"));
    }

    #[test]
    fn uid_65534_is_ok() {
        let mut seed = base_seed();
        seed.users.push(User { name: "alice".into(), uid: 65534, gid: 1000 });
        let (errors, warnings) = validate(&seed);
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty());
    }

    #[test]
    fn uid_above_65534_is_an_error() {
        let mut seed = base_seed();
        seed.users.push(User { name: "alice".into(), uid: 65535, gid: 1000 });
        let (errors, _) = validate(&seed);
        assert!(errors.iter().any(|e| e.path == "users[0].uid"));
    }

    #[test]
    fn zero_scale_queue_is_valid() {
        let mut seed = base_seed();
        seed.compute.queues[0].min_count = 0;
        seed.compute.queues[0].max_count = 0;
        let (errors, _) = validate(&seed);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn multiple_errors_all_accumulate() {
        let mut seed = base_seed();
        seed.cluster.name = "Invalid Name!".into();
        seed.cluster.region = "mars-central-1".into();
        seed.compute.queues[0].instance_types.clear();
        let (errors, _) = validate(&seed);
        assert_eq!(errors.len(), 3, "{:?}", errors);
    }

    #[test]
    fn package_spec_grammar() {
        let mut seed = base_seed();
        seed.software.spack_packages = vec!["gcc@11.3.0".into(), "openmpi@4.1.4%gcc@11.3.0".into()];
        let (errors, _) = validate(&seed);
        assert!(errors.is_empty(), "{:?}", errors);

        seed.software.spack_packages = vec!["Not A Spec!".into()];
        let (errors, _) = validate(&seed);
        assert!(!errors.is_empty());
    }
}
