use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use pctl_seed::{Queue, User};

use crate::error::FingerprintError;
use crate::raw::PartialSeed;

/// `name` component of a package spec, i.e. everything before the first of
/// `@`, `%`, `+`. Used to detect version conflicts between merged package lists.
fn package_name(spec: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[a-z0-9_-]+").unwrap());
    re.find(spec).map(|m| m.as_str()).unwrap_or(spec)
}

/// Concatenate `base` then `child`, collapsing entries that share `key` down
/// to a single slot (the child's value wins, the slot's position is the
/// first place that key appeared).
fn merge_by_key<T: Clone>(base: &[T], child: &[T], key: impl Fn(&T) -> String) -> Vec<T> {
    let mut order = Vec::new();
    let mut map: HashMap<String, T> = HashMap::new();

    for item in base.iter().chain(child.iter()) {
        let k = key(item);
        if !map.contains_key(&k) {
            order.push(k.clone());
        }
        map.insert(k, item.clone());
    }

    order.into_iter().map(|k| map.remove(&k).unwrap()).collect()
}

fn merge_queues(base: &[Queue], child: &[Queue]) -> Vec<Queue> {
    merge_by_key(base, child, |q| q.name.clone())
}

fn merge_users(base: &[User], child: &[User]) -> Vec<User> {
    merge_by_key(base, child, |u| u.name.clone())
}

fn merge_packages(base: &[String], child: &[String]) -> Result<Vec<String>, FingerprintError> {
    let merged = merge_by_key(base, child, |s| s.clone());

    let mut by_name: HashMap<&str, &String> = HashMap::new();
    for spec in &merged {
        let name = package_name(spec);
        if let Some(existing) = by_name.insert(name, spec) {
            if existing != spec {
                return Err(FingerprintError::Conflict {
                    name: name.to_string(),
                    a: existing.clone(),
                    b: spec.clone(),
                });
            }
        }
    }

    Ok(merged)
}

/// Fold `child` over `base`: scalars take the child's value when present,
/// ordered collections concatenate with child-side-wins de-duplication.
pub fn merge(base: PartialSeed, child: PartialSeed) -> Result<PartialSeed, FingerprintError> {
    let cluster = crate::raw::PartialCluster {
        name: child.cluster.name.or(base.cluster.name),
        region: child.cluster.region.or(base.cluster.region),
        os: child.cluster.os.or(base.cluster.os),
    };

    let compute = crate::raw::PartialCompute {
        head_node: child.compute.head_node.or(base.compute.head_node),
        queues: merge_queues(&base.compute.queues, &child.compute.queues),
    };

    let software = pctl_seed::SoftwareConfig {
        spack_packages: merge_packages(&base.software.spack_packages, &child.software.spack_packages)?,
    };

    let users = merge_users(&base.users, &child.users);

    let data = pctl_seed::DataConfig {
        s3_mounts: base
            .data
            .s3_mounts
            .into_iter()
            .chain(child.data.s3_mounts)
            .collect(),
    };

    Ok(PartialSeed {
        cluster,
        compute,
        software,
        users,
        data,
        extends: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages(specs: &[&str]) -> Vec<String> {
        specs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn packages_concatenate_in_order() {
        let base = packages(&["gcc@11.3.0", "openmpi@4.1.4"]);
        let child = packages(&["samtools@1.17"]);
        let merged = merge_packages(&base, &child).unwrap();
        assert_eq!(merged, packages(&["gcc@11.3.0", "openmpi@4.1.4", "samtools@1.17"]));
    }

    #[test]
    fn exact_duplicate_collapses_to_one_entry() {
        let base = packages(&["gcc@11.3.0"]);
        let child = packages(&["gcc@11.3.0"]);
        let merged = merge_packages(&base, &child).unwrap();
        assert_eq!(merged, packages(&["gcc@11.3.0"]));
    }

    #[test]
    fn version_conflict_on_same_name_is_an_error() {
        let base = packages(&["gcc@11.3.0"]);
        let child = packages(&["gcc@12.2.0"]);
        let err = merge_packages(&base, &child).unwrap_err();
        assert!(matches!(err, FingerprintError::Conflict { .. }));
    }

    #[test]
    fn queues_merge_by_name_child_wins() {
        let base = vec![Queue { name: "compute".into(), instance_types: vec!["c5.large".into()], min_count: 0, max_count: 4 }];
        let child = vec![Queue { name: "compute".into(), instance_types: vec!["c5.xlarge".into()], min_count: 0, max_count: 8 }];
        let merged = merge_queues(&base, &child);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].max_count, 8);
    }
}
