use std::path::Path;

use pctl_seed::{ClusterConfig, Compute, Seed};

use crate::chain::load_chain;
use crate::error::FingerprintError;
use crate::merge::merge;
use crate::raw::PartialSeed;

/// Load `path`, recursively resolving and merging its `extends` ancestry,
/// and return the single complete `Seed` that results.
///
/// The merged result must still declare `cluster.name`, `cluster.region` and
/// `compute.head_node` — nothing in the chain is allowed to leave those
/// unset, since nothing deeper in the system accepts a Seed without them.
pub fn resolve(path: impl AsRef<Path>) -> Result<Seed, FingerprintError> {
    let chain = load_chain(path.as_ref())?;
    let merged = fold_chain(chain)?;
    finalize(merged)
}

pub(crate) fn fold_chain(
    chain: Vec<(std::path::PathBuf, PartialSeed)>,
) -> Result<PartialSeed, FingerprintError> {
    let mut iter = chain.into_iter();
    let (_, mut acc) = iter.next().expect("load_chain never returns an empty chain");
    for (_, level) in iter {
        acc = merge(acc, level)?;
    }
    Ok(acc)
}

fn finalize(partial: PartialSeed) -> Result<Seed, FingerprintError> {
    let name = partial.cluster.name.ok_or(FingerprintError::Incomplete("cluster.name"))?;
    let region = partial.cluster.region.ok_or(FingerprintError::Incomplete("cluster.region"))?;
    let head_node = partial.compute.head_node.ok_or(FingerprintError::Incomplete("compute.head_node"))?;

    Ok(Seed {
        cluster: ClusterConfig { name, region, os: partial.cluster.os.unwrap_or_default() },
        compute: Compute { head_node, queues: partial.compute.queues },
        software: partial.software,
        users: partial.users,
        data: partial.data,
        extends: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn child_inherits_and_extends_base_packages() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "base.yaml",
            "cluster:\n  name: base\n  region: us-east-1\ncompute:\n  head_node: t3.medium\n  queues: []\nsoftware:\n  spack_packages: [gcc@11.3.0, openmpi@4.1.4]\n",
        );
        let child = write(
            dir.path(),
            "child.yaml",
            "extends: base.yaml\nsoftware:\n  spack_packages: [samtools@1.17]\n",
        );

        let seed = resolve(&child).unwrap();
        assert_eq!(seed.cluster.name, "base");
        assert_eq!(
            seed.software.spack_packages,
            vec!["gcc@11.3.0".to_string(), "openmpi@4.1.4".to_string(), "samtools@1.17".to_string()]
        );
    }

    #[test]
    fn leaf_missing_required_field_without_base_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "only.yaml", "software:\n  spack_packages: [gcc@11.3.0]\n");
        let err = resolve(&path).unwrap_err();
        assert!(matches!(err, FingerprintError::Incomplete(_)));
    }
}
