use std::path::Path;

use sha2::{Digest, Sha256};

use pctl_seed::Seed;

use crate::chain::load_chain;
use crate::error::FingerprintError;
use crate::merge::merge;
use crate::raw::PartialSeed;

/// Recorded package-manager version the bootstrap synthesizer pins its
/// installs to. Part of the fingerprint's input — bumping it invalidates
/// every cached artifact, which is the point.
pub const PKGMGR_VERSION: &str = "0.21.0";

/// Recorded module-system version the bootstrap synthesizer generates module
/// files against.
pub const MODSYS_VERSION: &str = "lmod-8.7.30";

fn level_hash(os: &str, packages: &[String], parent_fp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(os.as_bytes());
    hasher.update(b"\0");
    hasher.update(PKGMGR_VERSION.as_bytes());
    hasher.update(b"\0");
    hasher.update(MODSYS_VERSION.as_bytes());
    hasher.update(b"\0");
    for pkg in packages {
        hasher.update(pkg.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(parent_fp.as_bytes());

    let digest = hasher.finalize();
    let hex = hex_encode(&digest);
    hex[..16].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{:02x}", b).unwrap();
    }
    out
}

/// Compute the content-addressed fingerprint of the seed at `path`, walking
/// its `extends` chain the same way `resolve` does. Each level's own
/// effective OS and package list folds into the parent's fingerprint, so the
/// result changes iff any ancestor's relevant fields change.
pub fn fingerprint(path: impl AsRef<Path>) -> Result<String, FingerprintError> {
    let chain = load_chain(path.as_ref())?;
    fingerprint_chain(chain)
}

fn fingerprint_chain(chain: Vec<(std::path::PathBuf, PartialSeed)>) -> Result<String, FingerprintError> {
    let mut iter = chain.into_iter();
    let (_, mut acc) = iter.next().expect("load_chain never returns an empty chain");
    let mut fp = level_hash(
        acc.cluster.os.unwrap_or_default().orchestrator_name(),
        &acc.software.spack_packages,
        "",
    );

    for (_, level) in iter {
        acc = merge(acc, level)?;
        fp = level_hash(
            acc.cluster.os.unwrap_or_default().orchestrator_name(),
            &acc.software.spack_packages,
            &fp,
        );
    }

    Ok(fp)
}

/// Fingerprint an already-fully-resolved `Seed` with no ancestry (e.g. one
/// reconstructed from `ClusterState` without access to the original file).
/// Equivalent to `fingerprint(path)` for a seed whose chain has length one.
pub fn fingerprint_seed(seed: &Seed) -> String {
    level_hash(seed.cluster.os.orchestrator_name(), &seed.software.spack_packages, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn fingerprint_is_16_hex_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.yaml",
            "cluster:\n  name: a\n  region: us-east-1\ncompute:\n  head_node: t3.medium\n",
        );
        let fp = fingerprint(&path).unwrap();
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.yaml",
            "cluster:\n  name: a\n  region: us-east-1\n  os: ubuntu2204\ncompute:\n  head_node: t3.medium\nsoftware:\n  spack_packages: [gcc@11.3.0]\n",
        );
        assert_eq!(fingerprint(&path).unwrap(), fingerprint(&path).unwrap());
    }

    #[test]
    fn adding_a_package_changes_the_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let before = write(
            dir.path(),
            "before.yaml",
            "cluster:\n  name: a\n  region: us-east-1\ncompute:\n  head_node: t3.medium\nsoftware:\n  spack_packages: [gcc@11.3.0]\n",
        );
        let after = write(
            dir.path(),
            "after.yaml",
            "cluster:\n  name: a\n  region: us-east-1\ncompute:\n  head_node: t3.medium\nsoftware:\n  spack_packages: [gcc@11.3.0, cmake@3.26.0]\n",
        );
        assert_ne!(fingerprint(&before).unwrap(), fingerprint(&after).unwrap());
    }

    #[test]
    fn child_fingerprint_differs_from_base_and_changing_base_changes_both() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "base.yaml",
            "cluster:\n  name: base\n  region: us-east-1\ncompute:\n  head_node: t3.medium\nsoftware:\n  spack_packages: [gcc@11.3.0, openmpi@4.1.4]\n",
        );
        let child = write(
            dir.path(),
            "child.yaml",
            "extends: base.yaml\nsoftware:\n  spack_packages: [samtools@1.17]\n",
        );
        let base_path = dir.path().join("base.yaml");

        let base_fp_before = fingerprint(&base_path).unwrap();
        let child_fp_before = fingerprint(&child).unwrap();
        assert_ne!(base_fp_before, child_fp_before);

        write(
            dir.path(),
            "base.yaml",
            "cluster:\n  name: base\n  region: us-east-1\ncompute:\n  head_node: t3.medium\nsoftware:\n  spack_packages: [gcc@11.3.0, openmpi@4.1.4, cmake@3.26.0]\n",
        );

        let base_fp_after = fingerprint(&base_path).unwrap();
        let child_fp_after = fingerprint(&child).unwrap();
        assert_ne!(base_fp_before, base_fp_after);
        assert_ne!(child_fp_before, child_fp_after);
    }
}
