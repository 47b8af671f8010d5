use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::FingerprintError;
use crate::raw::PartialSeed;

pub const MAX_DEPTH: usize = 5;

fn load_partial(path: &Path) -> Result<PartialSeed, FingerprintError> {
    let path_str = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|source| FingerprintError::Io {
        path: path_str.clone(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| FingerprintError::ParseError {
        path: path_str,
        source,
    })
}

/// Path a relative `extends:` value resolves against — siblings of the
/// referring file, not the process's current directory.
fn extends_target(referrer: &Path, extends: &str) -> PathBuf {
    match referrer.parent() {
        Some(dir) => dir.join(extends),
        None => PathBuf::from(extends),
    }
}

/// Walk the `extends` chain from `path` up to its root, returning every
/// level in root-first order so callers can fold them with `merge` directly.
///
/// Cycle detection canonicalizes each visited path into a set; a path that
/// reappears (including `path` itself) is a cycle, not a coincidental
/// re-read. Depth is the number of `extends` hops, capped at [`MAX_DEPTH`].
pub fn load_chain(path: &Path) -> Result<Vec<(PathBuf, PartialSeed)>, FingerprintError> {
    let mut levels = Vec::new();
    let mut seen = HashSet::new();
    let mut current = path.to_path_buf();

    loop {
        let canonical = current
            .canonicalize()
            .map_err(|source| FingerprintError::Io { path: current.display().to_string(), source })?;

        if !seen.insert(canonical.clone()) {
            return Err(FingerprintError::Cycle(
                current.display().to_string(),
                path.display().to_string(),
            ));
        }

        if levels.len() > MAX_DEPTH {
            return Err(FingerprintError::Depth {
                path: path.display().to_string(),
                max: MAX_DEPTH,
            });
        }

        let partial = load_partial(&current)?;
        let next = partial.extends.clone();
        levels.push((current.clone(), partial));

        match next {
            Some(parent_ref) => {
                let parent_path = extends_target(&current, &parent_ref);
                if !parent_path.exists() {
                    return Err(FingerprintError::MissingBase(parent_path.display().to_string()));
                }
                current = parent_path;
            }
            None => break,
        }
    }

    levels.reverse();
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn single_file_chain_has_one_level() {
        let dir = tempdir();
        let path = write(dir.path(), "a.yaml", "cluster:\n  name: a\n  region: us-east-1\ncompute:\n  head_node: t3.medium\n");
        let chain = load_chain(&path).unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn two_level_chain_is_root_first() {
        let dir = tempdir();
        write(dir.path(), "base.yaml", "cluster:\n  name: base\n  region: us-east-1\ncompute:\n  head_node: t3.medium\n");
        let child = write(dir.path(), "child.yaml", "extends: base.yaml\ncluster:\n  name: child\n");
        let chain = load_chain(&child).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].1.cluster.name.as_deref(), Some("base"));
        assert_eq!(chain[1].1.cluster.name.as_deref(), Some("child"));
    }

    #[test]
    fn direct_cycle_is_detected() {
        let dir = tempdir();
        write(dir.path(), "a.yaml", "extends: b.yaml\ncluster:\n  name: a\n");
        let b = write(dir.path(), "b.yaml", "extends: a.yaml\ncluster:\n  name: b\n");
        let err = load_chain(&b).unwrap_err();
        assert!(matches!(err, FingerprintError::Cycle(_, _)));
    }

    #[test]
    fn depth_six_is_rejected() {
        let dir = tempdir();
        write(dir.path(), "l0.yaml", "cluster:\n  name: l0\n  region: us-east-1\ncompute:\n  head_node: t3.medium\n");
        for i in 1..=6 {
            write(
                dir.path(),
                &format!("l{}.yaml", i),
                &format!("extends: l{}.yaml\n", i - 1),
            );
        }
        let leaf = dir.path().join("l6.yaml");
        let err = load_chain(&leaf).unwrap_err();
        assert!(matches!(err, FingerprintError::Depth { .. }));
    }

    #[test]
    fn depth_five_is_accepted() {
        let dir = tempdir();
        write(dir.path(), "l0.yaml", "cluster:\n  name: l0\n  region: us-east-1\ncompute:\n  head_node: t3.medium\n");
        for i in 1..=5 {
            write(
                dir.path(),
                &format!("l{}.yaml", i),
                &format!("extends: l{}.yaml\n", i - 1),
            );
        }
        let leaf = dir.path().join("l5.yaml");
        let chain = load_chain(&leaf).unwrap();
        assert_eq!(chain.len(), 6);
    }

    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }
}
