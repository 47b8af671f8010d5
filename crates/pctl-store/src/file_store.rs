use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::state::ClusterState;
use crate::store::StateStore;

/// Persists each cluster's state as `<dir>/<name>.json`, written atomically
/// via a temp file + rename (§4.F). `dir` is normally
/// `<config-dir>/state`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create the backing directory (`0755`) if it doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir.display().to_string(), source })?;
        set_dir_permissions(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[cfg(unix)]
fn set_dir_permissions(dir: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755))
        .map_err(|source| StoreError::Io { path: dir.display().to_string(), source })
}

#[cfg(not(unix))]
fn set_dir_permissions(_dir: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
        .map_err(|source| StoreError::Io { path: path.display().to_string(), source })
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn save(&self, state: &ClusterState) -> Result<(), StoreError> {
        let path = self.path_for(&state.name);
        let json = serde_json::to_vec_pretty(state)?;

        let tmp_path = self.dir.join(format!(".{}.{}.tmp", state.name, Uuid::new_v4()));
        let mut file = std::fs::File::create(&tmp_path)
            .map_err(|source| StoreError::Io { path: tmp_path.display().to_string(), source })?;
        file.write_all(&json).map_err(|source| StoreError::Io { path: tmp_path.display().to_string(), source })?;
        file.sync_all().map_err(|source| StoreError::Io { path: tmp_path.display().to_string(), source })?;
        drop(file);
        set_file_permissions(&tmp_path)?;
        std::fs::rename(&tmp_path, &path).map_err(|source| StoreError::Io { path: path.display().to_string(), source })?;

        Ok(())
    }

    async fn load(&self, name: &str) -> Result<ClusterState, StoreError> {
        let path = self.path_for(name);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(name.to_string())
            } else {
                StoreError::Io { path: path.display().to_string(), source }
            }
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::StateCorrupt { name: name.to_string(), source })
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(name).exists())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path_for(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path: path.display().to_string(), source }),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let entries = std::fs::read_dir(&self.dir).map_err(|source| StoreError::Io { path: self.dir.display().to_string(), source })?;
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io { path: self.dir.display().to_string(), source })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
