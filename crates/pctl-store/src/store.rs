use async_trait::async_trait;

use crate::error::StoreError;
use crate::state::ClusterState;

/// Persistence seam for [`ClusterState`]. `JsonFileStore` is the only real
/// implementation; `InMemoryStore` exists so `pctl-provisioner`'s tests
/// don't need a filesystem.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save(&self, state: &ClusterState) -> Result<(), StoreError>;
    async fn load(&self, name: &str) -> Result<ClusterState, StoreError>;
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}
