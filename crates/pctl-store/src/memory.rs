use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::state::ClusterState;
use crate::store::StateStore;

/// In-memory [`StateStore`] for tests. All data is lost on process exit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<HashMap<String, ClusterState>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn save(&self, state: &ClusterState) -> Result<(), StoreError> {
        self.inner.write().await.insert(state.name.clone(), state.clone());
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<ClusterState, StoreError> {
        self.inner
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.inner.write().await.remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.inner.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
