use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("seed error: {0}")]
    Seed(#[from] pctl_fingerprint::FingerprintError),

    #[error("seed validation failed: {0}")]
    Validation(#[from] pctl_config::ValidationErrors),

    #[error("{0}")]
    UserInput(String),

    #[error("preflight check failed: {0}")]
    Preflight(String),

    #[error("cloud error: {0}")]
    Cloud(#[from] pctl_cloud::CloudError),

    #[error("orchestrator stack reached a failure state: {0}")]
    CloudOrchestratorFailure(String),

    #[error("store error: {0}")]
    Store(#[from] pctl_store::StoreError),

    #[error("cluster not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProvisionError {
    /// Maps to the §6 exit-code contract: 1 user error, 2 cloud error, 3
    /// state corruption. The CLI binary is the only caller of this.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::UserInput(_) | ProvisionError::Seed(_) | ProvisionError::Validation(_) => 1,
            ProvisionError::Preflight(_) => 1,
            ProvisionError::Cloud(_) | ProvisionError::CloudOrchestratorFailure(_) => 2,
            ProvisionError::Store(pctl_store::StoreError::StateCorrupt { .. }) => 3,
            ProvisionError::Store(_) | ProvisionError::NotFound(_) | ProvisionError::Internal(_) => 1,
        }
    }
}
