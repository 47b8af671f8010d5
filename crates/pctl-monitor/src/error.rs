use thiserror::Error;

use crate::diagnosis::FailureDiagnosis;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("cloud error: {0}")]
    Cloud(#[from] pctl_cloud::CloudError),

    #[error("stack for cluster '{0}' did not appear after {1} polling attempts")]
    StackNotFound(String, u32),

    #[error("stack creation failed: {0}")]
    StackFailed(FailureDiagnosis),

    #[error("stack rolled back: {0}")]
    RolledBack(FailureDiagnosis),

    #[error("cluster configuration failed after infrastructure completed (cluster status {0})")]
    ConfigurationFailed(String),

    #[error("monitoring timed out after 30 minutes; creation continues in the cloud, check status later")]
    TimedOut,

    #[error("monitoring cancelled; cloud creation continues in the background")]
    Cancelled,
}

impl MonitorError {
    /// Maps to the §6 exit-code contract. `TimedOut` is deliberately not a
    /// hard failure: the stack may still complete in the cloud, so the CLI
    /// surfaces 0 with a "check status later" message rather than 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorError::TimedOut => 0,
            MonitorError::Cancelled => 130,
            MonitorError::Cloud(_) | MonitorError::StackNotFound(..) => 2,
            MonitorError::StackFailed(_) | MonitorError::RolledBack(_) | MonitorError::ConfigurationFailed(_) => 2,
        }
    }
}
