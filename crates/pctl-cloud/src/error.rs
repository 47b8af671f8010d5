use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("no cloud credentials available")]
    NoCredentials,

    #[error("bucket region does not match the configured region")]
    RegionMismatch,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("cloud api error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize/deserialize: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("orchestrator CLI '{command}' exited with status {status}: {stderr}")]
    SubprocessFailed { command: String, status: i32, stderr: String },

    #[error("orchestrator CLI '{0}' timed out")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl CloudError {
    /// Whether a retry with backoff is worth attempting (§4.E / §5: transient
    /// 5xx, throttling, timeouts — never on 4xx client errors).
    pub fn is_transient(&self) -> bool {
        match self {
            CloudError::Api { code, .. } => {
                code == "Throttling" || code == "RequestLimitExceeded" || code.starts_with('5')
            }
            CloudError::Http(_) | CloudError::Timeout(_) => true,
            _ => false,
        }
    }
}
