use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no state recorded for cluster '{0}'")]
    NotFound(String),

    #[error("failed to serialize cluster state: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The state file exists but failed to parse as JSON. Never silently
    /// discarded or replaced — the caller must resolve this by hand.
    #[error("state file for cluster '{name}' is corrupt: {source}")]
    StateCorrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
