use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("extends cycle detected: {0} -> {1}")]
    Cycle(String, String),

    #[error("extends chain exceeds maximum depth of {max} at {path}")]
    Depth { path: String, max: usize },

    #[error("base seed not found: {0}")]
    MissingBase(String),

    #[error("seed is missing required field '{0}' after merging its extends chain")]
    Incomplete(&'static str),

    #[error("package version conflict for '{name}': {a} vs {b}")]
    Conflict { name: String, a: String, b: String },
}
