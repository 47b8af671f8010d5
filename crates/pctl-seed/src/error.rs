use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid cluster name: {0}")]
    InvalidClusterName(String),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("invalid package spec: {0}")]
    InvalidPackageSpec(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
