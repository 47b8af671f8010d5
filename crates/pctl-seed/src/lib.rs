pub mod error;
pub mod regions;
pub mod types;

pub use error::SeedError;
pub use types::{
    ClusterConfig, ClusterName, Compute, DataConfig, Os, Queue, S3Mount, Seed, SoftwareConfig,
    User,
};
