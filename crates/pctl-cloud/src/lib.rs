pub mod client;
pub mod credentials;
pub mod error;
pub mod image_cache;
pub mod network;
pub mod orchestrator_cli;
pub mod s3;
pub mod sigv4;
pub mod stack_events;
pub mod xml;

pub use client::AwsClient;
pub use credentials::{resolve_credentials, AwsCredentials, CredentialsProvider, ImdsCredentialsProvider, StaticCredentialsProvider};
pub use error::CloudError;
pub use image_cache::ImageCache;
pub use network::NetworkManager;
pub use orchestrator_cli::{ClusterDescription, DescribeClusterResponse, HeadNodeDescription, OrchestratorCli};
pub use s3::S3Uploader;
pub use stack_events::{StackEvent, StackEventsClient};
