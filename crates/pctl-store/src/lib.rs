pub mod error;
pub mod file_store;
pub mod memory;
pub mod state;
pub mod store;

pub use error::StoreError;
pub use file_store::JsonFileStore;
pub use memory::InMemoryStore;
pub use state::{ClusterState, ClusterStatus, NetworkResources};
pub use store::StateStore;
