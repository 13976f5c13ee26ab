// Platform data collection
pub mod clusters;
pub mod namespaces;

pub use clusters::{ClusterResolver, WorkerNodes};
pub use namespaces::{NamespaceCollector, NamespaceInventory};
