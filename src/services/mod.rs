pub mod cluster_store;
pub mod credentials;
pub mod diff;
pub mod gke_client;
pub mod migrate;
pub mod reconciler;

pub use cluster_store::{ClusterStore, SqliteClusterStore};
pub use credentials::{Credentials, ServiceAccountKey};
pub use gke_client::{GkeClient, InventoryClient};
pub use reconciler::Reconciler;
