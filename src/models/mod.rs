// Models module for the GKE cleaner backend

pub mod cluster;
pub mod response;

pub use cluster::*;
pub use response::*;
