//! Fusion pipeline stages

pub mod fuse;
pub mod knn;
pub mod partition;
pub mod weights;

pub use fuse::fuse_graphs;
pub use knn::build_neighbor_graph;
pub use partition::{modularity, partition, PartitionConfig};
pub use weights::{estimate_weights, KernelKind, WeightConfig};
