//! Core domain types

pub mod cluster;
pub mod error;
pub mod graph;
pub mod modality;
pub mod neighbors;
pub mod weights;

pub use cluster::ClusterAssignment;
pub use error::{Result, WeftError};
pub use graph::FusedGraph;
pub use modality::{Dataset, Metric, Modality};
pub use neighbors::{NeighborGraph, NeighborSet};
pub use weights::{CellDiagnostic, WeightMatrix, WeightStatus};
