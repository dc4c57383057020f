//! Dataset input and run artifacts

pub mod dataset;
pub mod results;

pub use dataset::{load_dataset, save_dataset};
pub use results::{read_graph, write_results, GraphArtifact};
