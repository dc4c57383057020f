//! End-to-end fusion pipeline
//!
//! Validates the whole configuration up front, then chains the stages:
//! per-modality kNN graphs → per-cell modality weights → fused graph →
//! cluster assignment. A configuration error aborts before any artifact is
//! produced; numerical degeneracies are recovered per cell and reported
//! through diagnostics instead of failing the run.

use crate::config::{DEFAULT_RESOLUTION, DEFAULT_SEED};
use crate::core::{ClusterAssignment, Dataset, FusedGraph, Result, WeftError, WeightMatrix};
use crate::processing::{
	build_neighbor_graph, estimate_weights, fuse_graphs, partition, PartitionConfig, WeightConfig,
};
use crate::ui;

/// Parameters of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineParams {
	pub resolution: f64,
	pub seed: u64,
	pub weights: WeightConfig,
}

impl Default for PipelineParams {
	fn default() -> Self {
		Self {
			resolution: DEFAULT_RESOLUTION,
			seed: DEFAULT_SEED,
			weights: WeightConfig::default(),
		}
	}
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct FusionOutput {
	pub weights: WeightMatrix,
	pub graph: FusedGraph,
	pub clusters: ClusterAssignment,
}

/// Run the full pipeline on a validated dataset.
pub fn run(dataset: &Dataset, params: &PipelineParams) -> Result<FusionOutput> {
	if params.resolution < 0.0 {
		return Err(WeftError::Config(format!(
			"resolution must be non-negative, got {}",
			params.resolution
		)));
	}

	ui::info(&format!(
		"Fusing {} modalities over {} cells",
		dataset.n_modalities(),
		dataset.n_cells()
	));

	let graphs = dataset
		.modalities()
		.iter()
		.map(build_neighbor_graph)
		.collect::<Result<Vec<_>>>()?;

	let weights = estimate_weights(dataset, &graphs, &params.weights)?;
	let graph = fuse_graphs(dataset, &graphs, &weights, params.weights.kernel)?;

	let partition_config = PartitionConfig {
		resolution: params.resolution,
		seed: params.seed,
		..Default::default()
	};
	let clusters = partition(&graph, &partition_config)?;

	ui::info(&format!(
		"{} clusters at resolution {} (modularity {:.4})",
		clusters.n_clusters, params.resolution, clusters.modularity
	));

	Ok(FusionOutput {
		weights,
		graph,
		clusters,
	})
}
