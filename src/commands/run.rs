//! The `run` command: load a dataset, fuse, cluster, write artifacts.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::cli::Kernel;
use crate::pipeline::{self, PipelineParams};
use crate::processing::WeightConfig;
use crate::storage;
use crate::ui;

pub fn execute(
	input: &Path,
	output: &Path,
	resolution: f64,
	seed: u64,
	neighbors: Option<usize>,
	kernel: Kernel,
) -> Result<()> {
	let started = Instant::now();

	let dataset = storage::load_dataset(input, neighbors)
		.with_context(|| format!("failed to load dataset {}", input.display()))?;
	ui::info(&format!(
		"Loaded {} cells, {} modalities from {}",
		dataset.n_cells(),
		dataset.n_modalities(),
		ui::path_link(input, 60)
	));

	let params = PipelineParams {
		resolution,
		seed,
		weights: WeightConfig {
			kernel: kernel.into(),
			..Default::default()
		},
	};

	let result = pipeline::run(&dataset, &params).context("pipeline failed")?;

	ui::header("Clusters");
	for (label, size) in result.clusters.sizes().iter().enumerate() {
		ui::info(&format!("cluster {:>3}  {:>6} cells", label, size));
	}

	storage::write_results(output, &dataset, &result, &params)
		.with_context(|| format!("failed to write artifacts to {}", output.display()))?;

	ui::success(&format!(
		"{} clusters, {} edges, artifacts in {} ({}ms)",
		result.clusters.n_clusters,
		result.graph.n_edges(),
		ui::path_link(output, 60),
		started.elapsed().as_millis()
	));
	Ok(())
}
