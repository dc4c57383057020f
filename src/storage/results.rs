//! Run artifacts
//!
//! One pipeline run writes five artifacts into the output directory: a JSON
//! run summary, per-cell cluster labels, per-cell modality weights with
//! diagnostics, and the fused graph both as MessagePack (for downstream
//! layout tools) and as a plain TSV edge list.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{CLUSTERS_FILE, GRAPH_BIN_FILE, GRAPH_TSV_FILE, SUMMARY_FILE, WEIGHTS_FILE};
use crate::core::{Dataset, Result, WeftError, WeightStatus};
use crate::pipeline::{FusionOutput, PipelineParams};
use crate::ui;

#[derive(Debug, Serialize)]
struct RunSummary {
	version: String,
	timestamp: String,
	resolution: f64,
	seed: u64,
	n_cells: usize,
	modalities: Vec<ModalitySummary>,
	n_clusters: usize,
	cluster_sizes: Vec<usize>,
	modularity: f64,
	n_edges: usize,
	degenerate_cells: usize,
	unstable_cells: usize,
}

#[derive(Debug, Serialize)]
struct ModalitySummary {
	name: String,
	dims: usize,
	neighbors: usize,
	mean_weight: f64,
}

#[derive(Debug, Serialize)]
struct ClusterRecord<'a> {
	cell: &'a str,
	cluster: usize,
}

#[derive(Debug, Serialize)]
struct WeightRecord<'a> {
	cell: &'a str,
	weights: &'a [f64],
	status: WeightStatus,
	iterations: usize,
}

/// Binary fused-graph artifact.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphArtifact {
	pub n_cells: usize,
	pub edges: Vec<(usize, usize, f64)>,
}

/// Write every artifact of one run into `dir` (created if missing).
pub fn write_results(
	dir: &Path,
	dataset: &Dataset,
	output: &FusionOutput,
	params: &PipelineParams,
) -> Result<()> {
	fs::create_dir_all(dir)?;

	let summary = RunSummary {
		version: env!("CARGO_PKG_VERSION").to_string(),
		timestamp: chrono::Utc::now().to_rfc3339(),
		resolution: params.resolution,
		seed: params.seed,
		n_cells: dataset.n_cells(),
		modalities: dataset
			.modalities()
			.iter()
			.enumerate()
			.map(|(i, m)| ModalitySummary {
				name: m.name.clone(),
				dims: m.n_dims(),
				neighbors: m.k,
				mean_weight: output.weights.average(i),
			})
			.collect(),
		n_clusters: output.clusters.n_clusters,
		cluster_sizes: output.clusters.sizes(),
		modularity: output.clusters.modularity,
		n_edges: output.graph.n_edges(),
		degenerate_cells: output.weights.count_with_status(WeightStatus::Degenerate),
		unstable_cells: output.weights.count_with_status(WeightStatus::Unstable),
	};
	write_json(&dir.join(SUMMARY_FILE), &summary)?;

	let clusters: Vec<ClusterRecord> = dataset
		.cell_ids()
		.iter()
		.zip(output.clusters.labels.iter())
		.map(|(cell, &cluster)| ClusterRecord { cell, cluster })
		.collect();
	write_json(&dir.join(CLUSTERS_FILE), &clusters)?;

	let weights: Vec<WeightRecord> = dataset
		.cell_ids()
		.iter()
		.enumerate()
		.map(|(i, cell)| {
			let diagnostic = output.weights.diagnostic(i);
			WeightRecord {
				cell,
				weights: output.weights.weights(i),
				status: diagnostic.status,
				iterations: diagnostic.iterations,
			}
		})
		.collect();
	write_json(&dir.join(WEIGHTS_FILE), &weights)?;

	let artifact = GraphArtifact {
		n_cells: output.graph.n_cells(),
		edges: output.graph.edges().to_vec(),
	};
	let packed = rmp_serde::to_vec(&artifact)
		.map_err(|e| WeftError::Other(format!("graph serialization failed: {}", e)))?;
	fs::write(dir.join(GRAPH_BIN_FILE), packed)?;

	write_graph_tsv(&dir.join(GRAPH_TSV_FILE), dataset, output)?;

	ui::debug(&format!("wrote 5 artifacts to {}", dir.display()));
	Ok(())
}

/// Read a fused-graph artifact back (downstream tooling entry point).
pub fn read_graph(path: &Path) -> Result<GraphArtifact> {
	let bytes = fs::read(path)?;
	rmp_serde::from_slice(&bytes)
		.map_err(|e| WeftError::Parse(format!("{}: {}", path.display(), e)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
	let json = serde_json::to_string_pretty(value)
		.map_err(|e| WeftError::Other(format!("serialization failed: {}", e)))?;
	fs::write(path, json)?;
	Ok(())
}

fn write_graph_tsv(path: &Path, dataset: &Dataset, output: &FusionOutput) -> Result<()> {
	let mut file = fs::File::create(path)?;
	writeln!(file, "cell_a\tcell_b\tweight")?;
	let ids = dataset.cell_ids();
	for &(a, b, w) in output.graph.edges() {
		writeln!(file, "{}\t{}\t{}", ids[a], ids[b], w)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::env;

	#[test]
	fn graph_artifact_round_trips_through_msgpack() {
		let artifact = GraphArtifact {
			n_cells: 3,
			edges: vec![(0, 1, 0.5), (1, 2, 0.125)],
		};
		let path = env::temp_dir().join("weft_graph_artifact_test.msgpack");
		fs::write(&path, rmp_serde::to_vec(&artifact).unwrap()).unwrap();

		let back = read_graph(&path).unwrap();
		assert_eq!(back.n_cells, 3);
		assert_eq!(back.edges, artifact.edges);

		fs::remove_file(&path).ok();
	}
}
