//! Fuses per-modality neighbor graphs into one weighted affinity graph
//!
//! An edge exists wherever at least one modality's kNN graph has it. Each
//! modality owning the edge contributes its kernel affinity, combined under
//! the geometric mean of the two endpoints' weights for that modality, so
//! the fused weight is symmetric even when the endpoints trust the
//! modalities differently.

use rayon::prelude::*;

use crate::core::{Dataset, FusedGraph, NeighborGraph, Result, WeftError, WeightMatrix};
use crate::processing::weights::KernelKind;
use crate::ui;

/// Build the fused graph from the per-modality kNN graphs and the per-cell
/// modality weights.
pub fn fuse_graphs(
	dataset: &Dataset,
	graphs: &[NeighborGraph],
	weights: &WeightMatrix,
	kernel: KernelKind,
) -> Result<FusedGraph> {
	let n = dataset.n_cells();
	if graphs.len() != dataset.n_modalities() {
		return Err(WeftError::Config(format!(
			"got {} neighbor graphs for {} modalities",
			graphs.len(),
			dataset.n_modalities()
		)));
	}
	if weights.n_cells() != n || weights.n_modalities() != graphs.len() {
		return Err(WeftError::Config(
			"weight matrix shape does not match the dataset".into(),
		));
	}

	// Local kernel bandwidth per modality per cell.
	let bandwidths: Vec<Vec<f64>> = graphs
		.iter()
		.map(|g| g.sets.iter().map(|s| s.bandwidth()).collect())
		.collect();

	// Union edge set, canonicalized (a < b). Sharded by source cell.
	let mut pairs: Vec<(usize, usize)> = (0..n)
		.into_par_iter()
		.flat_map_iter(|a| {
			let mut local: Vec<(usize, usize)> = graphs
				.iter()
				.flat_map(|g| g.neighbors(a).indices.iter().copied())
				.map(|b| (a.min(b), a.max(b)))
				.collect();
			local.sort_unstable();
			local.dedup();
			local.into_iter()
		})
		.collect();
	pairs.sort_unstable();
	pairs.dedup();

	let edges: Vec<(usize, usize, f64)> = pairs
		.into_par_iter()
		.filter_map(|(a, b)| {
			let w = fused_weight(dataset, graphs, weights, &bandwidths, kernel, a, b);
			(w > 0.0).then_some((a, b, w))
		})
		.collect();

	ui::debug(&format!("fused graph: {} cells, {} edges", n, edges.len()));

	FusedGraph::from_edges(n, edges)
}

/// Weight of one fused edge: per-modality affinity scaled by the geometric
/// mean of the endpoint weights, summed over the modalities whose kNN graph
/// contains the edge.
fn fused_weight(
	dataset: &Dataset,
	graphs: &[NeighborGraph],
	weights: &WeightMatrix,
	bandwidths: &[Vec<f64>],
	kernel: KernelKind,
	a: usize,
	b: usize,
) -> f64 {
	let mut total = 0.0;
	for (m, graph) in graphs.iter().enumerate() {
		if !graph.has_edge(a, b) {
			continue;
		}
		let modality = &dataset.modalities()[m];
		let d = modality
			.metric
			.distance(modality.embedding.row(a), modality.embedding.row(b));
		// Mean of the two endpoint-bandwidth affinities keeps θ symmetric.
		let theta = 0.5 * (kernel.affinity(d, bandwidths[m][a]) + kernel.affinity(d, bandwidths[m][b]));
		let w_a = weights.weights(a)[m];
		let w_b = weights.weights(b)[m];
		total += (w_a * w_b).sqrt() * theta;
	}
	total
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::{CellDiagnostic, Metric, Modality, WeightStatus};
	use crate::processing::knn::build_neighbor_graph;
	use ndarray::Array2;

	fn pair_dataset() -> (Dataset, Vec<NeighborGraph>) {
		// Two tight pairs in both modalities, k = 1.
		let a = vec![0.0, 0.1, 100.0, 100.1];
		let b = vec![0.0, 0.2, 200.0, 200.2];
		let ids = (0..4).map(|i| format!("cell{}", i)).collect();
		let ma = Modality::new(
			"rna",
			Array2::from_shape_vec((4, 1), a).unwrap(),
			Metric::Euclidean,
			1,
		);
		let mb = Modality::new(
			"atac",
			Array2::from_shape_vec((4, 1), b).unwrap(),
			Metric::Euclidean,
			1,
		);
		let dataset = Dataset::new(ids, vec![ma, mb]).unwrap();
		let graphs = dataset
			.modalities()
			.iter()
			.map(|m| build_neighbor_graph(m).unwrap())
			.collect();
		(dataset, graphs)
	}

	fn equal_weights(n: usize) -> WeightMatrix {
		WeightMatrix::new(
			vec!["rna".into(), "atac".into()],
			vec![vec![0.5, 0.5]; n],
			vec![
				CellDiagnostic {
					status: WeightStatus::Converged,
					iterations: 1,
				};
				n
			],
		)
	}

	#[test]
	fn union_edges_only_between_pairs() {
		let (dataset, graphs) = pair_dataset();
		let graph = fuse_graphs(&dataset, &graphs, &equal_weights(4), KernelKind::Gaussian).unwrap();
		assert_eq!(graph.n_edges(), 2);
		assert!(graph.weight(0, 1) > 0.0);
		assert!(graph.weight(2, 3) > 0.0);
		assert_eq!(graph.weight(0, 2), 0.0);
		assert_eq!(graph.weight(1, 3), 0.0);
	}

	#[test]
	fn fused_weights_are_symmetric() {
		let (dataset, graphs) = pair_dataset();
		// Asymmetric endpoint weights: cell 0 trusts rna, cell 1 trusts atac.
		let weights = WeightMatrix::new(
			vec!["rna".into(), "atac".into()],
			vec![
				vec![0.9, 0.1],
				vec![0.2, 0.8],
				vec![0.5, 0.5],
				vec![0.5, 0.5],
			],
			vec![
				CellDiagnostic {
					status: WeightStatus::Converged,
					iterations: 1,
				};
				4
			],
		);
		let graph = fuse_graphs(&dataset, &graphs, &weights, KernelKind::Gaussian).unwrap();
		for &(a, b, w) in graph.edges() {
			assert_eq!(graph.weight(a, b), graph.weight(b, a));
			assert!(w > 0.0);
		}
	}

	#[test]
	fn geometric_mean_combines_endpoint_weights() {
		let (dataset, graphs) = pair_dataset();
		// With k = 1 the kernel affinity is exp(-1) for both endpoints and
		// both modalities, so the edge weight reduces to
		// e⁻¹ · Σ_m sqrt(w_m(a) · w_m(b)).
		let weights = WeightMatrix::new(
			vec!["rna".into(), "atac".into()],
			vec![
				vec![1.0, 0.0],
				vec![0.25, 0.75],
				vec![0.5, 0.5],
				vec![0.5, 0.5],
			],
			vec![
				CellDiagnostic {
					status: WeightStatus::Converged,
					iterations: 1,
				};
				4
			],
		);
		let graph = fuse_graphs(&dataset, &graphs, &weights, KernelKind::Gaussian).unwrap();
		let expected = (-1.0_f64).exp() * ((1.0 * 0.25_f64).sqrt() + (0.0 * 0.75_f64).sqrt());
		assert!((graph.weight(0, 1) - expected).abs() < 1e-9);
	}

	#[test]
	fn no_self_loops() {
		let (dataset, graphs) = pair_dataset();
		let graph = fuse_graphs(&dataset, &graphs, &equal_weights(4), KernelKind::Gaussian).unwrap();
		for &(a, b, _) in graph.edges() {
			assert_ne!(a, b);
		}
	}
}
