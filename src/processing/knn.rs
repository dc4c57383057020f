//! Exact k-nearest-neighbor search over one modality's embedding space

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::core::{Modality, NeighborGraph, NeighborSet, Result, WeftError};
use crate::ui;

/// Build the kNN graph of one modality by brute-force search.
///
/// Parallelized across query cells; each cell's scan is sequential, so the
/// result is identical regardless of thread count. Ties at the k-th boundary
/// are broken by lower cell index.
///
/// # Errors
///
/// Returns `WeftError::Config` if k is zero or not smaller than the cell
/// count, or if the embedding contains non-finite values.
pub fn build_neighbor_graph(modality: &Modality) -> Result<NeighborGraph> {
	let n = modality.n_cells();
	if modality.k == 0 || modality.k >= n {
		return Err(WeftError::Config(format!(
			"modality '{}': k must be in 1..{} (cell count), got {}",
			modality.name, n, modality.k
		)));
	}
	if modality.embedding.iter().any(|v| !v.is_finite()) {
		return Err(WeftError::Config(format!(
			"modality '{}' contains non-finite embedding values",
			modality.name
		)));
	}

	ui::debug(&format!(
		"kNN: {} cells × {} dims, k={}, metric={:?}",
		n,
		modality.n_dims(),
		modality.k,
		modality.metric
	));

	let sets: Vec<NeighborSet> = (0..n)
		.into_par_iter()
		.map(|i| nearest(modality, i))
		.collect();

	Ok(NeighborGraph {
		modality: modality.name.clone(),
		k: modality.k,
		sets,
	})
}

fn nearest(modality: &Modality, cell: usize) -> NeighborSet {
	let n = modality.n_cells();
	let query = modality.embedding.row(cell);

	let mut dists: Vec<(usize, f64)> = (0..n)
		.filter(|&j| j != cell)
		.map(|j| (j, modality.metric.distance(query, modality.embedding.row(j))))
		.collect();

	// Sort by (distance, index) so boundary ties resolve deterministically.
	dists.sort_unstable_by(|a, b| {
		a.1.partial_cmp(&b.1)
			.unwrap_or(Ordering::Equal)
			.then_with(|| a.0.cmp(&b.0))
	});
	dists.truncate(modality.k);

	NeighborSet {
		indices: dists.iter().map(|&(j, _)| j).collect(),
		distances: dists.iter().map(|&(_, d)| d).collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::Metric;
	use ndarray::Array2;

	fn line_modality(k: usize) -> Modality {
		// Cells at x = 0, 1, 2, 3, 4
		let data: Vec<f64> = (0..5).map(|v| v as f64).collect();
		Modality::new(
			"rna",
			Array2::from_shape_vec((5, 1), data).unwrap(),
			Metric::Euclidean,
			k,
		)
	}

	#[test]
	fn finds_nearest_in_order() {
		let graph = build_neighbor_graph(&line_modality(2)).unwrap();
		let set = graph.neighbors(0);
		assert_eq!(set.indices, vec![1, 2]);
		assert_eq!(set.distances, vec![1.0, 2.0]);
	}

	#[test]
	fn ties_break_by_lower_index() {
		// Cell 2 is equidistant from 1 and 3; with k=1 the lower index wins.
		let graph = build_neighbor_graph(&line_modality(1)).unwrap();
		assert_eq!(graph.neighbors(2).indices, vec![1]);
	}

	#[test]
	fn excludes_self() {
		let graph = build_neighbor_graph(&line_modality(4)).unwrap();
		for (i, set) in graph.sets.iter().enumerate() {
			assert!(!set.contains(i));
			assert_eq!(set.len(), 4);
		}
	}

	#[test]
	fn rejects_k_equal_to_cell_count() {
		assert!(build_neighbor_graph(&line_modality(5)).is_err());
	}

	#[test]
	fn rejects_zero_k() {
		assert!(build_neighbor_graph(&line_modality(0)).is_err());
	}
}
