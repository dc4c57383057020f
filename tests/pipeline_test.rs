// End-to-end tests for the fusion pipeline

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use weft::config::WEIGHT_SUM_TOLERANCE;
use weft::core::{Dataset, Metric, Modality, WeftError, WeightStatus};
use weft::pipeline::{self, PipelineParams};

fn cell_ids(n: usize) -> Vec<String> {
	(0..n).map(|i| format!("cell{}", i)).collect()
}

/// Three well-separated blobs of `per_blob` cells in `dims` dimensions.
fn blobs(per_blob: usize, dims: usize, jitter: f64, seed: u64) -> Array2<f64> {
	let mut rng = StdRng::seed_from_u64(seed);
	let n = per_blob * 3;
	let mut data = Array2::zeros((n, dims));
	for i in 0..n {
		let center = (i / per_blob) as f64 * 20.0;
		for j in 0..dims {
			data[[i, j]] = center + rng.random_range(-jitter..jitter);
		}
	}
	data
}

/// Pure noise, uniform in [0, 10) per dimension.
fn noise(n: usize, dims: usize, seed: u64) -> Array2<f64> {
	let mut rng = StdRng::seed_from_u64(seed);
	Array2::from_shape_fn((n, dims), |_| rng.random_range(0.0..10.0))
}

/// Two tight pairs, far apart, in both modalities; k = 1.
fn two_pairs_dataset() -> Dataset {
	let a = Array2::from_shape_vec((4, 1), vec![0.0, 0.1, 100.0, 100.1]).unwrap();
	let b = Array2::from_shape_vec((4, 1), vec![0.0, 0.2, 200.0, 200.2]).unwrap();
	Dataset::new(
		cell_ids(4),
		vec![
			Modality::new("rna", a, Metric::Euclidean, 1),
			Modality::new("atac", b, Metric::Euclidean, 1),
		],
	)
	.unwrap()
}

#[test]
fn weight_vectors_are_normalized() {
	let n = 30;
	let dataset = Dataset::new(
		cell_ids(n),
		vec![
			Modality::new("rna", blobs(10, 5, 0.5, 1), Metric::Euclidean, 8),
			Modality::new("atac", noise(n, 5, 2), Metric::Euclidean, 8),
		],
	)
	.unwrap();

	let result = pipeline::run(&dataset, &PipelineParams::default()).unwrap();
	for cell in 0..n {
		let row = result.weights.weights(cell);
		assert!(row.iter().all(|&w| w >= 0.0));
		let sum: f64 = row.iter().sum();
		assert!(
			(sum - 1.0).abs() < WEIGHT_SUM_TOLERANCE,
			"cell {} sums to {}",
			cell,
			sum
		);
	}
}

#[test]
fn structured_modality_outweighs_noise() {
	let n = 60;
	let dataset = Dataset::new(
		cell_ids(n),
		vec![
			Modality::new("rna", blobs(20, 10, 0.5, 3), Metric::Euclidean, 10),
			Modality::new("atac", noise(n, 10, 4), Metric::Euclidean, 10),
		],
	)
	.unwrap();

	let result = pipeline::run(&dataset, &PipelineParams::default()).unwrap();
	let structured = result.weights.average(0);
	let noisy = result.weights.average(1);
	assert!(
		structured > noisy,
		"structured modality averaged {} vs noise {}",
		structured,
		noisy
	);
}

#[test]
fn fused_graph_is_symmetric_without_self_loops_or_duplicates() {
	let n = 30;
	let dataset = Dataset::new(
		cell_ids(n),
		vec![
			Modality::new("rna", blobs(10, 5, 0.5, 5), Metric::Euclidean, 6),
			Modality::new("atac", noise(n, 5, 6), Metric::Euclidean, 6),
		],
	)
	.unwrap();

	let result = pipeline::run(&dataset, &PipelineParams::default()).unwrap();
	let graph = &result.graph;

	let mut seen = std::collections::HashSet::new();
	for &(a, b, w) in graph.edges() {
		assert!(a < b, "edge ({}, {}) is not canonical", a, b);
		assert!(w > 0.0);
		assert!(seen.insert((a, b)), "duplicate edge ({}, {})", a, b);
		assert_eq!(graph.weight(a, b), graph.weight(b, a));
	}
}

#[test]
fn same_seed_reproduces_the_partition() {
	let n = 45;
	let dataset = Dataset::new(
		cell_ids(n),
		vec![
			Modality::new("rna", blobs(15, 6, 0.8, 7), Metric::Euclidean, 8),
			Modality::new("atac", blobs(15, 6, 1.2, 8), Metric::Euclidean, 8),
		],
	)
	.unwrap();

	let params = PipelineParams {
		seed: 11,
		..Default::default()
	};
	let first = pipeline::run(&dataset, &params).unwrap();
	let second = pipeline::run(&dataset, &params).unwrap();
	assert_eq!(first.clusters.labels, second.clusters.labels);
	assert_eq!(first.clusters.n_clusters, second.clusters.n_clusters);
}

#[test]
fn two_pairs_yield_two_clusters_at_any_resolution() {
	let dataset = two_pairs_dataset();
	for resolution in [0.1, 0.5, 1.0, 1.5, 2.0] {
		let params = PipelineParams {
			resolution,
			..Default::default()
		};
		let result = pipeline::run(&dataset, &params).unwrap();
		assert_eq!(
			result.clusters.n_clusters, 2,
			"resolution {} gave {} clusters",
			resolution, result.clusters.n_clusters
		);
		assert_eq!(result.clusters.labels[0], result.clusters.labels[1]);
		assert_eq!(result.clusters.labels[2], result.clusters.labels[3]);
		assert_ne!(result.clusters.labels[0], result.clusters.labels[2]);
	}
}

#[test]
fn equidistant_neighborhoods_use_the_fallback_path() {
	// Modality B is a simplex: every pairwise distance is sqrt(2).
	let n = 6;
	let a = Array2::from_shape_vec(
		(n, 1),
		vec![0.0, 0.1, 0.2, 10.0, 10.1, 10.2],
	)
	.unwrap();
	let b = Array2::from_shape_fn((n, n), |(i, j)| if i == j { 1.0 } else { 0.0 });
	let dataset = Dataset::new(
		cell_ids(n),
		vec![
			Modality::new("rna", a, Metric::Euclidean, 2),
			Modality::new("atac", b, Metric::Euclidean, 2),
		],
	)
	.unwrap();

	let result = pipeline::run(&dataset, &PipelineParams::default()).unwrap();
	for cell in 0..n {
		assert_eq!(result.weights.diagnostic(cell).status, WeightStatus::Degenerate);
		let row = result.weights.weights(cell);
		let sum: f64 = row.iter().sum();
		assert!((sum - 1.0).abs() < 1e-6);
	}
}

#[test]
fn zero_variance_modality_gets_equal_weights_everywhere() {
	let n = 12;
	let a = blobs(4, 3, 0.2, 9);
	let b = Array2::from_elem((n, 3), 0.5);
	let dataset = Dataset::new(
		cell_ids(n),
		vec![
			Modality::new("rna", a, Metric::Euclidean, 3),
			Modality::new("atac", b, Metric::Euclidean, 3),
		],
	)
	.unwrap();

	let result = pipeline::run(&dataset, &PipelineParams::default()).unwrap();
	for cell in 0..n {
		let row = result.weights.weights(cell);
		assert!((row[0] - 0.5).abs() < 1e-12);
		assert!((row[1] - 0.5).abs() < 1e-12);
	}
}

#[test]
fn negative_resolution_is_rejected_before_any_work() {
	let dataset = two_pairs_dataset();
	let params = PipelineParams {
		resolution: -1.0,
		..Default::default()
	};
	let err = pipeline::run(&dataset, &params).unwrap_err();
	assert!(matches!(err, WeftError::Config(_)));
}
