//! Modality descriptors and the multimodal dataset

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WeftError};

/// Distance metric over an embedding space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
	#[default]
	Euclidean,
	Cosine,
}

impl Metric {
	/// Distance between two embedding vectors.
	pub fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
		match self {
			Metric::Euclidean => a
				.iter()
				.zip(b.iter())
				.map(|(x, y)| (x - y).powi(2))
				.sum::<f64>()
				.sqrt(),
			Metric::Cosine => {
				let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
				let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
				let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
				let denom = norm_a * norm_b;
				if denom < 1e-15 {
					1.0
				} else {
					1.0 - dot / denom
				}
			}
		}
	}
}

/// One measurement channel: a named embedding matrix (cells × dims) with a
/// metric and a neighbor count.
#[derive(Debug, Clone)]
pub struct Modality {
	pub name: String,
	pub embedding: Array2<f64>,
	pub metric: Metric,
	pub k: usize,
}

impl Modality {
	pub fn new(name: impl Into<String>, embedding: Array2<f64>, metric: Metric, k: usize) -> Self {
		Self {
			name: name.into(),
			embedding,
			metric,
			k,
		}
	}

	pub fn n_cells(&self) -> usize {
		self.embedding.nrows()
	}

	pub fn n_dims(&self) -> usize {
		self.embedding.ncols()
	}
}

/// A set of modalities aligned on one ordered cell-id axis.
///
/// The only constructor validates the whole configuration up front, so a
/// `Dataset` that exists is a dataset the pipeline can run on.
#[derive(Debug, Clone)]
pub struct Dataset {
	cell_ids: Vec<String>,
	modalities: Vec<Modality>,
}

impl Dataset {
	/// Build a validated dataset.
	///
	/// # Errors
	///
	/// Returns `WeftError::Config` if there are no cells, fewer than two
	/// modalities, duplicate or empty modality names, a row count that does
	/// not match the cell-id axis, a neighbor count outside `1..n_cells`, or
	/// any non-finite embedding value.
	pub fn new(cell_ids: Vec<String>, modalities: Vec<Modality>) -> Result<Self> {
		let n = cell_ids.len();
		if n == 0 {
			return Err(WeftError::Config("dataset has no cells".into()));
		}
		if modalities.len() < 2 {
			return Err(WeftError::Config(format!(
				"need at least 2 modalities, got {}",
				modalities.len()
			)));
		}

		for (idx, m) in modalities.iter().enumerate() {
			if m.name.is_empty() {
				return Err(WeftError::Config(format!("modality {} has an empty name", idx)));
			}
			if modalities[..idx].iter().any(|other| other.name == m.name) {
				return Err(WeftError::Config(format!("duplicate modality name '{}'", m.name)));
			}
			if m.n_cells() != n {
				return Err(WeftError::Config(format!(
					"modality '{}' has {} rows but the cell axis has {}",
					m.name,
					m.n_cells(),
					n
				)));
			}
			if m.k == 0 || m.k >= n {
				return Err(WeftError::Config(format!(
					"modality '{}': k must be in 1..{} (cell count), got {}",
					m.name, n, m.k
				)));
			}
			if m.embedding.iter().any(|v| !v.is_finite()) {
				return Err(WeftError::Config(format!(
					"modality '{}' contains non-finite embedding values",
					m.name
				)));
			}
		}

		Ok(Self { cell_ids, modalities })
	}

	pub fn n_cells(&self) -> usize {
		self.cell_ids.len()
	}

	pub fn cell_ids(&self) -> &[String] {
		&self.cell_ids
	}

	pub fn modalities(&self) -> &[Modality] {
		&self.modalities
	}

	pub fn n_modalities(&self) -> usize {
		self.modalities.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ndarray::arr2;

	fn modality(name: &str, rows: usize, k: usize) -> Modality {
		let data: Vec<f64> = (0..rows * 2).map(|v| v as f64).collect();
		Modality::new(
			name,
			Array2::from_shape_vec((rows, 2), data).unwrap(),
			Metric::Euclidean,
			k,
		)
	}

	#[test]
	fn euclidean_distance() {
		let m = arr2(&[[0.0, 0.0], [3.0, 4.0]]);
		let d = Metric::Euclidean.distance(m.row(0), m.row(1));
		assert!((d - 5.0).abs() < 1e-12);
	}

	#[test]
	fn cosine_distance_of_parallel_vectors_is_zero() {
		let m = arr2(&[[1.0, 2.0], [2.0, 4.0]]);
		let d = Metric::Cosine.distance(m.row(0), m.row(1));
		assert!(d.abs() < 1e-12);
	}

	#[test]
	fn cosine_distance_of_zero_vector_is_one() {
		let m = arr2(&[[0.0, 0.0], [1.0, 0.0]]);
		let d = Metric::Cosine.distance(m.row(0), m.row(1));
		assert!((d - 1.0).abs() < 1e-12);
	}

	#[test]
	fn rejects_single_modality() {
		let ids = vec!["a".into(), "b".into(), "c".into()];
		let err = Dataset::new(ids, vec![modality("rna", 3, 1)]).unwrap_err();
		assert!(matches!(err, WeftError::Config(_)));
	}

	#[test]
	fn rejects_k_out_of_range() {
		let ids = vec!["a".into(), "b".into(), "c".into()];
		let err = Dataset::new(ids, vec![modality("rna", 3, 3), modality("atac", 3, 1)]).unwrap_err();
		assert!(matches!(err, WeftError::Config(_)));
	}

	#[test]
	fn rejects_row_count_mismatch() {
		let ids = vec!["a".into(), "b".into(), "c".into()];
		let err = Dataset::new(ids, vec![modality("rna", 3, 1), modality("atac", 4, 1)]).unwrap_err();
		assert!(matches!(err, WeftError::Config(_)));
	}

	#[test]
	fn rejects_duplicate_names() {
		let ids = vec!["a".into(), "b".into(), "c".into()];
		let err = Dataset::new(ids, vec![modality("rna", 3, 1), modality("rna", 3, 1)]).unwrap_err();
		assert!(matches!(err, WeftError::Config(_)));
	}

	#[test]
	fn rejects_non_finite_values() {
		let ids = vec!["a".into(), "b".into()];
		let mut bad = modality("rna", 2, 1);
		bad.embedding[[0, 0]] = f64::NAN;
		let err = Dataset::new(ids, vec![bad, modality("atac", 2, 1)]).unwrap_err();
		assert!(matches!(err, WeftError::Config(_)));
	}

	#[test]
	fn accepts_valid_dataset() {
		let ids = vec!["a".into(), "b".into(), "c".into()];
		let ds = Dataset::new(ids, vec![modality("rna", 3, 2), modality("atac", 3, 1)]).unwrap();
		assert_eq!(ds.n_cells(), 3);
		assert_eq!(ds.n_modalities(), 2);
	}
}
