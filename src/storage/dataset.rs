//! Dataset input format
//!
//! A dataset file is JSON: the ordered cell-id axis plus one entry per
//! modality with its embedding rows. Metric and neighbor count are optional
//! per modality; a CLI-level override can replace every k at load time.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_NEIGHBORS;
use crate::core::{Dataset, Metric, Modality, Result, WeftError};

#[derive(Debug, Serialize, Deserialize)]
struct DatasetFile {
	cells: Vec<String>,
	modalities: Vec<ModalityFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModalityFile {
	name: String,
	#[serde(default)]
	metric: Metric,
	#[serde(default)]
	neighbors: Option<usize>,
	embedding: Vec<Vec<f64>>,
}

/// Load and validate a dataset file. `k_override` replaces every modality's
/// neighbor count when set.
pub fn load_dataset(path: &Path, k_override: Option<usize>) -> Result<Dataset> {
	let raw = fs::read_to_string(path)?;
	let file: DatasetFile = serde_json::from_str(&raw)
		.map_err(|e| WeftError::Parse(format!("{}: {}", path.display(), e)))?;

	let mut modalities = Vec::with_capacity(file.modalities.len());
	for m in file.modalities {
		let rows = m.embedding.len();
		let dims = m.embedding.first().map_or(0, |r| r.len());
		if dims == 0 {
			return Err(WeftError::Parse(format!(
				"modality '{}' has an empty embedding",
				m.name
			)));
		}
		if m.embedding.iter().any(|r| r.len() != dims) {
			return Err(WeftError::Parse(format!(
				"modality '{}' has ragged embedding rows",
				m.name
			)));
		}

		let flat: Vec<f64> = m.embedding.into_iter().flatten().collect();
		let embedding = Array2::from_shape_vec((rows, dims), flat)
			.map_err(|e| WeftError::Parse(format!("modality '{}': {}", m.name, e)))?;

		let k = k_override.or(m.neighbors).unwrap_or(DEFAULT_NEIGHBORS);
		modalities.push(Modality::new(m.name, embedding, m.metric, k));
	}

	Dataset::new(file.cells, modalities)
}

/// Write a dataset back out as JSON. Mostly useful for generating fixtures
/// and round-trip tests.
pub fn save_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
	let file = DatasetFile {
		cells: dataset.cell_ids().to_vec(),
		modalities: dataset
			.modalities()
			.iter()
			.map(|m| ModalityFile {
				name: m.name.clone(),
				metric: m.metric,
				neighbors: Some(m.k),
				embedding: m.embedding.rows().into_iter().map(|r| r.to_vec()).collect(),
			})
			.collect(),
	};
	let json = serde_json::to_string_pretty(&file)
		.map_err(|e| WeftError::Parse(e.to_string()))?;
	fs::write(path, json)?;
	Ok(())
}
