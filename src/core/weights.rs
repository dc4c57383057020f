//! Per-cell modality weights and estimation diagnostics

use serde::Serialize;

/// How weight estimation ended for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightStatus {
	/// The fixed-point iteration met the tolerance.
	Converged,
	/// The iteration ceiling was hit; the last iterate was kept.
	Unstable,
	/// A degenerate neighborhood forced the equal-weight fallback.
	Degenerate,
}

/// Per-cell estimation diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CellDiagnostic {
	pub status: WeightStatus,
	pub iterations: usize,
}

/// Per-cell, per-modality weights. Each row is non-negative and sums to 1.
#[derive(Debug, Clone)]
pub struct WeightMatrix {
	modalities: Vec<String>,
	values: Vec<Vec<f64>>,
	diagnostics: Vec<CellDiagnostic>,
}

impl WeightMatrix {
	pub fn new(modalities: Vec<String>, values: Vec<Vec<f64>>, diagnostics: Vec<CellDiagnostic>) -> Self {
		debug_assert_eq!(values.len(), diagnostics.len());
		Self {
			modalities,
			values,
			diagnostics,
		}
	}

	pub fn n_cells(&self) -> usize {
		self.values.len()
	}

	pub fn n_modalities(&self) -> usize {
		self.modalities.len()
	}

	pub fn modalities(&self) -> &[String] {
		&self.modalities
	}

	/// Weight vector of one cell, ordered like `modalities()`.
	pub fn weights(&self, cell: usize) -> &[f64] {
		&self.values[cell]
	}

	pub fn diagnostic(&self, cell: usize) -> &CellDiagnostic {
		&self.diagnostics[cell]
	}

	/// Mean weight of one modality across all cells.
	pub fn average(&self, modality: usize) -> f64 {
		if self.values.is_empty() {
			return 0.0;
		}
		self.values.iter().map(|row| row[modality]).sum::<f64>() / self.values.len() as f64
	}

	pub fn count_with_status(&self, status: WeightStatus) -> usize {
		self.diagnostics.iter().filter(|d| d.status == status).count()
	}
}
