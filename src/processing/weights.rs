//! Per-cell modality weight estimation
//!
//! For each cell, every modality gets a kernel-smoothed affinity profile over
//! the union of the cell's neighbor sets. A consensus profile pools the
//! per-modality profiles under the current weight estimate; each modality is
//! then scored by how well its profile reconstructs the consensus on the
//! cells it did *not* nominate itself (held-out cross-prediction). A softmax
//! over the scores gives the next weight iterate. Cells whose iteration does
//! not settle within the ceiling keep the last iterate and are flagged.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
	BANDWIDTH_FLOOR, DEGENERACY_TOLERANCE, SOFTMAX_TEMPERATURE, WEIGHT_MAX_ITERATIONS,
	WEIGHT_TOLERANCE,
};
use crate::core::{
	CellDiagnostic, Dataset, NeighborGraph, Result, WeftError, WeightMatrix, WeightStatus,
};
use crate::ui;

/// Shape of the distance-to-affinity kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
	/// `exp(-(d/σ)²)`
	#[default]
	Gaussian,
	/// `exp(-d/σ)`
	Exponential,
}

impl KernelKind {
	pub(crate) fn affinity(&self, distance: f64, bandwidth: f64) -> f64 {
		let sigma = bandwidth.max(BANDWIDTH_FLOOR);
		match self {
			KernelKind::Gaussian => (-(distance / sigma).powi(2)).exp(),
			KernelKind::Exponential => (-(distance / sigma)).exp(),
		}
	}
}

/// Numeric policy of the estimator. Every knob is explicit; the defaults
/// come from `config`.
#[derive(Debug, Clone)]
pub struct WeightConfig {
	pub kernel: KernelKind,
	pub max_iterations: usize,
	pub tolerance: f64,
	pub temperature: f64,
}

impl Default for WeightConfig {
	fn default() -> Self {
		Self {
			kernel: KernelKind::default(),
			max_iterations: WEIGHT_MAX_ITERATIONS,
			tolerance: WEIGHT_TOLERANCE,
			temperature: SOFTMAX_TEMPERATURE,
		}
	}
}

impl WeightConfig {
	fn validate(&self) -> Result<()> {
		if self.max_iterations == 0 {
			return Err(WeftError::Config("weight iteration ceiling must be at least 1".into()));
		}
		if !(self.tolerance > 0.0) {
			return Err(WeftError::Config("weight tolerance must be positive".into()));
		}
		if !(self.temperature > 0.0) {
			return Err(WeftError::Config("softmax temperature must be positive".into()));
		}
		Ok(())
	}
}

/// Estimate per-cell modality weights from the per-modality kNN graphs.
///
/// Embarrassingly parallel across cells; no randomness is involved, so the
/// result is fully deterministic.
pub fn estimate_weights(
	dataset: &Dataset,
	graphs: &[NeighborGraph],
	config: &WeightConfig,
) -> Result<WeightMatrix> {
	config.validate()?;
	if graphs.len() != dataset.n_modalities() {
		return Err(WeftError::Config(format!(
			"got {} neighbor graphs for {} modalities",
			graphs.len(),
			dataset.n_modalities()
		)));
	}

	let n = dataset.n_cells();
	ui::debug(&format!(
		"weight estimation: {} cells, {} modalities, kernel {:?}",
		n,
		graphs.len(),
		config.kernel
	));

	let per_cell: Vec<(Vec<f64>, CellDiagnostic)> = (0..n)
		.into_par_iter()
		.map(|cell| weigh_cell(dataset, graphs, config, cell))
		.collect();

	let mut values = Vec::with_capacity(n);
	let mut diagnostics = Vec::with_capacity(n);
	for (weights, diagnostic) in per_cell {
		values.push(weights);
		diagnostics.push(diagnostic);
	}

	let names = dataset.modalities().iter().map(|m| m.name.clone()).collect();
	let matrix = WeightMatrix::new(names, values, diagnostics);

	let unstable = matrix.count_with_status(WeightStatus::Unstable);
	if unstable > 0 {
		ui::warn(&format!(
			"weight iteration hit the ceiling for {} of {} cells (kept last iterate)",
			unstable, n
		));
	}
	let degenerate = matrix.count_with_status(WeightStatus::Degenerate);
	if degenerate > 0 {
		ui::debug(&format!("{} cells fell back to equal weighting", degenerate));
	}

	Ok(matrix)
}

/// Weight one cell. Never fails: degenerate neighborhoods fall back to
/// equal weighting, and disjoint neighbor sets are handled by the held-out
/// rule itself.
fn weigh_cell(
	dataset: &Dataset,
	graphs: &[NeighborGraph],
	config: &WeightConfig,
	cell: usize,
) -> (Vec<f64>, CellDiagnostic) {
	let n_modalities = graphs.len();
	let equal = vec![1.0 / n_modalities as f64; n_modalities];

	// A modality whose neighborhood has no usable scale (all neighbors
	// equidistant, including the all-zero case) has an undefined score;
	// the whole cell falls back to equal weighting.
	let degenerate = graphs
		.iter()
		.any(|g| g.neighbors(cell).spread() <= DEGENERACY_TOLERANCE);
	if degenerate {
		return (
			equal,
			CellDiagnostic {
				status: WeightStatus::Degenerate,
				iterations: 0,
			},
		);
	}

	// Union support: every cell nominated by at least one modality.
	let mut support: Vec<usize> = graphs
		.iter()
		.flat_map(|g| g.neighbors(cell).indices.iter().copied())
		.collect();
	support.sort_unstable();
	support.dedup();

	// Per-modality affinity profile over the support, plus membership of
	// each support cell in the modality's own k-neighborhood.
	let mut profiles = Vec::with_capacity(n_modalities);
	let mut own = Vec::with_capacity(n_modalities);
	for (m, graph) in graphs.iter().enumerate() {
		let modality = &dataset.modalities()[m];
		let set = graph.neighbors(cell);
		let bandwidth = set.bandwidth();
		let query = modality.embedding.row(cell);

		let profile: Vec<f64> = support
			.iter()
			.map(|&s| {
				let d = modality.metric.distance(query, modality.embedding.row(s));
				config.kernel.affinity(d, bandwidth)
			})
			.collect();
		let membership: Vec<bool> = support.iter().map(|&s| set.contains(s)).collect();

		profiles.push(profile);
		own.push(membership);
	}

	// Fixed-point iteration: consensus → held-out scores → softmax.
	let mut weights = equal;
	let mut iterations = 0;
	let mut converged = false;

	while iterations < config.max_iterations {
		iterations += 1;

		let consensus: Vec<f64> = (0..support.len())
			.map(|s| {
				profiles
					.iter()
					.zip(weights.iter())
					.map(|(profile, &w)| w * profile[s])
					.sum()
			})
			.collect();

		let scores: Vec<f64> = (0..n_modalities)
			.map(|m| cross_prediction_score(&profiles[m], &own[m], &consensus))
			.collect();

		let next = softmax(&scores, config.temperature);
		let delta = weights
			.iter()
			.zip(next.iter())
			.map(|(a, b)| (a - b).abs())
			.fold(0.0_f64, f64::max);
		weights = next;

		if delta < config.tolerance {
			converged = true;
			break;
		}
	}

	let status = if converged {
		WeightStatus::Converged
	} else {
		WeightStatus::Unstable
	};
	(
		weights,
		CellDiagnostic {
			status,
			iterations,
		},
	)
}

/// Negative mean squared error between a modality's profile and the
/// consensus, restricted to support cells outside the modality's own
/// neighborhood. Falls back to the full support when the neighborhoods of
/// all modalities coincide and nothing is held out.
fn cross_prediction_score(profile: &[f64], own: &[bool], consensus: &[f64]) -> f64 {
	let mut error = 0.0;
	let mut count = 0usize;
	for s in 0..profile.len() {
		if !own[s] {
			error += (profile[s] - consensus[s]).powi(2);
			count += 1;
		}
	}
	if count == 0 {
		for s in 0..profile.len() {
			error += (profile[s] - consensus[s]).powi(2);
		}
		count = profile.len();
	}
	-(error / count.max(1) as f64)
}

fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
	let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let exps: Vec<f64> = scores.iter().map(|s| ((s - max) / temperature).exp()).collect();
	let sum: f64 = exps.iter().sum();
	exps.iter().map(|e| e / sum).collect()
}
