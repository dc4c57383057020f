//! Per-modality k-nearest-neighbor graphs

use crate::config::BANDWIDTH_FLOOR;

/// Neighbors of one cell in one modality, ascending by distance.
///
/// Built once by the neighbor index and read-only afterward. `indices` and
/// `distances` are parallel arrays of length k.
#[derive(Debug, Clone)]
pub struct NeighborSet {
	pub indices: Vec<usize>,
	pub distances: Vec<f64>,
}

impl NeighborSet {
	/// Local kernel bandwidth: distance to the k-th (farthest) neighbor,
	/// clamped away from zero.
	pub fn bandwidth(&self) -> f64 {
		self.distances.last().copied().unwrap_or(0.0).max(BANDWIDTH_FLOOR)
	}

	/// Spread of the neighborhood: distance range between the farthest and
	/// nearest neighbor. Zero spread means all neighbors are equidistant.
	pub fn spread(&self) -> f64 {
		match (self.distances.first(), self.distances.last()) {
			(Some(first), Some(last)) => last - first,
			_ => 0.0,
		}
	}

	pub fn contains(&self, cell: usize) -> bool {
		self.indices.contains(&cell)
	}

	pub fn len(&self) -> usize {
		self.indices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}
}

/// kNN graph of one modality: one `NeighborSet` per cell.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
	pub modality: String,
	pub k: usize,
	pub sets: Vec<NeighborSet>,
}

impl NeighborGraph {
	pub fn n_cells(&self) -> usize {
		self.sets.len()
	}

	pub fn neighbors(&self, cell: usize) -> &NeighborSet {
		&self.sets[cell]
	}

	/// Whether the directed kNN relation contains `b` among `a`'s neighbors
	/// or `a` among `b`'s. Used by the fuser's union edge rule.
	pub fn has_edge(&self, a: usize, b: usize) -> bool {
		self.sets[a].contains(b) || self.sets[b].contains(a)
	}
}
