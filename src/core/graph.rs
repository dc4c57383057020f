//! Fused affinity graph

use crate::core::error::{Result, WeftError};

/// Sparse weighted undirected graph over the cell axis.
///
/// Edges are stored once in canonical form (a < b, positive weight, no
/// self-loops, no duplicates); the adjacency lists mirror them in both
/// directions. Built once by the fuser and consumed read-only.
#[derive(Debug, Clone)]
pub struct FusedGraph {
	n_cells: usize,
	edges: Vec<(usize, usize, f64)>,
	adjacency: Vec<Vec<(usize, f64)>>,
}

impl FusedGraph {
	/// Build a graph from canonical edges, enforcing the invariants.
	///
	/// # Errors
	///
	/// Returns an error on a self-loop, a non-canonical or out-of-range
	/// endpoint, a non-positive or non-finite weight, or a duplicate edge.
	pub fn from_edges(n_cells: usize, mut edges: Vec<(usize, usize, f64)>) -> Result<Self> {
		for &(a, b, w) in &edges {
			if a == b {
				return Err(WeftError::Other(format!("self-loop on cell {}", a)));
			}
			if a > b || b >= n_cells {
				return Err(WeftError::Other(format!(
					"edge ({}, {}) is not canonical for {} cells",
					a, b, n_cells
				)));
			}
			if !w.is_finite() || w <= 0.0 {
				return Err(WeftError::Other(format!(
					"edge ({}, {}) has invalid weight {}",
					a, b, w
				)));
			}
		}

		edges.sort_unstable_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
		if edges.windows(2).any(|p| (p[0].0, p[0].1) == (p[1].0, p[1].1)) {
			return Err(WeftError::Other("duplicate edge in fused graph".into()));
		}

		let mut adjacency = vec![Vec::new(); n_cells];
		for &(a, b, w) in &edges {
			adjacency[a].push((b, w));
			adjacency[b].push((a, w));
		}

		Ok(Self {
			n_cells,
			edges,
			adjacency,
		})
	}

	pub fn n_cells(&self) -> usize {
		self.n_cells
	}

	pub fn n_edges(&self) -> usize {
		self.edges.len()
	}

	/// Canonical edge list (a < b), sorted by endpoints.
	pub fn edges(&self) -> &[(usize, usize, f64)] {
		&self.edges
	}

	pub fn neighbors(&self, cell: usize) -> &[(usize, f64)] {
		&self.adjacency[cell]
	}

	/// Sum of edge weights incident to one cell.
	pub fn weighted_degree(&self, cell: usize) -> f64 {
		self.adjacency[cell].iter().map(|(_, w)| w).sum()
	}

	/// Sum of all edge weights (each undirected edge counted once).
	pub fn total_weight(&self) -> f64 {
		self.edges.iter().map(|(_, _, w)| w).sum()
	}

	/// Weight of the edge between two cells, zero if absent.
	pub fn weight(&self, a: usize, b: usize) -> f64 {
		self.adjacency[a]
			.iter()
			.find(|(j, _)| *j == b)
			.map(|(_, w)| *w)
			.unwrap_or(0.0)
	}
}
