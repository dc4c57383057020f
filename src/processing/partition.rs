//! Seeded Louvain community detection on the fused graph
//!
//! Repeated local-move passes maximize the resolution-scaled modularity
//! gain, then communities are aggregated into super-nodes and the passes
//! repeat on the coarsened graph until a level yields no improvement. The
//! seed drives the node-visit shuffle each pass, so a fixed seed gives a
//! fully reproducible partition; different seeds may land on different,
//! comparably-scoring partitions. Hard ceilings on passes and levels
//! guarantee termination.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{DEFAULT_RESOLUTION, DEFAULT_SEED, MAX_AGGREGATION_LEVELS, MAX_LOCAL_PASSES};
use crate::core::{ClusterAssignment, FusedGraph, Result, WeftError};
use crate::ui;

/// Partitioner knobs. The ceilings are termination guards, not tuning
/// parameters; hitting one is logged as a warning and flagged in the result.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
	pub resolution: f64,
	pub seed: u64,
	pub max_local_passes: usize,
	pub max_levels: usize,
}

impl Default for PartitionConfig {
	fn default() -> Self {
		Self {
			resolution: DEFAULT_RESOLUTION,
			seed: DEFAULT_SEED,
			max_local_passes: MAX_LOCAL_PASSES,
			max_levels: MAX_AGGREGATION_LEVELS,
		}
	}
}

/// Working graph for one aggregation level. Aggregated intra-community
/// weight lives in self-loops; adjacency lists never hold self entries.
struct LevelGraph {
	adjacency: Vec<Vec<(usize, f64)>>,
	self_loops: Vec<f64>,
}

impl LevelGraph {
	fn from_fused(graph: &FusedGraph) -> Self {
		let n = graph.n_cells();
		let mut adjacency = vec![Vec::new(); n];
		for &(a, b, w) in graph.edges() {
			adjacency[a].push((b, w));
			adjacency[b].push((a, w));
		}
		Self {
			adjacency,
			self_loops: vec![0.0; n],
		}
	}

	fn n_nodes(&self) -> usize {
		self.adjacency.len()
	}

	/// Weighted degree; self-loops count twice, as usual for modularity.
	fn degrees(&self) -> Vec<f64> {
		(0..self.n_nodes())
			.map(|i| {
				self.adjacency[i].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[i]
			})
			.collect()
	}
}

/// Partition the fused graph into clusters.
pub fn partition(graph: &FusedGraph, config: &PartitionConfig) -> Result<ClusterAssignment> {
	if config.resolution < 0.0 {
		return Err(WeftError::Config(format!(
			"resolution must be non-negative, got {}",
			config.resolution
		)));
	}
	if config.max_local_passes == 0 || config.max_levels == 0 {
		return Err(WeftError::Config("partition ceilings must be at least 1".into()));
	}

	let n = graph.n_cells();
	let mut rng = StdRng::seed_from_u64(config.seed);
	let mut level = LevelGraph::from_fused(graph);
	let mut membership: Vec<usize> = (0..n).collect();
	let mut hit_ceiling = false;

	for lvl in 0..config.max_levels {
		let (mut assign, improved, hit_cap) =
			local_moves(&level, config.resolution, &mut rng, config.max_local_passes);
		hit_ceiling |= hit_cap;
		if !improved {
			break;
		}

		let n_communities = renumber(&mut assign);
		for m in membership.iter_mut() {
			*m = assign[*m];
		}
		ui::debug(&format!(
			"level {}: {} nodes -> {} communities",
			lvl,
			level.n_nodes(),
			n_communities
		));
		level = aggregate(&level, &assign, n_communities);

		if lvl + 1 == config.max_levels {
			hit_ceiling = true;
		}
	}

	if hit_ceiling {
		ui::warn("partitioning hit an iteration ceiling; returning the current partition");
	}

	let n_clusters = relabel_by_size(&mut membership);
	let modularity = modularity(graph, &membership, config.resolution);
	Ok(ClusterAssignment {
		labels: membership,
		n_clusters,
		modularity,
		hit_ceiling,
	})
}

/// One level of local moves. Returns the node → community assignment,
/// whether any node moved, and whether the pass ceiling was hit.
fn local_moves(
	graph: &LevelGraph,
	resolution: f64,
	rng: &mut StdRng,
	max_passes: usize,
) -> (Vec<usize>, bool, bool) {
	let n = graph.n_nodes();
	let mut assign: Vec<usize> = (0..n).collect();
	let degrees = graph.degrees();
	let m2: f64 = degrees.iter().sum();
	if m2 <= 0.0 {
		return (assign, false, false);
	}

	let mut sigma_tot = degrees.clone();
	let mut improved = false;
	let mut hit_cap = false;
	let mut passes = 0;

	loop {
		passes += 1;
		let mut moved = false;

		let mut order: Vec<usize> = (0..n).collect();
		order.shuffle(rng);

		for &i in &order {
			let current = assign[i];
			let k_i = degrees[i];

			// Weights from i to each neighboring community, insertion-
			// ordered so the scan below is deterministic.
			let mut community_weights: Vec<(usize, f64)> = Vec::new();
			for &(j, w) in &graph.adjacency[i] {
				let c = assign[j];
				match community_weights.iter_mut().find(|(cc, _)| *cc == c) {
					Some(entry) => entry.1 += w,
					None => community_weights.push((c, w)),
				}
			}

			// Detach i, then compare the gain of every candidate (all up to
			// the shared 1/m2 factor).
			sigma_tot[current] -= k_i;
			let k_i_in_current = community_weights
				.iter()
				.find(|(c, _)| *c == current)
				.map_or(0.0, |(_, w)| *w);

			let mut best = current;
			let mut best_gain = k_i_in_current - resolution * sigma_tot[current] * k_i / m2;
			for &(c, k_i_in) in &community_weights {
				if c == current {
					continue;
				}
				let gain = k_i_in - resolution * sigma_tot[c] * k_i / m2;
				if gain > best_gain + 1e-12 {
					best_gain = gain;
					best = c;
				}
			}

			sigma_tot[best] += k_i;
			if best != current {
				assign[i] = best;
				moved = true;
				improved = true;
			}
		}

		if !moved {
			break;
		}
		if passes >= max_passes {
			hit_cap = true;
			break;
		}
	}

	(assign, improved, hit_cap)
}

/// Contract communities into super-nodes; intra-community weight becomes
/// self-loop weight.
fn aggregate(graph: &LevelGraph, assign: &[usize], n_communities: usize) -> LevelGraph {
	let mut self_loops = vec![0.0; n_communities];
	let mut between: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_communities];

	for i in 0..graph.n_nodes() {
		let ci = assign[i];
		self_loops[ci] += graph.self_loops[i];
		for &(j, w) in &graph.adjacency[i] {
			if j < i {
				continue; // each undirected edge once
			}
			let cj = assign[j];
			if ci == cj {
				self_loops[ci] += w;
			} else {
				let (a, b) = (ci.min(cj), ci.max(cj));
				match between[a].iter_mut().find(|(c, _)| *c == b) {
					Some(entry) => entry.1 += w,
					None => between[a].push((b, w)),
				}
			}
		}
	}

	let mut adjacency = vec![Vec::new(); n_communities];
	for (a, edges) in between.into_iter().enumerate() {
		for (b, w) in edges {
			adjacency[a].push((b, w));
			adjacency[b].push((a, w));
		}
	}

	LevelGraph {
		adjacency,
		self_loops,
	}
}

/// Renumber assignments to contiguous ids in first-seen order; returns the
/// community count.
fn renumber(assign: &mut [usize]) -> usize {
	let mut map: Vec<usize> = Vec::new();
	for a in assign.iter_mut() {
		let pos = map.iter().position(|&c| c == *a);
		*a = match pos {
			Some(idx) => idx,
			None => {
				map.push(*a);
				map.len() - 1
			}
		};
	}
	map.len()
}

/// Relabel by descending cluster size, ties by smallest member index;
/// returns the cluster count.
fn relabel_by_size(labels: &mut [usize]) -> usize {
	let n_communities = labels.iter().max().map_or(0, |m| m + 1);
	let mut sizes = vec![0usize; n_communities];
	let mut first_member = vec![usize::MAX; n_communities];
	for (i, &l) in labels.iter().enumerate() {
		sizes[l] += 1;
		if first_member[l] == usize::MAX {
			first_member[l] = i;
		}
	}

	let mut order: Vec<usize> = (0..n_communities).collect();
	order.sort_by(|&a, &b| {
		sizes[b]
			.cmp(&sizes[a])
			.then_with(|| first_member[a].cmp(&first_member[b]))
	});

	let mut relabel = vec![0usize; n_communities];
	for (new, &old) in order.iter().enumerate() {
		relabel[old] = new;
	}
	for l in labels.iter_mut() {
		*l = relabel[*l];
	}
	n_communities
}

/// Resolution-scaled modularity of a partition:
/// `Q_γ = Σ_c [L_c / m - γ · (d_c / 2m)²]`.
pub fn modularity(graph: &FusedGraph, labels: &[usize], resolution: f64) -> f64 {
	let m = graph.total_weight();
	if m == 0.0 {
		return 0.0;
	}
	let n_communities = labels.iter().max().map_or(0, |x| x + 1);
	let mut within = vec![0.0; n_communities];
	let mut degree = vec![0.0; n_communities];
	for &(a, b, w) in graph.edges() {
		if labels[a] == labels[b] {
			within[labels[a]] += w;
		}
	}
	for v in 0..graph.n_cells() {
		degree[labels[v]] += graph.weighted_degree(v);
	}
	(0..n_communities)
		.map(|c| within[c] / m - resolution * (degree[c] / (2.0 * m)).powi(2))
		.sum()
}
