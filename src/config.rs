//! Pipeline defaults and constants

// === Neighbor Search ===
pub const DEFAULT_NEIGHBORS: usize = 20;

// === Weight Estimation ===
pub const WEIGHT_MAX_ITERATIONS: usize = 30;
pub const WEIGHT_TOLERANCE: f64 = 1e-4;
pub const SOFTMAX_TEMPERATURE: f64 = 0.1;
/// Smallest usable kernel bandwidth; anything below is clamped.
pub const BANDWIDTH_FLOOR: f64 = 1e-12;
/// A neighborhood whose distance spread falls below this is degenerate.
pub const DEGENERACY_TOLERANCE: f64 = 1e-9;
/// Weight vectors must sum to 1 within this tolerance.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// === Partitioning ===
pub const DEFAULT_RESOLUTION: f64 = 1.0;
pub const DEFAULT_SEED: u64 = 42;
/// Ceiling on local-move passes within one aggregation level.
pub const MAX_LOCAL_PASSES: usize = 64;
/// Ceiling on aggregation levels.
pub const MAX_AGGREGATION_LEVELS: usize = 32;

// === Output Artifacts ===
pub const SUMMARY_FILE: &str = "summary.json";
pub const CLUSTERS_FILE: &str = "clusters.json";
pub const WEIGHTS_FILE: &str = "weights.json";
pub const GRAPH_BIN_FILE: &str = "graph.msgpack";
pub const GRAPH_TSV_FILE: &str = "graph.tsv";
