//! The `info` command: describe a dataset without running the pipeline.

use std::path::Path;

use anyhow::{Context, Result};

use crate::storage;
use crate::ui;

pub fn execute(input: &Path) -> Result<()> {
	let dataset = storage::load_dataset(input, None)
		.with_context(|| format!("failed to load dataset {}", input.display()))?;

	ui::header(&format!("Dataset: {}", input.display()));
	ui::info(&format!("{} cells", dataset.n_cells()));
	for m in dataset.modalities() {
		ui::info(&format!(
			"{:<12} {:>4} dims  k={:<4} metric={:?}",
			m.name,
			m.n_dims(),
			m.k,
			m.metric
		));
	}
	Ok(())
}
