use clap::builder::styling::{AnsiColor, Color, Style};
use clap::{builder::Styles, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{DEFAULT_RESOLUTION, DEFAULT_SEED};
use crate::processing::KernelKind;

/// Distance-to-affinity kernel for weight estimation and fusion
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Kernel {
	/// Gaussian kernel, exp(-(d/sigma)^2)
	#[default]
	Gaussian,
	/// Exponential kernel, exp(-d/sigma)
	Exponential,
}

impl From<Kernel> for KernelKind {
	fn from(kernel: Kernel) -> Self {
		match kernel {
			Kernel::Gaussian => KernelKind::Gaussian,
			Kernel::Exponential => KernelKind::Exponential,
		}
	}
}

fn parse_resolution(s: &str) -> Result<f64, String> {
	let val: f64 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if val < 0.0 {
		Err(format!("resolution must be non-negative, got {}", val))
	} else {
		Ok(val)
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
		.usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
		.literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
		.placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
		.valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
		.invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
}

#[derive(Parser, Debug)]
#[command(
	name = "weft",
	author,
	version,
	about = "Weighted multimodal neighbor fusion and clustering",
	styles = styles(),
	disable_help_subcommand = true,
	after_help = format!(
		"{title}
  {weft} {run}   {run_args}   {run_desc}
  {weft} {run}   {run_res_args}   {run_res_desc}
  {weft} {info}  {info_args}                        {info_desc}
  {weft} {help}  {help_args}                                 {help_desc}",
		title = "Examples:".bright_magenta().bold(),
		weft = "weft".bright_magenta(),
		run = "run".yellow(),
		run_args = "-i pbmc.json -o results/",
		run_desc = "Fuse and cluster a dataset".dimmed(),
		run_res_args = "-i pbmc.json -r 1.5 -s 7",
		run_res_desc = "Finer clustering, custom seed".dimmed(),
		info = "info".yellow(),
		info_args = "-i pbmc.json",
		info_desc = "Describe a dataset".dimmed(),
		help = "help".yellow(),
		help_args = "run",
		help_desc = "Show help for run".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Fuse modalities and cluster the fused graph
	Run {
		/// Dataset JSON file (cell ids + per-modality embeddings)
		#[arg(short = 'i', long = "input")]
		input: PathBuf,

		/// Output directory for run artifacts
		#[arg(short = 'o', long = "output", default_value = "weft-out")]
		output: PathBuf,

		/// Clustering resolution (higher = more clusters)
		#[arg(short = 'r', long = "resolution", default_value_t = DEFAULT_RESOLUTION, value_parser = parse_resolution)]
		resolution: f64,

		/// Random seed for the partitioner
		#[arg(short = 's', long = "seed", default_value_t = DEFAULT_SEED)]
		seed: u64,

		/// Override every modality's neighbor count
		#[arg(short = 'k', long = "neighbors")]
		neighbors: Option<usize>,

		/// Affinity kernel
		#[arg(long = "kernel", value_enum, default_value = "gaussian")]
		kernel: Kernel,
	},

	/// Describe a dataset without running anything
	Info {
		/// Dataset JSON file
		#[arg(short = 'i', long = "input")]
		input: PathBuf,
	},

	/// Show help for a subcommand
	Help {
		/// Subcommand name
		subcommand: Option<String>,
	},
}
