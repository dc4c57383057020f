//! Weft - weighted multimodal neighbor fusion and clustering
//!
//! A command-line front end over the fusion kernel: loads a multimodal
//! dataset, fuses the per-modality neighbor graphs, clusters the fused
//! graph, and writes the run artifacts.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use weft::cli::{Cli, Command};
use weft::commands;
use weft::ui;

fn main() -> Result<()> {
	let cli = Cli::parse();

	ui::Log::set_verbose(cli.verbose);

	match cli.command {
		Command::Run {
			input,
			output,
			resolution,
			seed,
			neighbors,
			kernel,
		} => {
			ui::print_logo();
			commands::run::execute(&input, &output, resolution, seed, neighbors, kernel)
		}
		Command::Info { input } => commands::info::execute(&input),
		Command::Help { subcommand } => {
			let mut cmd = Cli::command();
			if let Some(sub) = subcommand {
				if let Some(sub_cmd) = cmd.find_subcommand_mut(&sub) {
					sub_cmd.print_help().unwrap();
				} else {
					eprintln!("Unknown subcommand: {}", sub);
					cmd.print_help().unwrap();
				}
			} else {
				cmd.print_help().unwrap();
			}
			Ok(())
		}
	}
}
