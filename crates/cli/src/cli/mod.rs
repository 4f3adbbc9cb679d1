#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Root CLI for seqc.
#[derive(Parser, Debug)]
#[command(name = "seqc")]
#[command(about = "Run Sequence wallet connector scenarios against in-memory wallets")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default), ndjson, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Activate, replay scripted provider events, then deactivate.
	Run(RunArgs),
	/// Normalize a chain identifier (hex text, or a number with --decimal).
	ChainId(ChainIdArgs),
}

impl Commands {
	/// Name reported in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Run(_) => "run",
			Commands::ChainId(_) => "chain-id",
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
	/// Scenario JSON file.
	#[arg(value_name = "SCENARIO")]
	pub scenario: PathBuf,

	/// Requested chain, overriding the scenario's options.
	#[arg(long, value_name = "ID")]
	pub chain_id: Option<u64>,

	/// Application label shown by the wallet, overriding the scenario's options.
	#[arg(long, value_name = "NAME")]
	pub app_name: Option<String>,

	/// Leave the connector active instead of deactivating at the end.
	#[arg(long)]
	pub keep_active: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ChainIdArgs {
	/// Chain id as sent by a provider: hex, with or without a 0x prefix ("10" is 16).
	#[arg(value_name = "VALUE", allow_hyphen_values = true)]
	pub value: String,

	/// Read VALUE as a decimal number instead of a hex string.
	#[arg(long)]
	pub decimal: bool,
}

/// Cargo-style help colors.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}
