use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_run_command() {
	let args = vec!["seqc", "run", "scenario.json"];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Run(args) => {
			assert_eq!(args.scenario, PathBuf::from("scenario.json"));
			assert_eq!(args.chain_id, None);
			assert_eq!(args.app_name, None);
			assert!(!args.keep_active);
		}
		_ => panic!("Expected Run command"),
	}
}

#[test]
fn parse_run_overrides() {
	let args = vec!["seqc", "run", "s.json", "--chain-id", "137", "--app-name", "demo", "--keep-active"];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Run(args) => {
			assert_eq!(args.chain_id, Some(137));
			assert_eq!(args.app_name.as_deref(), Some("demo"));
			assert!(args.keep_active);
		}
		_ => panic!("Expected Run command"),
	}
}

#[test]
fn parse_chain_id_command() {
	let cli = Cli::try_parse_from(["seqc", "chain-id", "0x89"]).unwrap();

	match cli.command {
		Commands::ChainId(args) => {
			assert_eq!(args.value, "0x89");
			assert!(!args.decimal);
		}
		_ => panic!("Expected ChainId command"),
	}
}

#[test]
fn parse_chain_id_decimal_flag() {
	let cli = Cli::try_parse_from(["seqc", "chain-id", "137", "--decimal"]).unwrap();

	match cli.command {
		Commands::ChainId(args) => assert!(args.decimal),
		_ => panic!("Expected ChainId command"),
	}
}

#[test]
fn run_requires_scenario() {
	assert!(Cli::try_parse_from(["seqc", "run"]).is_err());
}

#[test]
fn chain_id_flag_must_be_numeric() {
	assert!(Cli::try_parse_from(["seqc", "run", "s.json", "--chain-id", "0x89"]).is_err());
}

#[test]
fn global_flags_after_subcommand() {
	let cli = Cli::try_parse_from(["seqc", "chain-id", "1", "-vv", "-f", "text"]).unwrap();
	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Text);
}

#[test]
fn format_defaults_to_json() {
	let cli = Cli::try_parse_from(["seqc", "chain-id", "1"]).unwrap();
	assert_eq!(cli.format, OutputFormat::Json);
	assert_eq!(cli.verbose, 0);
}
