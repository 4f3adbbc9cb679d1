//! End-to-end runs of the `seqc` binary against scenario files.

use std::io::Write;
use std::process::Command;

use serde_json::{Value, json};
use tempfile::NamedTempFile;

fn scenario_file(scenario: Value) -> NamedTempFile {
	let mut file = NamedTempFile::new().unwrap();
	write!(file, "{scenario}").unwrap();
	file
}

fn seqc(args: &[&str]) -> (Value, bool) {
	let output = Command::new(env!("CARGO_BIN_EXE_seqc"))
		.args(["-f", "ndjson"])
		.args(args)
		.output()
		.expect("failed to execute seqc");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let parsed = serde_json::from_str::<Value>(&stdout).unwrap_or_else(|_| json!({ "raw": stdout }));
	(parsed, output.status.success())
}

#[test]
fn hosted_scenario_runs_to_deactivation() {
	let file = scenario_file(json!({
		"options": { "chainId": 137, "appName": "demo" },
		"session": { "address": "0xABC", "chainId": "0x89" },
		"events": [{ "event": "networkChanged", "data": "0x5" }]
	}));

	let (json, success) = seqc(&["run", file.path().to_str().unwrap()]);

	assert!(success, "seqc run failed: {json}");
	assert_eq!(json["ok"], true);
	assert_eq!(json["command"], "run");
	assert_eq!(json["data"]["activation"]["path"], "hosted");
	assert_eq!(json["data"]["activation"]["account"], "0xABC");
	assert_eq!(json["data"]["events"][0]["type"], "update");
	assert_eq!(json["data"]["events"][0]["chainId"], 5);
	assert_eq!(json["data"]["events"][1]["type"], "deactivate");
	assert_eq!(json["data"]["finalPhase"], "idle");
}

#[test]
fn flags_override_scenario_options() {
	let file = scenario_file(json!({ "options": { "chainId": 1 } }));

	let (json, success) = seqc(&["run", file.path().to_str().unwrap(), "--chain-id", "10", "--app-name", "flag"]);

	assert!(success, "seqc run failed: {json}");
	assert_eq!(json["data"]["appName"], "flag");
	assert_eq!(json["data"]["activation"]["chainId"], 10);
	assert_eq!(json["data"]["supportedChainIds"], json!([1, 137, 4, 5, 10]));
}

#[test]
fn user_rejection_produces_error_envelope() {
	let file = scenario_file(json!({
		"options": { "chainId": 1 },
		"injected": {
			"errors": { "eth_requestAccounts": { "code": 4001, "message": "User rejected the request" } }
		}
	}));

	let (json, success) = seqc(&["run", file.path().to_str().unwrap()]);

	assert!(!success);
	assert_eq!(json["ok"], false);
	assert_eq!(json["command"], "run");
	assert_eq!(json["error"]["code"], "USER_REJECTED");
	assert_eq!(json["error"]["details"]["rpcCode"], 4001);
}

#[test]
fn malformed_scenario_is_invalid_input() {
	let mut file = NamedTempFile::new().unwrap();
	write!(file, "{{ \"options\": ").unwrap();

	let (json, success) = seqc(&["run", file.path().to_str().unwrap()]);

	assert!(!success);
	assert_eq!(json["error"]["code"], "INVALID_INPUT");
}

#[test]
fn missing_scenario_is_io_error() {
	let (json, success) = seqc(&["run", "/nonexistent/seqc-scenario.json"]);

	assert!(!success);
	assert_eq!(json["error"]["code"], "IO_ERROR");
}

#[test]
fn chain_id_command_normalizes_hex() {
	let (json, success) = seqc(&["chain-id", "0x89"]);

	assert!(success);
	assert_eq!(json["command"], "chain-id");
	assert_eq!(json["data"]["chainId"], 137);
}

#[test]
fn chain_id_command_rejects_garbage() {
	let (json, success) = seqc(&["chain-id", "mainnet"]);

	assert!(!success);
	assert_eq!(json["command"], "chain-id");
	assert_eq!(json["error"]["code"], "INVALID_CHAIN_ID");
}

#[test]
fn chain_id_command_reads_bare_digits_as_hex() {
	let (json, success) = seqc(&["chain-id", "10"]);
	assert!(success);
	assert_eq!(json["data"]["chainId"], 16);

	let (json, success) = seqc(&["chain-id", "10", "--decimal"]);
	assert!(success);
	assert_eq!(json["data"]["chainId"], 10);
	assert_eq!(json["data"]["hex"], "0xa");
}
