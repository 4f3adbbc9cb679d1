//! Scenario files: a connector configuration plus scripted wallets.
//!
//! ```json
//! {
//!   "options": { "chainId": 137, "appName": "demo" },
//!   "injected": {
//!     "isSequence": true,
//!     "responses": { "eth_requestAccounts": ["0xDEF"], "eth_chainId": "0x89", "eth_accounts": ["0xDEF"] },
//!     "errors": { "eth_requestAccounts": { "code": 4001, "message": "User rejected the request" } }
//!   },
//!   "session": { "address": "0xABC", "chainId": "0x89", "connect": true },
//!   "events": [
//!     { "event": "chainChanged", "data": "0x1" },
//!     { "event": "accountsChanged", "data": [] }
//!   ]
//! }
//! ```
//!
//! Without `injected` the environment exposes no provider and activation goes
//! through the hosted session.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use sequence::{ConnectorOptions, ProviderEvent, RawChainId, SequenceConnector, StaticEnvironment};
use sequence_protocol::DEFAULT_NETWORK;
use sequence_runtime::{MemoryProvider, MemorySession, MemorySessionFactory};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CliError, Result};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
	#[serde(default)]
	pub options: Option<ConnectorOptions>,
	#[serde(default)]
	pub injected: Option<InjectedScript>,
	#[serde(default)]
	pub session: SessionScript,
	/// Provider events replayed once the connector is active.
	#[serde(default)]
	pub events: Vec<ProviderEvent>,
}

/// Provider the environment injects.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InjectedScript {
	#[serde(default = "default_true")]
	pub is_sequence: bool,
	#[serde(default)]
	pub responses: BTreeMap<String, Value>,
	/// Errors win over responses for the same method.
	#[serde(default)]
	pub errors: BTreeMap<String, ScriptedError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedError {
	#[serde(default)]
	pub code: Option<i64>,
	pub message: String,
}

/// Hosted session handed out by the session factory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionScript {
	/// Whether `connect` succeeds.
	#[serde(default = "default_true")]
	pub connect: bool,
	#[serde(default)]
	pub already_connected: bool,
	#[serde(default = "default_address")]
	pub address: String,
	/// Defaults to the requested chain (or the default network when unset).
	#[serde(default)]
	pub chain_id: Option<RawChainId>,
	#[serde(default)]
	pub fail_disconnect: Option<String>,
}

impl Default for SessionScript {
	fn default() -> Self {
		Self {
			connect: true,
			already_connected: false,
			address: default_address(),
			chain_id: None,
			fail_disconnect: None,
		}
	}
}

fn default_true() -> bool {
	true
}

fn default_address() -> String {
	ZERO_ADDRESS.to_string()
}

/// A connector wired to the scenario's in-memory wallets.
pub struct ScenarioWorld {
	pub connector: SequenceConnector,
	pub injected: Option<Arc<MemoryProvider>>,
	pub session_provider: Arc<MemoryProvider>,
	pub factory: Arc<MemorySessionFactory>,
}

impl ScenarioWorld {
	/// Providers the connector currently listens on.
	pub fn listening_providers(&self) -> Vec<Arc<MemoryProvider>> {
		self.injected
			.iter()
			.chain(std::iter::once(&self.session_provider))
			.filter(|provider| provider.total_listeners() > 0)
			.cloned()
			.collect()
	}
}

impl Scenario {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|source| CliError::ScenarioRead {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&raw).map_err(|source| CliError::ScenarioParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Connector options from the file, with command-line overrides applied.
	pub fn options(&self, chain_id: Option<u64>, app_name: Option<&str>) -> Result<ConnectorOptions> {
		let mut options = match (self.options.clone(), chain_id) {
			(Some(options), _) => options,
			(None, Some(chain_id)) => ConnectorOptions::new(chain_id),
			(None, None) => {
				return Err(CliError::InvalidScenario(anyhow!(
					"no chain id: set options.chainId or pass --chain-id"
				)));
			}
		};
		if let Some(chain_id) = chain_id {
			options.chain_id = chain_id.into();
		}
		if let Some(app_name) = app_name {
			options.app_name = app_name.to_string();
		}
		Ok(options.normalized())
	}

	pub fn build(&self, options: ConnectorOptions) -> Result<ScenarioWorld> {
		self.validate().map_err(CliError::InvalidScenario)?;

		let injected = self.injected.as_ref().map(|script| Arc::new(script.build()));
		let environment = match &injected {
			Some(provider) => StaticEnvironment::with_provider(provider.clone()),
			None => StaticEnvironment::empty(),
		};

		let session_provider = Arc::new(MemoryProvider::new());
		let session_chain = self.session.chain_id.clone().unwrap_or_else(|| {
			let requested = if options.chain_id.is_unset() {
				DEFAULT_NETWORK
			} else {
				options.chain_id
			};
			RawChainId::Number(requested.get())
		});
		let session = self.session.build(session_provider.clone(), session_chain);
		let factory = Arc::new(MemorySessionFactory::new(Arc::new(session)));

		let connector = SequenceConnector::new(options, Arc::new(environment), factory.clone());

		Ok(ScenarioWorld {
			connector,
			injected,
			session_provider,
			factory,
		})
	}

	fn validate(&self) -> anyhow::Result<()> {
		if self.session.address.trim().is_empty() {
			bail!("session.address must not be empty");
		}
		if let Some(injected) = &self.injected {
			for method in injected.responses.keys().chain(injected.errors.keys()) {
				if method.trim().is_empty() {
					bail!("injected provider script has an empty method name");
				}
			}
		}
		Ok(())
	}
}

impl InjectedScript {
	fn build(&self) -> MemoryProvider {
		let provider = if self.is_sequence {
			MemoryProvider::sequence()
		} else {
			MemoryProvider::new()
		};
		for (method, value) in &self.responses {
			provider.respond(method, value.clone());
		}
		for (method, error) in &self.errors {
			provider.fail(method, error.code, &error.message);
		}
		provider
	}
}

impl SessionScript {
	fn build(&self, provider: Arc<MemoryProvider>, chain_id: RawChainId) -> MemorySession {
		let mut session = MemorySession::new(provider, self.address.clone(), chain_id);
		if !self.connect {
			session = session.reject_connect();
		}
		if self.already_connected {
			session = session.already_connected();
		}
		if let Some(message) = &self.fail_disconnect {
			session = session.fail_disconnect(message.clone());
		}
		session
	}
}
