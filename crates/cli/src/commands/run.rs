use std::sync::Arc;

use sequence::{ConnectorEvent, ConnectorOptions, ConnectorPhase, EthereumProvider};
use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::error::Result;
use crate::output::{ActivationData, EventRecord, RunData};
use crate::scenario::{Scenario, ScenarioWorld};

pub async fn execute(args: &RunArgs) -> Result<RunData> {
	let scenario = Scenario::load(&args.scenario)?;
	let options = scenario.options(args.chain_id, args.app_name.as_deref())?;
	run_scenario(&scenario, options, args.keep_active).await
}

/// Activates, replays the scenario's provider events, then deactivates unless
/// `keep_active` is set or an event already tore the connection down.
pub async fn run_scenario(scenario: &Scenario, options: ConnectorOptions, keep_active: bool) -> Result<RunData> {
	let world = scenario.build(options)?;
	let connector = &world.connector;
	let mut events = connector.subscribe();

	let activation = connector.activate().await?;
	let path = activation_path(&world, &activation.provider);
	info!(
		target = "seqc",
		path,
		account = activation.account.as_deref().unwrap_or("<none>"),
		chain_id = %connector.get_chain_id(),
		"connector active"
	);
	let activation = ActivationData {
		path: path.to_string(),
		account: activation.account,
		chain_id: connector.get_chain_id().get(),
	};

	for (index, event) in scenario.events.iter().enumerate() {
		let providers = world.listening_providers();
		if providers.is_empty() {
			debug!(target = "seqc", skipped = scenario.events.len() - index, "connector stopped listening");
			break;
		}
		for provider in providers {
			let delivered = provider.emit(event.clone()).await;
			debug!(target = "seqc", event = %event.kind(), delivered, "replayed provider event");
		}
	}

	if !keep_active && connector.is_active() {
		connector.deactivate().await?;
	}

	Ok(RunData {
		app_name: connector.options().app_name.clone(),
		supported_chain_ids: connector.supported_chain_ids().iter().map(|id| id.get()).collect(),
		activation,
		events: events.drain().iter().map(record).collect(),
		final_phase: phase_name(connector.phase()).to_string(),
		final_chain_id: connector.get_chain_id().get(),
	})
}

fn activation_path(world: &ScenarioWorld, provider: &Arc<dyn EthereumProvider>) -> &'static str {
	match &world.injected {
		Some(injected) => {
			let injected: Arc<dyn EthereumProvider> = injected.clone();
			if Arc::ptr_eq(&injected, provider) { "injected" } else { "hosted" }
		}
		None => "hosted",
	}
}

fn record(event: &ConnectorEvent) -> EventRecord {
	match event {
		ConnectorEvent::Update(update) => EventRecord::Update {
			chain_id: update.chain_id.map(|id| id.get()),
			account: update.account.clone(),
			has_provider: update.provider.is_some(),
		},
		ConnectorEvent::Deactivate => EventRecord::Deactivate,
	}
}

fn phase_name(phase: ConnectorPhase) -> &'static str {
	match phase {
		ConnectorPhase::Idle => "idle",
		ConnectorPhase::Activating => "activating",
		ConnectorPhase::Active => "active",
		ConnectorPhase::Deactivating => "deactivating",
	}
}
