//! Pure activation path selection.

use sequence_protocol::{ChainId, DEFAULT_NETWORK};

/// Transport used to activate the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPath {
	/// Use the Sequence provider injected into the host environment.
	Injected,
	/// Drive a hosted wallet session.
	Hosted,
}

/// Full plan for one activation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationPlan {
	pub path: ActivationPath,
	/// Whether a hosted session must be constructed before connecting.
	pub construct_session: bool,
	/// Chain the hosted session is initialized for, when one is constructed.
	pub session_chain_id: ChainId,
}

/// Inputs used to select an [`ActivationPlan`].
#[derive(Debug, Clone, Copy)]
pub struct ActivationInput {
	/// `Some(is_sequence)` when the environment injected a provider.
	pub injected: Option<bool>,
	/// Whether an earlier attempt already constructed a hosted session.
	pub has_session: bool,
	/// Chain id currently held by the connector.
	pub chain_id: ChainId,
}

/// Resolves how an activation attempt proceeds.
///
/// An injected provider wins only when it identifies as Sequence; anything
/// else falls through to the hosted session, which is built at most once.
pub fn resolve_activation_plan(input: ActivationInput) -> ActivationPlan {
	let path = if input.injected == Some(true) {
		ActivationPath::Injected
	} else {
		ActivationPath::Hosted
	};

	let construct_session = path == ActivationPath::Hosted && !input.has_session;
	let session_chain_id = if input.chain_id.is_unset() { DEFAULT_NETWORK } else { input.chain_id };

	ActivationPlan {
		path,
		construct_session,
		session_chain_id,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base_input() -> ActivationInput {
		ActivationInput {
			injected: None,
			has_session: false,
			chain_id: ChainId::MAINNET,
		}
	}

	#[test]
	fn sequence_injected_provider_wins() {
		let mut input = base_input();
		input.injected = Some(true);
		let plan = resolve_activation_plan(input);
		assert_eq!(plan.path, ActivationPath::Injected);
		assert!(!plan.construct_session);
	}

	#[test]
	fn foreign_injected_provider_is_ignored() {
		let mut input = base_input();
		input.injected = Some(false);
		let plan = resolve_activation_plan(input);
		assert_eq!(plan.path, ActivationPath::Hosted);
		assert!(plan.construct_session);
	}

	#[test]
	fn existing_session_is_reused() {
		let mut input = base_input();
		input.has_session = true;
		let plan = resolve_activation_plan(input);
		assert_eq!(plan.path, ActivationPath::Hosted);
		assert!(!plan.construct_session);
	}

	#[test]
	fn unset_chain_falls_back_to_default_network() {
		let mut input = base_input();
		input.chain_id = ChainId(0);
		assert_eq!(resolve_activation_plan(input).session_chain_id, ChainId::POLYGON);
	}

	#[test]
	fn requested_chain_is_kept() {
		let mut input = base_input();
		input.chain_id = ChainId::GOERLI;
		assert_eq!(resolve_activation_plan(input).session_chain_id, ChainId::GOERLI);
	}
}
