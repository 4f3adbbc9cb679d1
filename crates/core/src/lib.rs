//! Sequence wallet connector.
//!
//! Activates a Sequence wallet either through a provider the host environment
//! injected or through a hosted wallet session, and reports every later change
//! through one event contract.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use sequence::{ConnectorOptions, SequenceConnector};
//!
//! let connector = SequenceConnector::new(
//!     ConnectorOptions::new(137u64).with_app_name("demo"),
//!     environment,
//!     session_factory,
//! );
//! let mut events = connector.subscribe();
//! let activation = connector.activate().await?;
//! println!("connected {:?} on {}", activation.account, connector.get_chain_id());
//! connector.deactivate().await?;
//! ```
//!
//! # Events
//!
//! | Provider event | Connector reaction |
//! |---|---|
//! | `chainChanged` / `networkChanged` | [`ConnectorEvent::Update`] with the normalized chain id and provider |
//! | `accountsChanged` (non-empty) | [`ConnectorEvent::Update`] with the first account |
//! | `accountsChanged` (empty) | full deactivation, then [`ConnectorEvent::Deactivate`] |
//! | `close` | full deactivation, then [`ConnectorEvent::Deactivate`] |

pub mod connector;
pub mod events;
pub mod options;
pub mod strategy;

pub use connector::{ConnectorActivation, ConnectorPhase, SequenceConnector};
pub use events::{ConnectorEvent, ConnectorUpdate, EventStream, EventSubscription, EventWaiter};
pub use options::{ConnectorOptions, DEFAULT_APP_NAME};
pub use sequence_protocol::{ChainId, ProviderEvent, ProviderEventKind, RawChainId};
pub use sequence_runtime::{
	Error, EthereumProvider, ProviderEnvironment, Result, SessionFactory, StaticEnvironment, WalletSession,
};
pub use strategy::{ActivationPath, ActivationPlan, resolve_activation_plan};
