//! Collaborator capabilities for the Sequence connector.
//!
//! This crate defines what a connector needs from the outside world and
//! nothing about how it is driven:
//!
//! - [`provider`] - provider, hosted session, session factory and environment traits
//! - [`listeners`] - listener registry and RAII [`Subscription`]s
//! - [`memory`] - in-memory implementations of every capability
//! - [`error`] - shared [`Error`] and [`Result`]

pub mod error;
pub mod listeners;
pub mod memory;
pub mod provider;

pub use error::{Error, Result};
pub use listeners::{ListenerFn, ListenerFuture, ListenerId, ListenerRegistry, Subscription, listener};
pub use memory::{MemoryProvider, MemorySession, MemorySessionFactory};
pub use provider::{EthereumProvider, ProviderEnvironment, SessionFactory, StaticEnvironment, WalletSession};
