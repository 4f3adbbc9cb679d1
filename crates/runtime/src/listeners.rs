//! Provider event listener infrastructure.
//!
//! Listeners are async callbacks keyed by [`ListenerId`]. Providers keep them in a
//! [`ListenerRegistry`] ([`IndexMap`] storage for O(1) removal and stable
//! insertion order); consumers hold a [`Subscription`] that removes the listener
//! again when unsubscribed or dropped.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use sequence_protocol::{ProviderEvent, ProviderEventKind};

use crate::error::Result;

/// Unique identifier for provider listeners.
pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique listener ID.
pub fn next_listener_id() -> ListenerId {
	NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Boxed async listener future.
pub type ListenerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Listener function: [`ProviderEvent`] -> async `Result<()>`.
pub type ListenerFn = Arc<dyn Fn(ProviderEvent) -> ListenerFuture + Send + Sync>;

/// Wraps an async closure as a [`ListenerFn`].
pub fn listener<F, Fut>(f: F) -> ListenerFn
where
	F: Fn(ProviderEvent) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<()>> + Send + 'static,
{
	Arc::new(move |event: ProviderEvent| -> ListenerFuture { Box::pin(f(event)) })
}

/// Registered listener.
pub struct ListenerEntry {
	pub id: ListenerId,
	pub kind: ProviderEventKind,
	pub listener: ListenerFn,
}

impl Clone for ListenerEntry {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			kind: self.kind,
			listener: Arc::clone(&self.listener),
		}
	}
}

/// Listener storage shared by a provider implementation.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
	entries: Arc<Mutex<IndexMap<ListenerId, ListenerEntry>>>,
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener` for `kind` and returns its id.
	pub fn insert(&self, kind: ProviderEventKind, listener: ListenerFn) -> ListenerId {
		let id = next_listener_id();
		self.entries.lock().insert(id, ListenerEntry { id, kind, listener });
		id
	}

	/// Removes a listener. Returns `false` if `id` is unknown or registered under another kind.
	pub fn remove(&self, kind: ProviderEventKind, id: ListenerId) -> bool {
		let mut entries = self.entries.lock();
		match entries.get(&id) {
			Some(entry) if entry.kind == kind => entries.shift_remove(&id).is_some(),
			_ => false,
		}
	}

	/// Number of listeners registered for `kind`.
	pub fn count(&self, kind: ProviderEventKind) -> usize {
		self.entries.lock().values().filter(|e| e.kind == kind).count()
	}

	/// Number of listeners across all kinds.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	/// Dispatches `event` to every listener registered for its kind.
	///
	/// The listener set is snapshotted first, so listeners may unregister
	/// themselves (or each other) while running. Listener errors are logged and
	/// do not stop delivery to the remaining listeners.
	pub async fn dispatch(&self, event: ProviderEvent) -> usize {
		let kind = event.kind();
		let listeners: Vec<_> = {
			let entries = self.entries.lock();
			entries
				.values()
				.filter(|e| e.kind == kind)
				.map(|e| (e.id, Arc::clone(&e.listener)))
				.collect()
		};

		let delivered = listeners.len();
		for (id, listener) in listeners {
			if let Err(e) = listener(event.clone()).await {
				tracing::error!(error = %e, listener_id = id, event = %kind, "Provider listener error");
			}
		}
		delivered
	}
}

/// RAII handle that unregisters a provider listener on drop.
pub struct Subscription {
	id: ListenerId,
	kind: ProviderEventKind,
	dropper: Option<Arc<dyn Fn(ProviderEventKind, ListenerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: ListenerId, kind: ProviderEventKind, dropper: Arc<dyn Fn(ProviderEventKind, ListenerId) + Send + Sync>) -> Self {
		Self {
			id,
			kind,
			dropper: Some(dropper),
		}
	}

	/// Returns this subscription's listener ID.
	pub fn id(&self) -> ListenerId {
		self.id
	}

	/// Returns the event this subscription listens for.
	pub fn kind(&self) -> ProviderEventKind {
		self.kind
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.kind, self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.release();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("kind", &self.kind)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicBool, AtomicUsize};

	use sequence_protocol::RawChainId;

	use super::*;
	use crate::error::Error;

	fn noop() -> ListenerFn {
		listener(|_| async { Ok(()) })
	}

	#[test]
	fn test_listener_id_increments() {
		let id1 = next_listener_id();
		let id2 = next_listener_id();
		assert!(id2 > id1);
	}

	#[test]
	fn test_remove_requires_matching_kind() {
		let registry = ListenerRegistry::new();
		let id = registry.insert(ProviderEventKind::Close, noop());

		assert!(!registry.remove(ProviderEventKind::ChainChanged, id));
		assert_eq!(registry.count(ProviderEventKind::Close), 1);

		assert!(registry.remove(ProviderEventKind::Close, id));
		assert!(registry.is_empty());
		assert!(!registry.remove(ProviderEventKind::Close, id));
	}

	#[tokio::test]
	async fn test_dispatch_only_reaches_matching_kind() {
		let registry = ListenerRegistry::new();
		let hits = Arc::new(AtomicUsize::new(0));

		let counter = Arc::clone(&hits);
		registry.insert(
			ProviderEventKind::ChainChanged,
			listener(move |_| {
				let counter = Arc::clone(&counter);
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
					Ok(())
				}
			}),
		);
		registry.insert(ProviderEventKind::Close, noop());

		let delivered = registry.dispatch(ProviderEvent::ChainChanged(RawChainId::from("0x1"))).await;
		assert_eq!(delivered, 1);
		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_dispatch_continues_after_listener_error() {
		let registry = ListenerRegistry::new();
		let reached = Arc::new(AtomicBool::new(false));

		registry.insert(
			ProviderEventKind::Close,
			listener(|_| async { Err(Error::ConnectionFailed("boom".into())) }),
		);
		let flag = Arc::clone(&reached);
		registry.insert(
			ProviderEventKind::Close,
			listener(move |_| {
				let flag = Arc::clone(&flag);
				async move {
					flag.store(true, Ordering::SeqCst);
					Ok(())
				}
			}),
		);

		assert_eq!(registry.dispatch(ProviderEvent::Close).await, 2);
		assert!(reached.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn test_listener_can_remove_itself_during_dispatch() {
		let registry = ListenerRegistry::new();
		let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

		let inner_registry = registry.clone();
		let inner_slot = Arc::clone(&slot);
		let id = registry.insert(
			ProviderEventKind::Close,
			listener(move |_| {
				let registry = inner_registry.clone();
				let slot = Arc::clone(&inner_slot);
				async move {
					if let Some(id) = *slot.lock() {
						registry.remove(ProviderEventKind::Close, id);
					}
					Ok(())
				}
			}),
		);
		*slot.lock() = Some(id);

		registry.dispatch(ProviderEvent::Close).await;
		assert!(registry.is_empty());
	}

	#[test]
	fn test_subscription_drop_calls_dropper() {
		let registry = ListenerRegistry::new();
		let id = registry.insert(ProviderEventKind::AccountsChanged, noop());

		let handle = registry.clone();
		{
			let _sub = Subscription::new(
				id,
				ProviderEventKind::AccountsChanged,
				Arc::new(move |kind, id| {
					handle.remove(kind, id);
				}),
			);
			assert_eq!(registry.len(), 1);
		}
		assert!(registry.is_empty());
	}

	#[test]
	fn test_subscription_unsubscribe_runs_once() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let sub = Subscription::new(
			7,
			ProviderEventKind::Close,
			Arc::new(move |_, _| {
				counter.fetch_add(1, Ordering::SeqCst);
			}),
		);

		sub.unsubscribe();
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}
}
