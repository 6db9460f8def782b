//! Refresh state machine and the bounded queue of requests waiting on it.
//!
//! All transitions happen under one `parking_lot` mutex that is never held across an `.await`,
//! so the check-state-then-act decision in [`RefreshCoordinator::enter`] cannot interleave with
//! another caller's.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, client::ApiRequest, token::BearerToken};

/// Outcome delivered to a waiter: its prepared replay, or the shared refresh failure.
pub(crate) type Settlement = std::result::Result<ApiRequest, Arc<Error>>;

/// Observable refresh phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPhase {
	/// No refresh in flight.
	Idle,
	/// A refresh is in flight.
	Refreshing {
		/// Requests currently waiting on it.
		queued: usize,
	},
}

/// A caller suspended until the in-flight refresh settles.
#[derive(Debug)]
pub(crate) struct PendingRequest {
	request: ApiRequest,
	continuation: oneshot::Sender<Settlement>,
}
impl PendingRequest {
	fn resolve(self, token: &BearerToken) {
		let mut replay = self.request;

		replay.prepare_replay(token);

		// A closed receiver means the waiter was dropped; nothing to deliver.
		let _ = self.continuation.send(Ok(replay));
	}

	fn reject(self, error: Arc<Error>) {
		let _ = self.continuation.send(Err(error));
	}
}

/// Requests waiting on the in-flight refresh, in arrival order.
#[derive(Debug, Default)]
pub(crate) struct WaitQueue(VecDeque<PendingRequest>);
impl WaitQueue {
	/// Resumes every waiter with a replay carrying `token`.
	pub(crate) fn resolve_all(self, token: &BearerToken) {
		for pending in self.0 {
			pending.resolve(token);
		}
	}

	/// Fails every waiter with the same shared error.
	pub(crate) fn reject_all(self, error: &Arc<Error>) {
		for pending in self.0 {
			pending.reject(error.clone());
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.0.len()
	}
}

#[derive(Debug, Default)]
enum RefreshState {
	#[default]
	Idle,
	Refreshing(WaitQueue),
}

/// Result of [`RefreshCoordinator::enter`].
pub(crate) enum Entry<'a> {
	/// The caller owns the refresh and must settle the flight.
	Lead(Flight<'a>),
	/// The caller waits for the leader's settlement.
	Wait(oneshot::Receiver<Settlement>),
}

/// Single-flight refresh state owned by one client.
#[derive(Debug)]
pub struct RefreshCoordinator {
	state: Mutex<RefreshState>,
	capacity: usize,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator admitting at most `capacity` waiters.
	pub fn new(capacity: usize) -> Self {
		Self { state: Mutex::new(RefreshState::Idle), capacity }
	}

	/// Current phase.
	pub fn phase(&self) -> RefreshPhase {
		match &*self.state.lock() {
			RefreshState::Idle => RefreshPhase::Idle,
			RefreshState::Refreshing(queue) => RefreshPhase::Refreshing { queued: queue.len() },
		}
	}

	/// Decides, atomically, whether `request` leads a new refresh or waits on the current one.
	///
	/// A full queue rejects the request without changing any state.
	pub(crate) fn enter(&self, request: ApiRequest) -> Result<Entry<'_>> {
		let mut state = self.state.lock();

		if let RefreshState::Refreshing(queue) = &mut *state {
			if queue.len() >= self.capacity {
				return Err(Error::Capacity { capacity: self.capacity });
			}

			let (continuation, receiver) = oneshot::channel();

			queue.0.push_back(PendingRequest { request, continuation });

			return Ok(Entry::Wait(receiver));
		}

		*state = RefreshState::Refreshing(WaitQueue::default());

		Ok(Entry::Lead(Flight { coordinator: self, settled: false }))
	}

	fn finish(&self) -> WaitQueue {
		match std::mem::take(&mut *self.state.lock()) {
			RefreshState::Idle => WaitQueue::default(),
			RefreshState::Refreshing(queue) => queue,
		}
	}
}

/// Leader's handle on the in-flight refresh.
///
/// Settling returns the coordinator to idle and hands back the waiters. Dropping an unsettled
/// flight does the same and drops the waiters' continuations, which they observe as an
/// abandoned refresh.
pub(crate) struct Flight<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl Flight<'_> {
	pub(crate) fn settle(mut self) -> WaitQueue {
		self.settled = true;

		self.coordinator.finish()
	}
}
impl Drop for Flight<'_> {
	fn drop(&mut self) {
		if !self.settled {
			let abandoned = self.coordinator.finish();

			tracing::warn!(waiters = abandoned.len(), "Refresh was dropped before it settled.");
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::AuthError;

	fn token(value: &str) -> BearerToken {
		BearerToken::new(value).expect("Fixture token should be valid.")
	}

	fn lead(coordinator: &RefreshCoordinator) -> Flight<'_> {
		match coordinator.enter(ApiRequest::get("/lead")).expect("Idle coordinator should admit.") {
			Entry::Lead(flight) => flight,
			Entry::Wait(_) => panic!("Idle coordinator should hand out the lead."),
		}
	}

	fn wait(coordinator: &RefreshCoordinator, path: &str) -> oneshot::Receiver<Settlement> {
		match coordinator.enter(ApiRequest::get(path)).expect("Queue should have room.") {
			Entry::Wait(receiver) => receiver,
			Entry::Lead(_) => panic!("Busy coordinator should queue the request."),
		}
	}

	#[test]
	fn only_first_entry_leads() {
		let coordinator = RefreshCoordinator::new(10);
		let flight = lead(&coordinator);
		let _first = wait(&coordinator, "/a");
		let _second = wait(&coordinator, "/b");

		assert_eq!(coordinator.phase(), RefreshPhase::Refreshing { queued: 2 });

		let queue = flight.settle();

		assert_eq!(queue.len(), 2);
		assert_eq!(coordinator.phase(), RefreshPhase::Idle);
	}

	#[test]
	fn full_queue_rejects_without_side_effects() {
		let coordinator = RefreshCoordinator::new(2);
		let _flight = lead(&coordinator);
		let _a = wait(&coordinator, "/a");
		let _b = wait(&coordinator, "/b");
		let err = match coordinator.enter(ApiRequest::get("/c")) {
			Err(err) => err,
			Ok(_) => panic!("Full queue should reject."),
		};

		assert!(matches!(err, Error::Capacity { capacity: 2 }));
		assert_eq!(coordinator.phase(), RefreshPhase::Refreshing { queued: 2 });
	}

	#[tokio::test]
	async fn resolution_preserves_order_and_stamps_replays() {
		let coordinator = RefreshCoordinator::new(10);
		let flight = lead(&coordinator);
		let first = wait(&coordinator, "/first");
		let second = wait(&coordinator, "/second");

		flight.settle().resolve_all(&token("T2"));

		for (receiver, path) in [(first, "/first"), (second, "/second")] {
			let replay = receiver
				.await
				.expect("Continuation should be delivered.")
				.expect("Waiter should be resolved.");

			assert_eq!(replay.path, path);
			assert!(replay.is_retried());
			assert_eq!(replay.bearer, Some(token("T2")));
		}
	}

	#[tokio::test]
	async fn rejection_is_shared() {
		let coordinator = RefreshCoordinator::new(10);
		let flight = lead(&coordinator);
		let first = wait(&coordinator, "/first");
		let second = wait(&coordinator, "/second");
		let error = Arc::new(Error::from(AuthError::MissingRotatedToken));

		flight.settle().reject_all(&error);

		let first = first.await.expect("Continuation should be delivered.");
		let second = second.await.expect("Continuation should be delivered.");

		match (first, second) {
			(Err(a), Err(b)) => assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&a, &error)),
			_ => panic!("Both waiters should observe the refresh failure."),
		}
	}

	#[tokio::test]
	async fn dropped_flight_returns_to_idle_and_abandons_waiters() {
		let coordinator = RefreshCoordinator::new(10);
		let flight = lead(&coordinator);
		let waiter = wait(&coordinator, "/a");

		drop(flight);

		assert_eq!(coordinator.phase(), RefreshPhase::Idle);
		assert!(waiter.await.is_err());
		assert!(matches!(
			coordinator.enter(ApiRequest::get("/b")),
			Ok(Entry::Lead(_))
		));
	}
}
