//! Single-flight coordination of token refreshes.
//!
//! The first request to hit a 401 becomes the leader and performs the refresh;
//! every request that hits a 401 while the leader's [`RefreshLease`] is alive
//! becomes a follower and waits for the leader's outcome. Leadership is decided
//! under a lock with no suspension point in between, so at most one refresh
//! is outstanding.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tokio::sync::oneshot;

use crate::error::ApiError;

/// Result of one refresh cycle, shared by every request caught in it.
pub(crate) type RefreshOutcome = Result<SecretString, Arc<ApiError>>;

enum State {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
        /// Set once the leader publishes; late followers read it directly.
        settled: Option<RefreshOutcome>,
    },
}

/// Owner of the "refresh in flight" state and the queue of pending requests.
pub(crate) struct RefreshCoordinator {
    state: Mutex<State>,
}

/// What a request that hit a 401 should do next.
pub(crate) enum RefreshTicket<'a> {
    /// No refresh was in flight; the holder must perform it.
    Leader(RefreshLease<'a>),
    /// A refresh is in flight; wait for its outcome.
    Follower(RefreshWaiter),
}

/// Proof of refresh leadership.
///
/// Dropping the lease ends the refresh cycle: waiters that have not been
/// served yet receive the settled outcome (or `RefreshAbandoned` if none was
/// published) and the coordinator returns to idle.
pub(crate) struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
}

/// A pending request parked behind an in-flight refresh.
pub(crate) struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshCoordinator {
    pub(crate) const fn new() -> Self {
        Self {
            state: Mutex::new(State::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Become the refresh leader, or queue behind the current one.
    pub(crate) fn acquire_or_enqueue(&self) -> RefreshTicket<'_> {
        let mut state = self.lock();

        if let State::Refreshing { waiters, settled } = &mut *state {
            let (tx, rx) = oneshot::channel();
            match settled {
                Some(outcome) => {
                    let _ = tx.send(outcome.clone());
                }
                None => waiters.push(tx),
            }
            return RefreshTicket::Follower(RefreshWaiter { rx });
        }

        *state = State::Refreshing {
            waiters: Vec::new(),
            settled: None,
        };
        RefreshTicket::Leader(RefreshLease { coordinator: self })
    }

    /// Whether a refresh cycle is in progress.
    pub(crate) fn is_refreshing(&self) -> bool {
        matches!(*self.lock(), State::Refreshing { .. })
    }

    /// Number of requests currently queued behind the leader.
    pub(crate) fn pending(&self) -> usize {
        match &*self.lock() {
            State::Idle => 0,
            State::Refreshing { waiters, .. } => waiters.len(),
        }
    }
}

impl RefreshLease<'_> {
    /// Publish the refresh outcome to every queued request.
    pub(crate) fn settle(&self, outcome: RefreshOutcome) {
        let mut state = self.coordinator.lock();
        if let State::Refreshing { waiters, settled } = &mut *state {
            for tx in waiters.drain(..) {
                let _ = tx.send(outcome.clone());
            }
            *settled = Some(outcome);
        }
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        let previous = std::mem::replace(&mut *self.coordinator.lock(), State::Idle);
        if let State::Refreshing { waiters, settled } = previous {
            let outcome = settled.unwrap_or_else(|| Err(Arc::new(ApiError::RefreshAbandoned)));
            for tx in waiters {
                let _ = tx.send(outcome.clone());
            }
        }
    }
}

impl RefreshWaiter {
    /// Suspend until the leader settles.
    pub(crate) async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(Arc::new(ApiError::RefreshAbandoned)))
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn leader(coordinator: &RefreshCoordinator) -> RefreshLease<'_> {
        match coordinator.acquire_or_enqueue() {
            RefreshTicket::Leader(lease) => lease,
            RefreshTicket::Follower(_) => panic!("expected leadership"),
        }
    }

    fn follower(coordinator: &RefreshCoordinator) -> RefreshWaiter {
        match coordinator.acquire_or_enqueue() {
            RefreshTicket::Follower(waiter) => waiter,
            RefreshTicket::Leader(_) => panic!("expected to queue"),
        }
    }

    #[tokio::test]
    async fn test_single_leader_and_shared_success() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        let first = follower(&coordinator);
        let second = follower(&coordinator);

        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 2);

        lease.settle(Ok(SecretString::from("new1")));
        assert_eq!(coordinator.pending(), 0);
        drop(lease);
        assert!(!coordinator.is_refreshing());

        for waiter in [first, second] {
            let token = waiter.wait().await.expect("refresh succeeded");
            assert_eq!(token.expose_secret(), "new1");
        }
    }

    #[tokio::test]
    async fn test_failure_is_shared() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        let waiter = follower(&coordinator);

        let cause = Arc::new(ApiError::MissingRefreshToken);
        lease.settle(Err(cause.clone()));
        drop(lease);

        let err = waiter.wait().await.expect_err("refresh failed");
        assert!(Arc::ptr_eq(&err, &cause));
    }

    #[tokio::test]
    async fn test_late_follower_gets_settled_outcome() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        lease.settle(Ok(SecretString::from("new2")));

        // Still inside the cycle: the leader has not dropped its lease yet
        let late = follower(&coordinator);
        assert_eq!(coordinator.pending(), 0);
        drop(lease);

        let token = late.wait().await.expect("settled outcome");
        assert_eq!(token.expose_secret(), "new2");
    }

    #[tokio::test]
    async fn test_abandoned_lease_rejects_waiters() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        let waiter = follower(&coordinator);
        drop(lease);

        let err = waiter.wait().await.expect_err("abandoned");
        assert!(matches!(*err, ApiError::RefreshAbandoned));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_next_cycle_gets_new_leader() {
        let coordinator = RefreshCoordinator::new();
        drop(leader(&coordinator));

        let lease = leader(&coordinator);
        assert!(coordinator.is_refreshing());
        drop(lease);
    }

    #[tokio::test]
    async fn test_concurrent_tasks_elect_one_leader() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let leaders = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let coordinator = coordinator.clone();
            let leaders = leaders.clone();
            let mut release_rx = release_rx.clone();
            handles.push(tokio::spawn(async move {
                match coordinator.acquire_or_enqueue() {
                    RefreshTicket::Leader(lease) => {
                        leaders.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        let _ = release_rx.wait_for(|released| *released).await;
                        lease.settle(Ok(SecretString::from("t")));
                        "t".to_owned()
                    }
                    RefreshTicket::Follower(waiter) => waiter
                        .wait()
                        .await
                        .map(|t| t.expose_secret().to_owned())
                        .unwrap_or_default(),
                }
            }));
        }

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        release_tx.send(true).expect("receivers alive");

        for handle in handles {
            assert_eq!(handle.await.expect("task"), "t");
        }
        assert_eq!(leaders.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
