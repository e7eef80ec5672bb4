//! Bridges the synchronous [`PathPlanner`] seam to an async service.
//!
//! Each request runs as its own task with a per-attempt timeout and a
//! bounded number of retries. Results are parked in a slot until the agent
//! polls them; cancelling a request aborts its task.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use glam::Vec2;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use arena_core::{EntityId, PathFailure, PathHandle, PathPlanner, PathPoll};

use super::service::{PathfindingService, PlanningError};

/// Timeout and retry policy for path requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Budget for one attempt.
    pub timeout: Duration,
    /// Extra attempts after the first one fails transiently.
    pub retries: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(250),
            retries: 2,
            backoff: Duration::from_millis(50),
        }
    }
}

enum Slot {
    Pending(JoinHandle<()>),
    Done(PathPoll),
}

type Slots = Arc<Mutex<HashMap<PathHandle, Slot>>>;

pub struct PathPlanningAdapter {
    service: Arc<dyn PathfindingService>,
    policy: RetryPolicy,
    runtime: Handle,
    next: AtomicU64,
    slots: Slots,
    latest: Mutex<HashMap<EntityId, PathHandle>>,
}

impl PathPlanningAdapter {
    /// Must be called from within a Tokio runtime; requests are spawned onto
    /// it.
    pub fn new(service: Arc<dyn PathfindingService>, policy: RetryPolicy) -> Self {
        Self::with_runtime(service, policy, Handle::current())
    }

    pub fn with_runtime(
        service: Arc<dyn PathfindingService>,
        policy: RetryPolicy,
        runtime: Handle,
    ) -> Self {
        Self {
            service,
            policy,
            runtime,
            next: AtomicU64::new(1),
            slots: Arc::new(Mutex::new(HashMap::new())),
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Requests still waiting on the service.
    pub fn in_flight(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    fn forget(&self, handle: PathHandle) -> Option<Slot> {
        lock(&self.latest).retain(|_, latest| *latest != handle);
        lock(&self.slots).remove(&handle)
    }
}

impl PathPlanner for PathPlanningAdapter {
    fn request_path(&self, agent: EntityId, from: Vec2, to: Vec2) -> PathHandle {
        let handle = PathHandle(self.next.fetch_add(1, Ordering::Relaxed));

        let superseded = lock(&self.latest).insert(agent, handle);
        if let Some(previous) = superseded {
            self.cancel_path(previous);
        }

        let service = self.service.clone();
        let policy = self.policy;
        let slots = self.slots.clone();

        // The slot lock is held across the spawn so the task cannot finish
        // before its slot exists.
        let mut guard = lock(&self.slots);
        let task = self.runtime.spawn(async move {
            let poll = match plan_with_retry(service.as_ref(), policy, agent, from, to).await {
                Ok(path) => PathPoll::Ready(path),
                Err(error) => PathPoll::Failed(error.into()),
            };
            // A missing slot means the request was cancelled meanwhile.
            let mut slots = lock(&slots);
            if let Some(slot) = slots.get_mut(&handle)
                && matches!(slot, Slot::Pending(_))
            {
                *slot = Slot::Done(poll);
            }
        });
        guard.insert(handle, Slot::Pending(task));
        drop(guard);

        tracing::trace!(
            target: "arena::pathing",
            agent = %agent,
            handle = handle.0,
            "path requested"
        );
        handle
    }

    fn poll_path(&self, handle: PathHandle) -> PathPoll {
        {
            let slots = lock(&self.slots);
            match slots.get(&handle) {
                None => return PathPoll::Failed(PathFailure::UnknownHandle),
                Some(Slot::Pending(_)) => return PathPoll::Pending,
                Some(Slot::Done(_)) => {}
            }
        }
        match self.forget(handle) {
            Some(Slot::Done(poll)) => poll,
            Some(Slot::Pending(_)) => PathPoll::Pending,
            None => PathPoll::Failed(PathFailure::UnknownHandle),
        }
    }

    fn cancel_path(&self, handle: PathHandle) {
        if let Some(Slot::Pending(task)) = self.forget(handle) {
            task.abort();
            tracing::trace!(target: "arena::pathing", handle = handle.0, "path request aborted");
        }
    }
}

impl Drop for PathPlanningAdapter {
    fn drop(&mut self) {
        for (_, slot) in lock(&self.slots).drain() {
            if let Slot::Pending(task) = slot {
                task.abort();
            }
        }
    }
}

async fn plan_with_retry(
    service: &dyn PathfindingService,
    policy: RetryPolicy,
    agent: EntityId,
    from: Vec2,
    to: Vec2,
) -> Result<Vec<Vec2>, PlanningError> {
    let mut attempt = 0;
    loop {
        let error = match tokio::time::timeout(policy.timeout, service.find_path(from, to)).await {
            Ok(Ok(path)) => return Ok(path),
            Ok(Err(error)) => error,
            Err(_) => PlanningError::Timeout,
        };

        if !error.is_transient() || attempt >= policy.retries {
            tracing::warn!(
                target: "arena::pathing",
                agent = %agent,
                attempts = attempt + 1,
                error = %error,
                "path request failed"
            );
            return Err(error);
        }

        attempt += 1;
        tracing::debug!(
            target: "arena::pathing",
            agent = %agent,
            attempt,
            error = %error,
            "retrying path request"
        );
        tokio::time::sleep(policy.backoff * attempt).await;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    /// Fails the first `failures` calls, then routes straight to the target.
    struct Flaky {
        failures: u32,
        delay: Duration,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                failures,
                delay,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl PathfindingService for Flaky {
        async fn find_path(&self, _from: Vec2, to: Vec2) -> Result<Vec<Vec2>, PlanningError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if call < self.failures {
                Err(PlanningError::Unavailable)
            } else {
                Ok(vec![to])
            }
        }
    }

    struct Nowhere;

    #[async_trait]
    impl PathfindingService for Nowhere {
        async fn find_path(&self, _from: Vec2, _to: Vec2) -> Result<Vec<Vec2>, PlanningError> {
            Err(PlanningError::NoRoute)
        }
    }

    async fn settle(adapter: &PathPlanningAdapter, handle: PathHandle) -> PathPoll {
        loop {
            match adapter.poll_path(handle) {
                PathPoll::Pending => tokio::time::sleep(Duration::from_millis(10)).await,
                done => return done,
            }
        }
    }

    const AGENT: EntityId = EntityId(1000);

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let service = Flaky::new(2, Duration::from_millis(5));
        let adapter = PathPlanningAdapter::new(service.clone(), RetryPolicy::default());

        let handle = adapter.request_path(AGENT, Vec2::ZERO, Vec2::ONE);
        assert_eq!(settle(&adapter, handle).await, PathPoll::Ready(vec![Vec2::ONE]));
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let service = Flaky::new(u32::MAX, Duration::ZERO);
        let adapter = PathPlanningAdapter::new(service.clone(), RetryPolicy::default());

        let handle = adapter.request_path(AGENT, Vec2::ZERO, Vec2::ONE);
        assert_eq!(
            settle(&adapter, handle).await,
            PathPoll::Failed(PathFailure::ServiceUnavailable)
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_services_time_out() {
        let service = Flaky::new(0, Duration::from_secs(5));
        let adapter = PathPlanningAdapter::new(service, RetryPolicy::default());

        let handle = adapter.request_path(AGENT, Vec2::ZERO, Vec2::ONE);
        assert_eq!(
            settle(&adapter, handle).await,
            PathPoll::Failed(PathFailure::Timeout)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_routes_are_not_retried() {
        let adapter = PathPlanningAdapter::new(Arc::new(Nowhere), RetryPolicy::default());

        let handle = adapter.request_path(AGENT, Vec2::ZERO, Vec2::ONE);
        assert_eq!(
            settle(&adapter, handle).await,
            PathPoll::Failed(PathFailure::NoRoute)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_handed_out_once() {
        let adapter =
            PathPlanningAdapter::new(Flaky::new(0, Duration::ZERO), RetryPolicy::default());

        let handle = adapter.request_path(AGENT, Vec2::ZERO, Vec2::ONE);
        settle(&adapter, handle).await;
        assert_eq!(
            adapter.poll_path(handle),
            PathPoll::Failed(PathFailure::UnknownHandle)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn newer_requests_supersede_older_ones() {
        let adapter =
            PathPlanningAdapter::new(Flaky::new(0, Duration::from_millis(100)), RetryPolicy::default());

        let first = adapter.request_path(AGENT, Vec2::ZERO, Vec2::ONE);
        let second = adapter.request_path(AGENT, Vec2::ZERO, Vec2::X);
        assert_eq!(adapter.in_flight(), 1);
        assert_eq!(
            adapter.poll_path(first),
            PathPoll::Failed(PathFailure::UnknownHandle)
        );
        assert_eq!(settle(&adapter, second).await, PathPoll::Ready(vec![Vec2::X]));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_requests_are_aborted() {
        let adapter =
            PathPlanningAdapter::new(Flaky::new(0, Duration::from_millis(100)), RetryPolicy::default());

        let handle = adapter.request_path(AGENT, Vec2::ZERO, Vec2::ONE);
        adapter.cancel_path(handle);
        assert_eq!(adapter.in_flight(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            adapter.poll_path(handle),
            PathPoll::Failed(PathFailure::UnknownHandle)
        );
    }
}
