use crate::config::HealthPolicy;
use crate::domain::health::{HealthSnapshot, HealthState};
use crate::domain::ports::HealthProbe;
use crate::error::{ServiceError, TransientCause};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until, timeout};
use tracing::{debug, error, info, warn};

/// Runs single health checks and publishes their outcome.
///
/// Checks are serialized: a second caller waits for the in-flight check to
/// finish instead of issuing a parallel request.
pub struct HealthChecker {
    probe: Arc<dyn HealthProbe>,
    policy: HealthPolicy,
    state: watch::Sender<HealthSnapshot>,
    in_flight: Mutex<()>,
    closed: AtomicBool,
}

impl HealthChecker {
    pub fn new(probe: Arc<dyn HealthProbe>, policy: HealthPolicy) -> Self {
        let (state, _) = watch::channel(HealthSnapshot::checking());
        Self {
            probe,
            policy,
            state,
            in_flight: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthSnapshot> {
        self.state.subscribe()
    }

    /// Performs one check and returns the resulting snapshot. Never fails:
    /// errors become offline state.
    pub async fn check_status(&self) -> HealthSnapshot {
        self.run_check(false).await.0
    }

    /// One check; when `schedule_retry` is set and the check failed, the
    /// retry counter is bumped in the same update. The deadline of the next
    /// retry is returned only while the counter is below `max_retries`.
    async fn run_check(&self, schedule_retry: bool) -> (HealthSnapshot, Option<Instant>) {
        let _guard = self.in_flight.lock().await;

        let outcome = match timeout(self.policy.request_timeout, self.probe.probe()).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::TransientNetwork(TransientCause::Timeout)),
        };

        if self.closed.load(Ordering::SeqCst) {
            return (self.snapshot(), None);
        }

        let mut retry_at = None;
        self.state.send_modify(|s| match &outcome {
            Ok(()) => {
                if s.state != HealthState::Online {
                    info!("backend is online");
                }
                s.state = HealthState::Online;
                s.retry_count = 0;
                s.last_error = None;
                s.fatal = false;
            }
            Err(e) => {
                s.state = HealthState::Offline;
                s.last_error = Some(e.to_string());
                s.fatal = matches!(e, ServiceError::Configuration(_));
                if s.fatal {
                    error!(error = %e, "health check cannot run");
                } else if schedule_retry && s.retry_count < self.policy.max_retries {
                    s.retry_count += 1;
                    if s.retry_count < self.policy.max_retries {
                        retry_at = Some(Instant::now() + self.policy.retry_delay);
                        warn!(
                            error = %e,
                            retry_count = s.retry_count,
                            max_retries = self.policy.max_retries,
                            "health check failed, retry scheduled"
                        );
                    } else {
                        warn!(
                            error = %e,
                            retry_count = s.retry_count,
                            "health check failed, retries exhausted until the next periodic check"
                        );
                    }
                } else {
                    warn!(error = %e, retry_count = s.retry_count, "health check failed");
                }
            }
        });

        (self.snapshot(), retry_at)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Background monitor polling backend reachability.
///
/// A failed check schedules a retry after `retry_delay` until `max_retries`
/// is reached; independently, a full check runs every `check_interval` and
/// replaces any pending retry. Dropping the monitor or calling
/// [`HealthMonitor::shutdown`] aborts the polling task and any request in
/// flight.
pub struct HealthMonitor {
    checker: Arc<HealthChecker>,
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn spawn(probe: Arc<dyn HealthProbe>, policy: HealthPolicy) -> Self {
        let checker = Arc::new(HealthChecker::new(probe, policy));
        let stop = Arc::new(Notify::new());
        let task = tokio::spawn(Self::run(checker.clone(), stop.clone()));
        Self {
            checker,
            stop,
            task,
        }
    }

    async fn run(checker: Arc<HealthChecker>, stop: Arc<Notify>) {
        let period = checker.policy.check_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = period.as_secs(), "health monitor started");
        let (mut snapshot, mut retry_at) = checker.run_check(true).await;

        loop {
            if snapshot.fatal {
                error!("health monitor stopped: configuration is missing");
                break;
            }
            tokio::select! {
                _ = stop.notified() => break,
                _ = ticker.tick() => {
                    debug!("periodic health check");
                    (snapshot, retry_at) = checker.run_check(true).await;
                }
                _ = sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    debug!(retry_count = snapshot.retry_count, "retrying health check");
                    (snapshot, retry_at) = checker.run_check(true).await;
                }
            }
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.checker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthSnapshot> {
        self.checker.subscribe()
    }

    pub fn permits_payment(&self) -> bool {
        self.snapshot().permits_payment()
    }

    /// Manual re-check, e.g. from a "retry" button. Waits for any check
    /// already in flight.
    pub async fn check_status(&self) -> HealthSnapshot {
        self.checker.check_status().await
    }

    /// Stops polling. Once this returns no further state update happens.
    pub async fn shutdown(mut self) {
        self.checker.close();
        self.stop.notify_one();
        // A check in flight is cancelled rather than awaited.
        self.task.abort();
        let _ = (&mut self.task).await;
        info!("health monitor stopped");
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.checker.close();
        self.task.abort();
    }
}
