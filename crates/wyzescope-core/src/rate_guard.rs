// ── Rate guard ──
//
// The sole shared-resource gate for one scrape run: a semaphore bounds
// concurrently-executing requests, and a run-wide backoff gate delays
// every dispatch after a throttle signal. Constructed per run -- two
// runs never share a budget.

use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::CoreError;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug)]
struct BackoffState {
    /// No dispatch may start before this instant.
    resume_at: Option<Instant>,
    /// Delay to schedule on the next throttle signal.
    next_delay: Duration,
}

/// Bounds in-flight work and reacts to throttle signals with a shared,
/// capped exponential backoff.
///
/// At most `max_concurrent` wrapped operations execute at any instant.
/// The backoff gate is global to the guard: one throttle signal slows
/// the whole batch, not just the unit that hit it.
pub struct RateGuard {
    semaphore: Semaphore,
    backoff: Mutex<BackoffState>,
    max_delay: Duration,
    max_retries: u32,
}

impl RateGuard {
    /// Guard with the default backoff policy.
    pub fn new(max_concurrent: usize) -> Self {
        Self::with_policy(
            max_concurrent,
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
            DEFAULT_MAX_RETRIES,
        )
    }

    /// Guard with an explicit backoff policy (tests use short delays).
    pub fn with_policy(
        max_concurrent: usize,
        base_delay: Duration,
        max_delay: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            semaphore: Semaphore::new(max_concurrent.max(1)),
            backoff: Mutex::new(BackoffState {
                resume_at: None,
                next_delay: base_delay,
            }),
            max_delay,
            max_retries,
        }
    }

    /// Run `op` under the concurrency bound, retrying on throttle
    /// signals until the retry budget is spent.
    ///
    /// A unit waits out the shared gate before taking a slot, so
    /// sleeping out a backoff never occupies one. The permit is held
    /// only for the duration of one attempt; release is RAII -- it
    /// happens on success, error, and cancellation alike.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, wyzescope_api::Error>>,
    {
        let mut attempts: u32 = 0;
        loop {
            self.wait_for_gate().await;
            let permit = self
                .semaphore
                .acquire()
                .await
                .expect("rate guard semaphore closed");

            let result = op().await;
            drop(permit);

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() => {
                    attempts += 1;
                    let hint = err.retry_after_secs().map(Duration::from_secs);
                    self.note_throttle(hint).await;
                    if attempts > self.max_retries {
                        warn!(attempts, "throttle retry budget exhausted");
                        return Err(CoreError::RateLimitExhausted { attempts });
                    }
                    debug!(attempts, "rate limited; backing off and retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Sleep until the shared gate opens, if a backoff is scheduled.
    async fn wait_for_gate(&self) {
        loop {
            let resume_at = {
                let state = self.backoff.lock().await;
                state.resume_at
            };
            match resume_at {
                Some(at) if at > Instant::now() => tokio::time::sleep_until(at).await,
                _ => return,
            }
        }
    }

    /// Schedule a run-wide delay. The service's retry-after hint wins
    /// when it is longer than the next exponential step.
    async fn note_throttle(&self, hint: Option<Duration>) {
        let mut state = self.backoff.lock().await;
        let mut delay = state.next_delay;
        if let Some(hinted) = hint {
            delay = delay.max(hinted);
        }
        let proposed = Instant::now() + delay;
        state.resume_at = Some(state.resume_at.map_or(proposed, |at| at.max(proposed)));
        state.next_delay = (state.next_delay * 2).min(self.max_delay);
        debug!(delay_secs = delay.as_secs_f64(), "scheduled global backoff");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use super::*;

    fn throttle() -> wyzescope_api::Error {
        wyzescope_api::Error::RateLimited {
            remaining: 0,
            retry_after_secs: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_bound() {
        let guard = Arc::new(RateGuard::with_policy(
            3,
            Duration::from_millis(10),
            Duration::from_millis(100),
            1,
        ));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    guard
                        .run(|| {
                            let in_flight = Arc::clone(&in_flight);
                            let peak = Arc::clone(&peak);
                            async move {
                                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                                peak.fetch_max(now, Ordering::SeqCst);
                                tokio::time::sleep(Duration::from_millis(5)).await;
                                in_flight.fetch_sub(1, Ordering::SeqCst);
                                Ok::<_, wyzescope_api::Error>(())
                            }
                        })
                        .await
                        .unwrap();
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3, "bound exceeded");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_budget_exhaustion_surfaces_error() {
        let guard = RateGuard::with_policy(
            1,
            Duration::from_millis(10),
            Duration::from_millis(100),
            2,
        );
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = guard
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttle()) }
            })
            .await;

        // Budget of 2 retries means 3 executions total.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(CoreError::RateLimitExhausted { attempts: 3 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_delays_subsequent_dispatch() {
        // Zero retries: the throttled unit fails immediately but still
        // schedules the global gate.
        let guard = RateGuard::with_policy(2, Duration::from_secs(1), Duration::from_secs(8), 0);

        let result: Result<(), _> = guard.run(|| async { Err(throttle()) }).await;
        assert!(matches!(result, Err(CoreError::RateLimitExhausted { .. })));

        // An unrelated unit must now wait out the backoff.
        let start = Instant::now();
        guard
            .run(|| async { Ok::<_, wyzescope_api::Error>(()) })
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_up_to_cap() {
        let guard = RateGuard::with_policy(
            1,
            Duration::from_secs(1),
            Duration::from_secs(4),
            5,
        );
        let calls = AtomicU32::new(0);

        let start = Instant::now();
        let result: Result<(), _> = guard
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttle()) }
            })
            .await;

        assert!(matches!(result, Err(CoreError::RateLimitExhausted { .. })));
        // Delays: 1 + 2 + 4 + 4 + 4 (cap) = 15s.
        assert!(start.elapsed() >= Duration::from_secs(15));
        assert!(start.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_hint_extends_the_delay() {
        let guard = RateGuard::with_policy(
            1,
            Duration::from_secs(1),
            Duration::from_secs(60),
            1,
        );
        let calls = AtomicU32::new(0);

        let start = Instant::now();
        guard
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(wyzescope_api::Error::RateLimited {
                            remaining: 0,
                            retry_after_secs: Some(30),
                        })
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(30));
    }
}
