//! Bounded fan-out of probes over a fixed concurrency budget.
//!
//! At most `concurrency` probes are in flight at any time. Each admitted
//! probe carries the index of its target, and its result is written into
//! that slot once it completes, so the returned sequence always follows
//! the input order no matter in which order probes finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::error::ConfigError;
use crate::http_probe::probe::{Prober, elapsed_ms};
use crate::http_probe::result::{ErrorKind, ProbeResult, Target};

const NOT_PROBED: &str = "not probed: run cancelled";
const TASK_FAILED: &str = "probe task failed";

pub struct Scheduler {
    prober: Arc<dyn Prober>,
    concurrency: usize,
    timeout: Duration,
}

impl Scheduler {
    pub fn new(
        prober: Arc<dyn Prober>,
        concurrency: usize,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(0));
        }

        Ok(Self {
            prober,
            concurrency,
            timeout,
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes every target exactly once and returns when all probes are done.
    pub async fn run(&self, targets: &[Target]) -> Vec<ProbeResult> {
        self.run_until_cancelled(targets, &CancellationToken::new()).await
    }

    /// Like [`Scheduler::run`], but stops admitting new probes once `cancel`
    /// fires. In-flight probes are still awaited; targets that were never
    /// admitted are reported as down.
    pub async fn run_until_cancelled(
        &self,
        targets: &[Target],
        cancel: &CancellationToken,
    ) -> Vec<ProbeResult> {
        log::info!(
            "Probing {} targets (concurrency {}, timeout {}ms)",
            targets.len(),
            self.concurrency,
            self.timeout.as_millis()
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut in_flight = JoinSet::new();
        let mut admitted = vec![false; targets.len()];

        for (index, target) in targets.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::warn!("Run cancelled, {} targets not admitted", targets.len() - index);
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let prober = Arc::clone(&self.prober);
            let target = target.clone();
            let timeout = self.timeout;

            admitted[index] = true;
            in_flight.spawn(async move {
                let _permit = permit;
                // A panicking prober must not take the slot index down with it.
                let start = Instant::now();
                let attempt_target = target.clone();
                let attempt = AbortOnDropHandle::new(tokio::spawn(async move {
                    probe_with_deadline(prober.as_ref(), &attempt_target, timeout).await
                }));
                let result = match attempt.await {
                    Ok(result) => result,
                    Err(e) => task_failed(&target, &e.to_string(), elapsed_ms(start)),
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<ProbeResult>> = targets.iter().map(|_| None).collect();
        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok((index, result)) => {
                    log::debug!("[{}/{}] {} done", index + 1, targets.len(), result.target);
                    slots[index] = Some(result);
                }
                Err(e) => log::error!("Probe task failed: {e}"),
            }
        }

        let results: Vec<ProbeResult> = slots
            .into_iter()
            .zip(targets)
            .zip(admitted)
            .map(|((slot, target), admitted)| {
                slot.unwrap_or_else(|| unfinished(target, admitted))
            })
            .collect();

        log::info!("Probed {} targets", results.len());
        results
    }
}

/// Convenience wrapper: validates the tunables, then runs all targets.
pub async fn run(
    prober: Arc<dyn Prober>,
    targets: &[Target],
    concurrency: usize,
    timeout: Duration,
) -> Result<Vec<ProbeResult>, ConfigError> {
    let scheduler = Scheduler::new(prober, concurrency, timeout)?;
    Ok(scheduler.run(targets).await)
}

/// The deadline is enforced here as well, so a prober that never returns
/// cannot hold on to its concurrency slot.
async fn probe_with_deadline(
    prober: &dyn Prober,
    target: &Target,
    timeout: Duration,
) -> ProbeResult {
    let start = Instant::now();
    match tokio::time::timeout(timeout, prober.probe(target, timeout)).await {
        Ok(result) => result,
        Err(_) => ProbeResult::down(target, ErrorKind::Timeout, elapsed_ms(start)),
    }
}

fn task_failed(target: &Target, reason: &str, response_time_ms: u64) -> ProbeResult {
    let error = ErrorKind::Other(format!("{TASK_FAILED}: {reason}"));
    ProbeResult::down(target, error, response_time_ms)
}

/// Fills a slot that never received a result: either the target was never
/// admitted, or its task was lost without reporting back.
fn unfinished(target: &Target, admitted: bool) -> ProbeResult {
    if admitted {
        task_failed(target, "no result reported", 0)
    } else {
        ProbeResult::down(target, ErrorKind::Other(NOT_PROBED.to_string()), 0)
    }
}
