//! Deadline-bounded polling over condition groups

use anyhow::Result;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::condition::{ConditionGroup, Outcome};
use crate::session::Session;

// A zero interval would spin without yielding to the timer
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Result of a bounded wait
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Satisfied {
        after: Duration,
        /// Index of the member that matched, for `Any` groups
        matched: Option<usize>,
    },
    TimedOut {
        elapsed: Duration,
        /// Last transient signal seen while polling
        last_error: Option<String>,
        /// One direct check of every member after the deadline
        final_check: Vec<(String, Outcome)>,
    },
}

impl WaitOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, WaitOutcome::Satisfied { .. })
    }

    /// Members that were present in the post-deadline check
    pub fn late_signals(&self) -> Vec<&str> {
        match self {
            WaitOutcome::TimedOut { final_check, .. } => final_check
                .iter()
                .filter(|(_, outcome)| outcome.is_satisfied())
                .map(|(label, _)| label.as_str())
                .collect(),
            WaitOutcome::Satisfied { .. } => Vec::new(),
        }
    }
}

/// Polls a condition group at a fixed cadence until it holds or time runs out
#[derive(Debug, Clone, Copy)]
pub struct PollingWaiter {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl PollingWaiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        PollingWaiter {
            timeout,
            poll_interval,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        PollingWaiter { timeout, ..self }
    }

    /// Wait for `group` to be satisfied.
    ///
    /// Transient driver signals only fail the current tick. A fatal driver
    /// error aborts the wait and is returned as `Err`.
    pub async fn wait<S: Session>(
        &self,
        session: &S,
        group: &ConditionGroup<'_, S::Element>,
    ) -> Result<WaitOutcome> {
        let start = Instant::now();
        let mut last_error = None;
        let mut ticks = 0u32;

        debug!(
            "Waiting up to {:?} for [{}]",
            self.timeout,
            group.describe()
        );

        loop {
            ticks += 1;
            let eval = group.evaluate(session).await?;
            let elapsed = start.elapsed();

            if eval.satisfied && elapsed <= self.timeout {
                debug!(
                    "[{}] satisfied after {:?} ({} checks)",
                    group.describe(),
                    elapsed,
                    ticks
                );
                return Ok(WaitOutcome::Satisfied {
                    after: elapsed,
                    matched: eval.matched,
                });
            }
            if let Some(signal) = eval.transient_signal() {
                last_error = Some(signal);
            }
            if elapsed >= self.timeout {
                break;
            }

            let remaining = self.timeout - elapsed;
            sleep(self.poll_interval.max(MIN_POLL_INTERVAL).min(remaining)).await;
        }

        let final_check = self.final_check(session, group).await?;
        let elapsed = start.elapsed();
        debug!(
            "[{}] timed out after {:?} ({} checks), last signal: {:?}",
            group.describe(),
            elapsed,
            ticks,
            last_error
        );

        Ok(WaitOutcome::TimedOut {
            elapsed,
            last_error,
            final_check,
        })
    }

    /// Check each member on its own; only annotates a timeout
    async fn final_check<S: Session>(
        &self,
        session: &S,
        group: &ConditionGroup<'_, S::Element>,
    ) -> Result<Vec<(String, Outcome)>> {
        let mut report = Vec::with_capacity(group.members().len());
        for member in group.members() {
            report.push((member.label(), member.evaluate(session).await?));
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "waiter_test.rs"]
mod waiter_test;
