//! Best-effort detection of which terminal state a results page settled in

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

use crate::condition::{Condition, ConditionGroup};
use crate::context::SyncContext;
use crate::locator::{ElementHandle, ElementList};
use crate::session::Session;
use crate::waiter::WaitOutcome;

/// Which recognized signal confirmed the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadinessVariant {
    /// The results title is visible
    HasResults,
    /// The empty-results message is visible
    EmptyResults,
    /// Only the product list showed up
    FallbackList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadinessState {
    /// Nothing recognized within the deadline; the page is still usable
    Unconfirmed,
    Confirmed(ReadinessVariant),
}

impl ReadinessState {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ReadinessState::Confirmed(_))
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::Unconfirmed => write!(f, "unconfirmed"),
            ReadinessState::Confirmed(variant) => write!(f, "confirmed ({:?})", variant),
        }
    }
}

/// The three signals a results page can settle into
pub struct ReadinessProbes<'a, E> {
    pub results_title: &'a ElementHandle<E>,
    pub empty_message: &'a ElementHandle<E>,
    pub fallback_list: &'a ElementList,
}

pub struct ReadinessDetector;

impl ReadinessDetector {
    /// Wait for any recognized terminal state.
    ///
    /// A timeout is not an error: the state stays `Unconfirmed` and later
    /// queries degrade to their placeholders.
    pub async fn confirm<S: Session>(
        ctx: &SyncContext<S>,
        page: &str,
        probes: &ReadinessProbes<'_, S::Element>,
        timeout: Option<Duration>,
    ) -> Result<ReadinessState> {
        // Order matters only for which variant is reported when several hold
        let group = ConditionGroup::any_of(vec![
            Condition::Visible(probes.results_title),
            Condition::Visible(probes.empty_message),
            Condition::FirstVisible(probes.fallback_list),
        ]);

        match ctx.wait_for(&group, timeout).await? {
            WaitOutcome::Satisfied { after, matched } => {
                let variant = match matched {
                    Some(0) => ReadinessVariant::HasResults,
                    Some(1) => ReadinessVariant::EmptyResults,
                    _ => ReadinessVariant::FallbackList,
                };
                info!("{} ready after {:?}: {:?}", page, after, variant);
                Ok(ReadinessState::Confirmed(variant))
            }
            outcome @ WaitOutcome::TimedOut { .. } => {
                let late = outcome.late_signals();
                if late.is_empty() {
                    warn!(
                        "{} did not show a results title, empty-results message or product list in time",
                        page
                    );
                } else {
                    info!(
                        "{} readiness timed out, but {} appeared right after the deadline",
                        page,
                        late.join(", ")
                    );
                }
                if let WaitOutcome::TimedOut {
                    last_error: Some(signal),
                    ..
                } = &outcome
                {
                    warn!("{} last readiness signal: {}", page, signal);
                }
                Ok(ReadinessState::Unconfirmed)
            }
        }
    }
}

#[cfg(test)]
#[path = "readiness_test.rs"]
mod readiness_test;
