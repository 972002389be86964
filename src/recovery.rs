//! Retry-once protection for actions that race a re-render

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::condition::{Condition, ConditionGroup};
use crate::locator::ElementHandle;
use crate::session::{DriverError, Session};
use crate::waiter::{PollingWaiter, WaitOutcome};

/// A mutating interaction with one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'t> {
    Click,
    /// Clear the field, then send the text
    Type(&'t str),
    /// Send keys without clearing, e.g. Enter to submit a form
    Press(&'t str),
}

impl Action<'_> {
    fn verb(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::Type(_) => "type into",
            Action::Press(_) => "send keys to",
        }
    }
}

/// Terminal result of an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionResult {
    Success,
    /// The first attempt hit a stale reference; the retry went through
    RetriedAndSucceeded,
    Failed(String),
}

impl ActionResult {
    pub fn succeeded(&self) -> bool {
        !matches!(self, ActionResult::Failed(_))
    }

    /// Turn `Failed` into an error naming the element
    pub fn ensure(self, element: &str) -> Result<Self> {
        match self {
            ActionResult::Failed(reason) => {
                anyhow::bail!("Action on '{}' failed: {}", element, reason)
            }
            done => Ok(done),
        }
    }
}

enum Attempt {
    Done,
    Stale(String),
    Failed(String),
}

/// Runs an action, re-resolving the handle and retrying exactly once when
/// the bound reference turns out to be stale.
#[derive(Debug, Clone, Copy)]
pub struct StalenessRecoveryPolicy {
    waiter: PollingWaiter,
}

impl StalenessRecoveryPolicy {
    /// `waiter` bounds the readiness wait that precedes every attempt
    pub fn new(waiter: PollingWaiter) -> Self {
        StalenessRecoveryPolicy { waiter }
    }

    pub async fn perform<S: Session>(
        &self,
        session: &S,
        handle: &ElementHandle<S::Element>,
        action: Action<'_>,
    ) -> Result<ActionResult> {
        match self.attempt(session, handle, action).await? {
            Attempt::Done => Ok(ActionResult::Success),
            Attempt::Failed(reason) => Ok(ActionResult::Failed(reason)),
            Attempt::Stale(first) => {
                warn!(
                    "Stale reference while trying to {} {} ({}), re-resolving and retrying",
                    action.verb(),
                    handle.name(),
                    first
                );
                handle.invalidate().await;

                match self.attempt(session, handle, action).await? {
                    Attempt::Done => Ok(ActionResult::RetriedAndSucceeded),
                    Attempt::Stale(second) => {
                        handle.invalidate().await;
                        Ok(ActionResult::Failed(format!(
                            "{} went stale again after re-resolution: {}",
                            handle.name(),
                            second
                        )))
                    }
                    Attempt::Failed(reason) => Ok(ActionResult::Failed(reason)),
                }
            }
        }
    }

    async fn attempt<S: Session>(
        &self,
        session: &S,
        handle: &ElementHandle<S::Element>,
        action: Action<'_>,
    ) -> Result<Attempt> {
        // Keys only need the field rendered; clicking also needs it enabled.
        // Clickable already checks visibility.
        let precondition = match action {
            Action::Click => ConditionGroup::single(Condition::Clickable(handle)),
            Action::Type(_) | Action::Press(_) => {
                ConditionGroup::single(Condition::Visible(handle))
            }
        };

        if let WaitOutcome::TimedOut {
            elapsed,
            last_error,
            ..
        } = self.waiter.wait(session, &precondition).await?
        {
            let detail = last_error.map(|e| format!(" (last: {e})")).unwrap_or_default();
            return Ok(Attempt::Failed(format!(
                "{} not ready after {:?}{}",
                handle.name(),
                elapsed,
                detail
            )));
        }

        let element = match handle.resolve(session).await {
            Ok(element) => element,
            Err(e) => return classify(e),
        };

        debug!("Dispatching {} on {}", action.verb(), handle.name());
        let dispatched = match action {
            Action::Click => session.click(&element).await,
            Action::Type(text) => match session.clear(&element).await {
                Ok(()) => session.send_keys(&element, text).await,
                Err(e) => Err(e),
            },
            Action::Press(keys) => session.send_keys(&element, keys).await,
        };

        match dispatched {
            Ok(()) => Ok(Attempt::Done),
            Err(e) => classify(e),
        }
    }
}

fn classify(err: DriverError) -> Result<Attempt> {
    match err {
        DriverError::Stale(detail) => Ok(Attempt::Stale(detail)),
        DriverError::NoSuchElement(detail) => {
            Ok(Attempt::Failed(format!("element vanished: {detail}")))
        }
        DriverError::NotInteractable(detail) => Ok(Attempt::Failed(detail)),
        DriverError::Fatal(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "recovery_test.rs"]
mod recovery_test;
